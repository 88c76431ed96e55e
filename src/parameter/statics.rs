//! Static options of textures and clones.
//!
//! Statics are not evaluated over time: they are fixed, typed configuration values which a
//! texture module or clone reads while scoring. Each static owns a small domain of options
//! and is validated when it gets loaded.

use std::collections::BTreeMap;

use crate::{
    breakpoint::Interpolation,
    error::{Error, Result},
    ornament::OrnamentGroup,
    parameter::{registry, Arg, Args},
    selector::SelectorKind,
};

// -------------------------------------------------------------------------------------------------

/// Update or partition level of a texture static.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Set,
    Event,
    Voice,
    Frame,
    Path,
    Texture,
    Duration,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Event => "event",
            Self::Voice => "voice",
            Self::Frame => "frame",
            Self::Path => "path",
            Self::Texture => "texture",
            Self::Duration => "duration",
        }
    }
}

impl TryFrom<&str> for Level {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "set" | "s" | "segment" | "seg" => Ok(Self::Set),
            "event" | "e" => Ok(Self::Event),
            "voice" | "v" => Ok(Self::Voice),
            "frame" | "f" => Ok(Self::Frame),
            "path" | "p" => Ok(Self::Path),
            "texture" | "t" | "text" => Ok(Self::Texture),
            "duration" | "d" | "dur" => Ok(Self::Duration),
            _ => Err(format!("invalid level '{value}'")),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// A loaded texture static option.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatic {
    /// Transpositions of parallel voices and their maximum time delay.
    ParallelMotion { transpositions: Vec<f64>, delay: f64 },
    MaxTimeOffset(f64),
    LoopWithinSet(bool),
    OrnamentLibrary(OrnamentGroup),
    OrnamentMaxDensity(f64),
    LevelFieldMonophonic(Level),
    LevelOctaveMonophonic(Level),
    LevelFieldPolyphonic(Level),
    LevelOctavePolyphonic(Level),
    LevelEventPartition(Level),
    LevelFrameDuration(Level),
    LevelEventCount(Level),
    InterpolationMethod(Interpolation),
    ParameterInterpolation(bool),
    SnapSustainTime(bool),
    SnapEventTime(bool),
    TotalEventCount(usize),
    TotalSegmentCount(usize),
    EventDensityPartition(Level),
    PitchSelector(SelectorKind),
    MultisetSelector(SelectorKind),
    PathDurationFraction(bool),
}

/// Create a texture static from registry resolved args.
pub(crate) fn build_texture_static(name: &str, args: &Args) -> Result<TextureStatic> {
    let level = |allowed: &[Level]| -> Result<Level> {
        let level = args.option::<Level>(0)?;
        if allowed.contains(&level) {
            Ok(level)
        } else {
            let names = allowed.iter().map(Level::name).collect::<Vec<_>>();
            Err(Error::ParameterObjectSyntax(format!(
                "{name}: level must be one of {}, got '{level}'",
                names.join(", ")
            )))
        }
    };
    use Level::*;
    let value = match name {
        "parallelMotionList" => {
            let delay = args.number(1)?;
            if delay < 0.0 {
                return Err(Error::ParameterObjectSyntax(format!(
                    "{name}: delay must not be negative"
                )));
            }
            TextureStatic::ParallelMotion {
                transpositions: args.numbers(0)?,
                delay,
            }
        }
        "maxTimeOffset" => TextureStatic::MaxTimeOffset(args.number(0)?.abs()),
        "loopWithinSet" => TextureStatic::LoopWithinSet(args.switch(0)?),
        "ornamentLibrarySelect" => TextureStatic::OrnamentLibrary(args.option(0)?),
        "ornamentMaxDensity" => {
            TextureStatic::OrnamentMaxDensity(args.number(0)?.clamp(0.0, 1.0))
        }
        "levelFieldMonophonic" => TextureStatic::LevelFieldMonophonic(level(&[Set, Event])?),
        "levelOctaveMonophonic" => TextureStatic::LevelOctaveMonophonic(level(&[Set, Event])?),
        "levelFieldPolyphonic" => {
            TextureStatic::LevelFieldPolyphonic(level(&[Set, Event, Voice])?)
        }
        "levelOctavePolyphonic" => {
            TextureStatic::LevelOctavePolyphonic(level(&[Set, Event, Voice])?)
        }
        "levelEventPartition" => TextureStatic::LevelEventPartition(level(&[Path, Set])?),
        "levelFrameDuration" => TextureStatic::LevelFrameDuration(level(&[Event, Frame])?),
        "levelEventCount" => TextureStatic::LevelEventCount(level(&[Set, Texture])?),
        "interpolationMethodControl" => {
            let method = args.option::<Interpolation>(0)?;
            if method == Interpolation::Flat {
                return Err(Error::ParameterObjectSyntax(format!(
                    "{name}: expected linear, halfCosine or power"
                )));
            }
            TextureStatic::InterpolationMethod(method)
        }
        "parameterInterpolationControl" => {
            TextureStatic::ParameterInterpolation(args.switch(0)?)
        }
        "snapSustainTime" => TextureStatic::SnapSustainTime(args.switch(0)?),
        "snapEventTime" => TextureStatic::SnapEventTime(args.switch(0)?),
        "totalEventCount" => TextureStatic::TotalEventCount(args.count(0)?),
        "totalSegmentCount" => TextureStatic::TotalSegmentCount(args.count(0)?.max(1)),
        "eventDensityPartition" => {
            TextureStatic::EventDensityPartition(level(&[Set, Duration])?)
        }
        "pitchSelectorControl" => TextureStatic::PitchSelector(args.option(0)?),
        "multisetSelectorControl" => TextureStatic::MultisetSelector(args.option(0)?),
        "pathDurationFraction" => TextureStatic::PathDurationFraction(args.switch(0)?),
        _ => {
            return Err(Error::ParameterObjectSyntax(format!(
                "unknown texture static '{name}'"
            )))
        }
    };
    Ok(value)
}

// -------------------------------------------------------------------------------------------------

/// The static options of a texture, keyed by the static's long name.
///
/// Typed getters fall back to the registry default when a static is missing, so textures can
/// read any static regardless of the set of statics their module declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureStatics {
    args: BTreeMap<&'static str, Arg>,
    values: BTreeMap<&'static str, TextureStatic>,
}

impl TextureStatics {
    /// Load the given static names with their registry defaults.
    pub fn with_defaults(names: &[&str]) -> Result<Self> {
        let mut statics = Self::default();
        for name in names {
            statics.set(&Arg::String((*name).to_string()))?;
        }
        Ok(statics)
    }

    /// Load and set a static from an argument list such as `(lfm, set)`.
    pub fn set(&mut self, arg: &Arg) -> Result<()> {
        let (entry, args) = registry::resolve(registry::Category::TextureStatic, arg, 0)?;
        let value = build_texture_static(entry.name, &args)?;
        self.args.insert(entry.name, args.to_arg());
        self.values.insert(entry.name, value);
        Ok(())
    }

    /// Long names of all set statics.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// Argument tree of a set static.
    pub fn arg(&self, name: &str) -> Option<&Arg> {
        self.args.get(name)
    }

    pub fn get(&self, name: &str) -> Option<&TextureStatic> {
        self.values.get(name)
    }

    fn get_or_default(&self, name: &str) -> Option<TextureStatic> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match registry::load_texture_static(&Arg::String(name.to_string())) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("failed to load default of texture static '{name}': {err}");
                None
            }
        }
    }

    pub fn parallel_motion(&self) -> (Vec<f64>, f64) {
        match self.get_or_default("parallelMotionList") {
            Some(TextureStatic::ParallelMotion {
                transpositions,
                delay,
            }) => (transpositions, delay),
            _ => (Vec::new(), 0.0),
        }
    }

    pub fn max_time_offset(&self) -> f64 {
        match self.get_or_default("maxTimeOffset") {
            Some(TextureStatic::MaxTimeOffset(value)) => value,
            _ => 0.03,
        }
    }

    pub fn loop_within_set(&self) -> bool {
        !matches!(
            self.get_or_default("loopWithinSet"),
            Some(TextureStatic::LoopWithinSet(false))
        )
    }

    pub fn ornament_library(&self) -> OrnamentGroup {
        match self.get_or_default("ornamentLibrarySelect") {
            Some(TextureStatic::OrnamentLibrary(group)) => group,
            _ => OrnamentGroup::ChromaticGroupC,
        }
    }

    pub fn ornament_max_density(&self) -> f64 {
        match self.get_or_default("ornamentMaxDensity") {
            Some(TextureStatic::OrnamentMaxDensity(value)) => value,
            _ => 1.0,
        }
    }

    /// Level of a level static, by long name.
    pub fn level(&self, name: &str) -> Level {
        match self.get_or_default(name) {
            Some(
                TextureStatic::LevelFieldMonophonic(level)
                | TextureStatic::LevelOctaveMonophonic(level)
                | TextureStatic::LevelFieldPolyphonic(level)
                | TextureStatic::LevelOctavePolyphonic(level)
                | TextureStatic::LevelEventPartition(level)
                | TextureStatic::LevelFrameDuration(level)
                | TextureStatic::LevelEventCount(level)
                | TextureStatic::EventDensityPartition(level),
            ) => level,
            _ => Level::Event,
        }
    }

    pub fn interpolation(&self) -> Interpolation {
        match self.get_or_default("interpolationMethodControl") {
            Some(TextureStatic::InterpolationMethod(method)) => method,
            _ => Interpolation::Linear,
        }
    }

    /// Value of an on/off static, by long name.
    pub fn switch(&self, name: &str) -> bool {
        match self.get_or_default(name) {
            Some(
                TextureStatic::LoopWithinSet(value)
                | TextureStatic::ParameterInterpolation(value)
                | TextureStatic::SnapSustainTime(value)
                | TextureStatic::SnapEventTime(value)
                | TextureStatic::PathDurationFraction(value),
            ) => value,
            _ => true,
        }
    }

    pub fn total_event_count(&self) -> usize {
        match self.get_or_default("totalEventCount") {
            Some(TextureStatic::TotalEventCount(value)) => value,
            _ => 20,
        }
    }

    pub fn total_segment_count(&self) -> usize {
        match self.get_or_default("totalSegmentCount") {
            Some(TextureStatic::TotalSegmentCount(value)) => value,
            _ => 8,
        }
    }

    pub fn pitch_selector(&self) -> SelectorKind {
        match self.get_or_default("pitchSelectorControl") {
            Some(TextureStatic::PitchSelector(kind)) => kind,
            _ => SelectorKind::RandomChoice,
        }
    }

    pub fn multiset_selector(&self) -> SelectorKind {
        match self.get_or_default("multisetSelectorControl") {
            Some(TextureStatic::MultisetSelector(kind)) => kind,
            _ => SelectorKind::RandomChoice,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Time values which clone filters receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeReference {
    /// Event times of the source texture.
    TextureTime,
    /// Event times as already processed by the clone's time filter.
    CloneTime,
}

impl TryFrom<&str> for TimeReference {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "texturetime" | "tt" => Ok(Self::TextureTime),
            "clonetime" | "ct" => Ok(Self::CloneTime),
            _ => Err(format!("invalid time reference '{value}'")),
        }
    }
}

/// Retrograde transformation applied to events before clone filters run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrogradeMethod {
    Off,
    /// Reverse event order, keeping the durations of all events.
    EventInverse,
    /// Reverse the time positions of events, mirroring the whole sequence in time.
    TimeInverse,
}

impl TryFrom<&str> for RetrogradeMethod {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "eventinverse" | "ei" => Ok(Self::EventInverse),
            "timeinverse" | "ti" => Ok(Self::TimeInverse),
            _ => Err(format!("invalid retrograde method '{value}'")),
        }
    }
}

/// A loaded clone static option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatic {
    TimeReferenceSource(TimeReference),
    RetrogradeMethodToggle(RetrogradeMethod),
}

/// Create a clone static from registry resolved args.
pub(crate) fn build_clone_static(name: &str, args: &Args) -> Result<CloneStatic> {
    match name {
        "timeReferenceSource" => Ok(CloneStatic::TimeReferenceSource(args.option(0)?)),
        "retrogradeMethodToggle" => Ok(CloneStatic::RetrogradeMethodToggle(args.option(0)?)),
        _ => Err(Error::ParameterObjectSyntax(format!(
            "unknown clone static '{name}'"
        ))),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load(input: &str) -> Result<TextureStatic> {
        registry::load_texture_static(&Arg::parse(input)?)
    }

    #[test]
    fn levels() -> Result<()> {
        assert_eq!(load("lfm, set")?, TextureStatic::LevelFieldMonophonic(Level::Set));
        assert_eq!(load("lop, v")?, TextureStatic::LevelOctavePolyphonic(Level::Voice));
        assert_eq!(load("lec, segment")?, TextureStatic::LevelEventCount(Level::Set));
        assert_eq!(load("edp, dur")?, TextureStatic::EventDensityPartition(Level::Duration));
        // voice is a polyphonic level only
        assert!(load("lfm, voice").is_err());
        assert!(load("lep, event").is_err());
        assert!(load("lfd, nowhere").is_err());
        Ok(())
    }

    #[test]
    fn options() -> Result<()> {
        assert_eq!(
            load("pml, (7, -5), .25")?,
            TextureStatic::ParallelMotion {
                transpositions: vec![7.0, -5.0],
                delay: 0.25
            }
        );
        assert!(load("pml, (7), -1").is_err());
        assert_eq!(
            load("ols, diatonicGroupA")?,
            TextureStatic::OrnamentLibrary(OrnamentGroup::DiatonicGroupA)
        );
        assert_eq!(
            load("imc, halfCosine")?,
            TextureStatic::InterpolationMethod(Interpolation::HalfCosine)
        );
        assert_eq!(load("sst, off")?, TextureStatic::SnapSustainTime(false));
        assert_eq!(load("tec, 12")?, TextureStatic::TotalEventCount(12));
        assert_eq!(
            load("psc, oc")?,
            TextureStatic::PitchSelector(SelectorKind::OrderedCyclic)
        );
        assert!(load("tec, -3").is_err());
        Ok(())
    }

    #[test]
    fn collection() -> Result<()> {
        let mut statics = TextureStatics::with_defaults(&["lfm", "lom", "tec"])?;
        assert_eq!(statics.names().count(), 3);
        assert_eq!(statics.level("levelFieldMonophonic"), Level::Event);
        assert_eq!(statics.total_event_count(), 20);
        statics.set(&Arg::parse("tec, 8")?)?;
        assert_eq!(statics.total_event_count(), 8);
        // missing statics use their defaults
        assert_eq!(statics.max_time_offset(), 0.03);
        assert_eq!(statics.ornament_library(), OrnamentGroup::ChromaticGroupC);
        assert!(statics.switch("snapSustainTime"));
        // failed sets keep the previous value
        assert!(statics.set(&Arg::parse("tec, x")?).is_err());
        assert_eq!(statics.total_event_count(), 8);
        Ok(())
    }

    #[test]
    fn clone_statics() -> Result<()> {
        assert_eq!(
            registry::load_clone_static(&Arg::parse("trs, ct")?)?,
            CloneStatic::TimeReferenceSource(TimeReference::CloneTime)
        );
        assert_eq!(
            registry::load_clone_static(&Arg::parse("rmt")?)?,
            CloneStatic::RetrogradeMethodToggle(RetrogradeMethod::Off)
        );
        assert_eq!(
            registry::load_clone_static(&Arg::parse("rmt, timeInverse")?)?,
            CloneStatic::RetrogradeMethodToggle(RetrogradeMethod::TimeInverse)
        );
        assert!(registry::load_clone_static(&Arg::parse("rmt, sideways")?).is_err());
        Ok(())
    }
}
