//! Textures: score generators which realize a [`Path`] over a time range into an
//! [`EventSequence`].
//!
//! A [`Texture`] owns the parameter objects of all event axes, its static options and the
//! dynamic parameters of its module. Scoring is delegated to a [`TextureModule`], which
//! implements one polyphony strategy on top of the shared plumbing of a [`Scorer`].

use std::{collections::BTreeMap, path::PathBuf};

use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    event::{Event, EventField, EventSequence, Frame},
    orchestra::{general_midi, OrchestraKind},
    parameter::{
        generator::basic::{StaticInst, StaticRange},
        registry::{self, Category},
        Arg, GeneratorObject, Level, RefDict, RhythmObject, RhythmValue, TextureStatics, Value,
    },
    path::Path,
    pitch::ps_to_tempered,
    random::{derive_seed, float_to_int_weight, gauss, new_rand_gen, uniform},
    selector::{Selector, SelectorKind},
    temperament::{Temperament, TemperamentKind},
    unit,
};

mod drone;
mod expansion;
mod fill;
mod harmonic;
mod interpolate;
mod line;
mod literal;

pub use drone::{DroneArticulate, DroneSustain};
pub use expansion::IntervalExpansion;
pub use fill::{TimeFill, TimeSegment};
pub use harmonic::{HarmonicAssembly, HarmonicShuffle};
pub use interpolate::{InterpolateFill, InterpolateLine};
pub use line::{LineCluster, LineGroove, MonophonicOrnament};
pub use literal::{LiteralHorizontal, LiteralVertical};

// -------------------------------------------------------------------------------------------------

// Seed slots of the texture's parameter objects and scoring state.
const SLOT_BEAT: u64 = 0;
const SLOT_RHYTHM: u64 = 1;
const SLOT_FIELD: u64 = 2;
const SLOT_OCTAVE: u64 = 3;
const SLOT_AMP: u64 = 4;
const SLOT_PAN: u64 = 5;
const SLOT_TEMPERAMENT: u64 = 6;
const SLOT_SCORER: u64 = 7;
const SLOT_AUX: u64 = 100;
const SLOT_DYNAMIC: u64 = 200;

const DEFAULT_TIME_RANGE: &str = "sr, (0, 20)";
const DEFAULT_BEAT: &str = "c, 120";
const DEFAULT_RHYTHM: &str = "pt, (c, 4), (bg, rp, (1, 1, 2, 3)), (c, 1), (c, .75)";
const DEFAULT_FIELD: &str = "c, 0";
const DEFAULT_OCTAVE: &str = "c, 0";
const DEFAULT_PAN: &str = "c, .5";

// -------------------------------------------------------------------------------------------------

/// A dynamic parameter of a texture module: a named generator with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicParameter {
    pub name: &'static str,
    /// Default generator, as argument string.
    pub default: &'static str,
}

impl DynamicParameter {
    pub const fn new(name: &'static str, default: &'static str) -> Self {
        Self { name, default }
    }
}

// -------------------------------------------------------------------------------------------------

/// All available texture modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    LineGroove,
    LineCluster,
    LiteralHorizontal,
    LiteralVertical,
    MonophonicOrnament,
    DroneArticulate,
    DroneSustain,
    IntervalExpansion,
    TimeFill,
    TimeSegment,
    HarmonicShuffle,
    HarmonicAssembly,
    InterpolateLine,
    InterpolateFill,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 14] = [
        Self::LineGroove,
        Self::LineCluster,
        Self::LiteralHorizontal,
        Self::LiteralVertical,
        Self::MonophonicOrnament,
        Self::DroneArticulate,
        Self::DroneSustain,
        Self::IntervalExpansion,
        Self::TimeFill,
        Self::TimeSegment,
        Self::HarmonicShuffle,
        Self::HarmonicAssembly,
        Self::InterpolateLine,
        Self::InterpolateFill,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LineGroove => "LineGroove",
            Self::LineCluster => "LineCluster",
            Self::LiteralHorizontal => "LiteralHorizontal",
            Self::LiteralVertical => "LiteralVertical",
            Self::MonophonicOrnament => "MonophonicOrnament",
            Self::DroneArticulate => "DroneArticulate",
            Self::DroneSustain => "DroneSustain",
            Self::IntervalExpansion => "IntervalExpansion",
            Self::TimeFill => "TimeFill",
            Self::TimeSegment => "TimeSegment",
            Self::HarmonicShuffle => "HarmonicShuffle",
            Self::HarmonicAssembly => "HarmonicAssembly",
            Self::InterpolateLine => "InterpolateLine",
            Self::InterpolateFill => "InterpolateFill",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            Self::LineGroove => "lg",
            Self::LineCluster => "lc",
            Self::LiteralHorizontal => "lh",
            Self::LiteralVertical => "lv",
            Self::MonophonicOrnament => "mo",
            Self::DroneArticulate => "da",
            Self::DroneSustain => "ds",
            Self::IntervalExpansion => "ie",
            Self::TimeFill => "tf",
            Self::TimeSegment => "ts",
            Self::HarmonicShuffle => "hs",
            Self::HarmonicAssembly => "ha",
            Self::InterpolateLine => "il",
            Self::InterpolateFill => "if",
        }
    }

    /// The module implementation of this kind.
    pub fn module(&self) -> &'static dyn TextureModule {
        static LINE_GROOVE: LineGroove = LineGroove;
        static LINE_CLUSTER: LineCluster = LineCluster;
        static LITERAL_HORIZONTAL: LiteralHorizontal = LiteralHorizontal;
        static LITERAL_VERTICAL: LiteralVertical = LiteralVertical;
        static MONOPHONIC_ORNAMENT: MonophonicOrnament = MonophonicOrnament;
        static DRONE_ARTICULATE: DroneArticulate = DroneArticulate;
        static DRONE_SUSTAIN: DroneSustain = DroneSustain;
        static INTERVAL_EXPANSION: IntervalExpansion = IntervalExpansion;
        static TIME_FILL: TimeFill = TimeFill;
        static TIME_SEGMENT: TimeSegment = TimeSegment;
        static HARMONIC_SHUFFLE: HarmonicShuffle = HarmonicShuffle;
        static HARMONIC_ASSEMBLY: HarmonicAssembly = HarmonicAssembly;
        static INTERPOLATE_LINE: InterpolateLine = InterpolateLine;
        static INTERPOLATE_FILL: InterpolateFill = InterpolateFill;
        match self {
            Self::LineGroove => &LINE_GROOVE,
            Self::LineCluster => &LINE_CLUSTER,
            Self::LiteralHorizontal => &LITERAL_HORIZONTAL,
            Self::LiteralVertical => &LITERAL_VERTICAL,
            Self::MonophonicOrnament => &MONOPHONIC_ORNAMENT,
            Self::DroneArticulate => &DRONE_ARTICULATE,
            Self::DroneSustain => &DRONE_SUSTAIN,
            Self::IntervalExpansion => &INTERVAL_EXPANSION,
            Self::TimeFill => &TIME_FILL,
            Self::TimeSegment => &TIME_SEGMENT,
            Self::HarmonicShuffle => &HARMONIC_SHUFFLE,
            Self::HarmonicAssembly => &HARMONIC_ASSEMBLY,
            Self::InterpolateLine => &INTERPOLATE_LINE,
            Self::InterpolateFill => &INTERPOLATE_FILL,
        }
    }
}

impl TryFrom<&str> for ModuleKind {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(value) || kind.alias().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| format!("unknown texture module '{value}'"))
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// How pitches are read from the multisets of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PitchMode {
    /// Pitch space values, as stored in the multisets.
    #[default]
    PitchSpace,
    /// Pitch classes of the multisets.
    PitchClass,
    /// Pitch classes of the multisets' set class prime forms.
    SetClass,
}

impl PitchMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PitchSpace => "pitchSpace",
            Self::PitchClass => "pitchClass",
            Self::SetClass => "setClass",
        }
    }
}

impl TryFrom<&str> for PitchMode {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pitchspace" | "ps" => Ok(Self::PitchSpace),
            "pitchclass" | "pcs" | "pc" => Ok(Self::PitchClass),
            "setclass" | "sc" => Ok(Self::SetClass),
            _ => Err(format!("invalid pitch mode '{value}'")),
        }
    }
}

impl std::fmt::Display for PitchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// A polyphony strategy: creates the events of a texture.
pub trait TextureModule: std::fmt::Debug + Sync {
    fn kind(&self) -> ModuleKind;

    /// Long names of the texture statics this module reads.
    fn static_names(&self) -> &'static [&'static str];

    /// Dynamic parameters of the module, if any.
    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        &[]
    }

    /// Create all events of a texture with the given scorer.
    fn score(&self, scorer: &mut Scorer) -> Result<()>;
}

// -------------------------------------------------------------------------------------------------

/// A rhythm evaluation: tempo, pulse and the resulting duration, sustain and accent.
#[derive(Debug, Clone, PartialEq)]
pub struct Beat {
    pub bpm: f64,
    pub pulse: Option<String>,
    pub dur: f64,
    pub sus: f64,
    pub acc: f64,
}

impl Beat {
    /// A beat which sustains for its full duration, without rhythm.
    pub fn sustained(bpm: f64, dur: f64) -> Self {
        Self {
            bpm,
            pulse: Some("(1,1,1)".to_string()),
            dur,
            sus: dur,
            acc: 1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Field and octave transpositions of a texture, each evaluated at its configured level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transposition {
    field_level: Level,
    octave_level: Level,
    pub field: f64,
    pub octave: f64,
}

impl Transposition {
    /// Read the levels from the monophonic or polyphonic level statics.
    pub fn new(statics: &TextureStatics, polyphonic: bool) -> Self {
        let (field, octave) = if polyphonic {
            ("levelFieldPolyphonic", "levelOctavePolyphonic")
        } else {
            ("levelFieldMonophonic", "levelOctaveMonophonic")
        };
        Self {
            field_level: statics.level(field),
            octave_level: statics.level(octave),
            field: 0.0,
            octave: 0.0,
        }
    }

    /// Evaluate the transpositions which are configured for the given level.
    pub fn update(&mut self, scorer: &mut Scorer, level: Level, t: f64) {
        if self.field_level == level {
            self.field = scorer.field(t);
        }
        if self.octave_level == level {
            self.octave = scorer.octave(t);
        }
    }

    /// Realize a raw pitch with the current transpositions.
    pub fn realize(&self, scorer: &mut Scorer, ps: f64) -> f64 {
        scorer.temper(ps, self.octave, self.field)
    }
}

// -------------------------------------------------------------------------------------------------

/// Shared state of a single scoring pass: the texture's parameter objects, the reference
/// context which gets passed to them, the temperament and the created events.
#[derive(Debug)]
pub struct Scorer<'a> {
    texture: &'a mut Texture,
    path: &'a Path,
    temperament: Temperament,
    context: RefDict,
    events: EventSequence,
    rand_gen: Xoshiro256PlusPlus,
    seed_count: u64,
}

impl<'a> Scorer<'a> {
    fn new(texture: &'a mut Texture, path: &'a Path, audio_dirs: &[PathBuf]) -> Self {
        let (t_start, _) = texture.time_range;
        let mut context = RefDict {
            audio_dirs: audio_dirs.to_vec(),
            ..RefDict::default()
        };
        // peek at the initial tempo without advancing the beat generator
        context.bpm = texture.beat.clone().number(t_start, &context);
        let seed = texture.seed;
        let temperament =
            Temperament::with_seed(texture.temperament, derive_seed(seed, SLOT_TEMPERAMENT));
        Self {
            texture,
            path,
            temperament,
            context,
            events: EventSequence::new(),
            rand_gen: new_rand_gen(derive_seed(seed, SLOT_SCORER)),
            seed_count: 0,
        }
    }

    fn finish(self) -> EventSequence {
        let mut events = self.events;
        events.update_post();
        events
    }

    // ---------------------------------------------------------------------------------------------

    /// Start and end time of the texture.
    pub fn time_range(&self) -> (f64, f64) {
        self.texture.time_range
    }

    pub fn instrument(&self) -> usize {
        self.texture.instrument
    }

    pub fn statics(&self) -> &TextureStatics {
        &self.texture.statics
    }

    pub fn silence_mode(&self) -> bool {
        self.texture.silence_mode
    }

    /// The reference context as passed to parameter objects.
    pub fn context(&self) -> &RefDict {
        &self.context
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Pitch space values of all multisets of the path.
    pub fn path_pitches(&self) -> Vec<Vec<f64>> {
        self.path.pitch_space()
    }

    /// Time ranges of all path positions, partitioning the texture's time range.
    pub fn set_ranges(&self) -> Vec<(f64, f64)> {
        let (t_start, t_end) = self.texture.time_range;
        let weighted = self.texture.statics.switch("pathDurationFraction");
        self.path.time_ranges(t_start, t_end, weighted)
    }

    /// Pitches of a path position, as read with the texture's pitch mode.
    pub fn chord(&self, position: usize) -> Vec<f64> {
        let Some(multiset) = self.path.get(position) else {
            return Vec::new();
        };
        match self.texture.pitch_mode {
            PitchMode::PitchSpace => multiset.pitches().to_vec(),
            PitchMode::PitchClass => multiset
                .pitch_classes()
                .into_iter()
                .map(f64::from)
                .collect(),
            PitchMode::SetClass => multiset
                .set_class()
                .pitch_classes()
                .into_iter()
                .map(f64::from)
                .collect(),
        }
    }

    /// Make a path position the current one and return its pitches.
    pub fn enter_set(&mut self, position: usize) -> Result<Vec<f64>> {
        let chord = self.chord(position);
        if chord.is_empty() {
            return Err(Error::Texture(format!(
                "multiset {position} of path '{}' has no pitches",
                self.path.name()
            )));
        }
        self.context.multiset = self.path.get(position).cloned();
        self.context.chord = chord.clone();
        self.context.ps_raw = None;
        Ok(chord)
    }

    /// Set the current, untransposed pitch.
    pub fn set_pitch(&mut self, ps_raw: Option<f64>) {
        self.context.ps_raw = ps_raw;
    }

    // ---------------------------------------------------------------------------------------------

    /// Evaluate the tempo, then the rhythm.
    pub fn rhythm(&mut self, t: f64) -> Result<Beat> {
        let bpm = self.texture.beat.number(t, &self.context);
        self.context.bpm = bpm;
        let RhythmValue {
            dur,
            sus,
            acc,
            pulse,
        } = self.texture.rhythm.value(t, &self.context);
        if !dur.is_finite() || dur <= 0.0 {
            return Err(Error::Texture(format!(
                "rhythm '{}' produced an invalid duration of {dur} at {t:.3}s",
                self.texture.rhythm.name()
            )));
        }
        Ok(Beat {
            bpm,
            pulse: pulse.map(|pulse| pulse.to_string()),
            dur,
            sus,
            acc,
        })
    }

    /// True when a beat is a rest which should not create an event.
    pub fn is_rest(&self, beat: &Beat) -> bool {
        beat.acc == 0.0 && !self.texture.silence_mode
    }

    /// Current tempo, as last evaluated.
    pub fn bpm(&self) -> f64 {
        self.context.bpm
    }

    pub fn field(&mut self, t: f64) -> f64 {
        let value = self.texture.field.number(t, &self.context);
        self.context.field = value;
        value
    }

    /// Octave transposition, rounded to whole octaves.
    pub fn octave(&mut self, t: f64) -> f64 {
        let value = self.texture.octave.number(t, &self.context).round();
        self.context.octave = value;
        value
    }

    pub fn amp(&mut self, t: f64) -> f64 {
        self.texture.amp.number(t, &self.context)
    }

    pub fn pan(&mut self, t: f64) -> f64 {
        self.texture.pan.number(t, &self.context)
    }

    pub fn aux(&mut self, t: f64) -> Vec<Value> {
        let context = &self.context;
        self.texture
            .aux
            .iter_mut()
            .map(|aux| aux.value(t, context))
            .collect()
    }

    /// Evaluate a dynamic parameter of the module by name.
    pub fn dynamic(&mut self, name: &str, t: f64) -> Result<f64> {
        let module = self.texture.module;
        let context = &self.context;
        let (_, generator) = self
            .texture
            .dynamics
            .iter_mut()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| {
                Error::Texture(format!(
                    "module {module} has no dynamic parameter '{name}'"
                ))
            })?;
        Ok(generator.number(t, context))
    }

    /// Evaluate a dynamic parameter and weight it to a non-negative integer.
    pub fn dynamic_count(&mut self, name: &str, t: f64) -> Result<usize> {
        let value = self.dynamic(name, t)?;
        Ok(float_to_int_weight(&mut self.rand_gen, value).unsigned_abs() as usize)
    }

    /// Realize a pitch: apply octave, field and the path's transpositions, then temper.
    pub fn temper(&mut self, ps: f64, octave: f64, field: f64) -> f64 {
        ps_to_tempered(
            ps,
            octave + self.path.octave(),
            Some(&mut self.temperament),
            field + self.path.field(),
        )
    }

    pub fn temperament(&mut self) -> &mut Temperament {
        &mut self.temperament
    }

    /// Field and octave transpositions of the path.
    pub fn path_transposition(&self) -> (f64, f64) {
        (self.path.field(), self.path.octave())
    }

    // ---------------------------------------------------------------------------------------------

    /// Random value in -1..=1, centered around 0.
    pub fn offset_noise(&mut self) -> f64 {
        unit::denorm(gauss(&mut self.rand_gen, 0.5, 0.1), -1.0, 1.0)
    }

    /// Uniform random value in the unit interval.
    pub fn unit_random(&mut self) -> f64 {
        uniform(&mut self.rand_gen)
    }

    /// A fresh seed, derived from the texture seed and the number of seeds taken so far.
    pub fn next_seed(&mut self) -> u64 {
        self.seed_count += 1;
        derive_seed(derive_seed(self.texture.seed, SLOT_SCORER), self.seed_count)
    }

    pub fn selector<T: Clone>(&mut self, values: Vec<T>, kind: SelectorKind) -> Result<Selector<T>> {
        let seed = self.next_seed();
        Selector::new(values, kind, seed)
    }

    // ---------------------------------------------------------------------------------------------

    /// Create an event of this texture. The comment carries the raw pitch and an optional
    /// message.
    pub fn event(
        &self,
        t: f64,
        beat: &Beat,
        amp: f64,
        ps: f64,
        pan: f64,
        aux: Vec<Value>,
        message: Option<&str>,
    ) -> Event {
        let mut comment = Vec::new();
        if let Some(ps_raw) = self.context.ps_raw {
            comment.push(format!("{ps_raw}"));
        }
        if let Some(message) = message {
            comment.push(message.to_string());
        }
        Event {
            inst: self.texture.instrument,
            time: t,
            sus: beat.sus,
            dur: beat.dur,
            acc: beat.acc,
            bpm: beat.bpm,
            pulse: beat.pulse.clone(),
            amp,
            ps,
            pan,
            aux,
            comment,
        }
    }

    pub fn store(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of stored events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Interpolate all stored events across the given frames.
    pub fn interpolate(
        &mut self,
        frames: &[Frame],
        snap_sus: bool,
        fields: &[EventField],
        aux: bool,
    ) -> Result<()> {
        self.events.sort();
        self.events.interpolate(frames, snap_sus, fields, aux)
    }

    /// Stored events, sorted by time.
    pub fn sorted_events(&mut self) -> &[Event] {
        self.events.sort();
        self.events.events()
    }
}

// -------------------------------------------------------------------------------------------------

/// A texture: parameter objects, statics and settings of one voice of a composition.
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    module: ModuleKind,
    path: String,
    instrument: usize,
    orchestra: OrchestraKind,
    midi_program: u8,
    midi_channel: Option<u8>,
    mute: bool,
    silence_mode: bool,
    orc_map_mode: bool,
    pitch_mode: PitchMode,
    temperament: TemperamentKind,
    seed: u64,
    time_range: (f64, f64),
    time_range_arg: Arg,
    beat: GeneratorObject,
    rhythm: RhythmObject,
    field: GeneratorObject,
    octave: GeneratorObject,
    amp: GeneratorObject,
    pan: GeneratorObject,
    aux: Vec<GeneratorObject>,
    statics: TextureStatics,
    dynamics: Vec<(&'static str, GeneratorObject)>,
}

impl Texture {
    /// Create a texture with default parameters for the given module, path name and
    /// orchestra instrument.
    pub fn new<S: Into<String>, P: Into<String>>(
        name: S,
        module: ModuleKind,
        path: P,
        orchestra: OrchestraKind,
        instrument: usize,
        seed: u64,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let orc = orchestra.orchestra();
        if !orc.has_instrument(instrument) {
            return Err(Error::Texture(format!(
                "orchestra {orchestra} has no instrument {instrument}"
            )));
        }
        let implementation = module.module();
        let aux = orc
            .aux_parameters(instrument, None)
            .iter()
            .enumerate()
            .map(|(i, aux)| registry::load_generator(&aux.default_arg()?, aux_seed(seed, i)))
            .collect::<Result<Vec<_>>>()?;
        let dynamics = implementation
            .dynamic_parameters()
            .iter()
            .enumerate()
            .map(|(i, dynamic)| {
                let generator = GeneratorObject::parse(dynamic.default, dynamic_seed(seed, i))?;
                Ok((dynamic.name, generator))
            })
            .collect::<Result<Vec<_>>>()?;
        let time_range_arg = Arg::parse(DEFAULT_TIME_RANGE)?;
        let (time_range, time_range_arg) = load_time_range(&time_range_arg)?;
        let midi_program = orc.default_midi_program(instrument);
        Ok(Self {
            name,
            module,
            path: path.into(),
            instrument,
            orchestra,
            midi_program,
            midi_channel: orc.midi_channel(),
            mute: false,
            silence_mode: false,
            orc_map_mode: true,
            pitch_mode: PitchMode::default(),
            temperament: TemperamentKind::TwelveEqual,
            seed,
            time_range,
            time_range_arg,
            beat: GeneratorObject::parse(DEFAULT_BEAT, derive_seed(seed, SLOT_BEAT))?,
            rhythm: RhythmObject::parse(DEFAULT_RHYTHM, derive_seed(seed, SLOT_RHYTHM))?,
            field: GeneratorObject::parse(DEFAULT_FIELD, derive_seed(seed, SLOT_FIELD))?,
            octave: GeneratorObject::parse(DEFAULT_OCTAVE, derive_seed(seed, SLOT_OCTAVE))?,
            amp: GeneratorObject::parse(orc.default_amplitude(), derive_seed(seed, SLOT_AMP))?,
            pan: GeneratorObject::parse(DEFAULT_PAN, derive_seed(seed, SLOT_PAN))?,
            aux,
            statics: TextureStatics::with_defaults(implementation.static_names())?,
            dynamics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    /// Name of the path this texture reads.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn instrument(&self) -> usize {
        self.instrument
    }

    pub fn orchestra(&self) -> OrchestraKind {
        self.orchestra
    }

    pub fn midi_program(&self) -> u8 {
        self.midi_program
    }

    pub fn midi_channel(&self) -> Option<u8> {
        self.midi_channel
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn silence_mode(&self) -> bool {
        self.silence_mode
    }

    pub fn orc_map_mode(&self) -> bool {
        self.orc_map_mode
    }

    pub fn pitch_mode(&self) -> PitchMode {
        self.pitch_mode
    }

    pub fn temperament(&self) -> TemperamentKind {
        self.temperament
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time_range(&self) -> (f64, f64) {
        self.time_range
    }

    pub fn statics(&self) -> &TextureStatics {
        &self.statics
    }

    /// Number of auxiliary parameters.
    pub fn aux_count(&self) -> usize {
        self.aux.len()
    }

    // ---------------------------------------------------------------------------------------------

    /// A copy of this texture with a new name.
    pub fn copy_as<S: Into<String>>(&self, name: S) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let mut texture = self.clone();
        texture.name = name;
        Ok(texture)
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Point the texture to another path.
    pub fn set_path<S: Into<String>>(&mut self, path: S) {
        self.path = path.into();
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    /// Change the instrument and orchestra. Auxiliary parameters are resized to the new
    /// instrument's count: existing slots are kept, new slots get the instrument's defaults.
    /// `aux_count` is only used by orchestras without fixed instruments.
    pub fn set_instrument(
        &mut self,
        orchestra: OrchestraKind,
        instrument: usize,
        aux_count: Option<usize>,
    ) -> Result<()> {
        let orc = orchestra.orchestra();
        if !orc.has_instrument(instrument) {
            return Err(Error::Texture(format!(
                "orchestra {orchestra} has no instrument {instrument}"
            )));
        }
        let declared = orc.aux_parameters(instrument, aux_count);
        let mut aux = self.aux.clone();
        aux.truncate(declared.len());
        for (i, parameter) in declared.iter().enumerate().skip(aux.len()) {
            aux.push(registry::load_generator(
                &parameter.default_arg()?,
                aux_seed(self.seed, i),
            )?);
        }
        if orchestra != self.orchestra {
            self.midi_channel = orc.midi_channel();
        }
        self.midi_program = orc.default_midi_program(instrument);
        self.aux = aux;
        self.orchestra = orchestra;
        self.instrument = instrument;
        Ok(())
    }

    /// Edit a parameter or setting by attribute name.
    ///
    /// Attributes are the event axes `beatT`, `rhythmQ`, `fieldQ`, `octQ`, `ampQ`, `panQ` and
    /// `auxQ<n>`, the time range `tRange`, static options `textQ` (given as e.g.
    /// `(lfm, set)`), dynamic parameters by their names, and the settings `mute`,
    /// `silenceMode`, `orcMapMode`, `pitchMode`, `temperament`, `midiProgram` and
    /// `midiChannel`. The texture is unchanged when the argument is invalid.
    pub fn edit(&mut self, attribute: &str, arg: &Arg) -> Result<()> {
        let seed = self.seed;
        match attribute {
            "beatT" => self.beat = generator(arg, derive_seed(seed, SLOT_BEAT), attribute)?,
            "rhythmQ" => {
                self.rhythm = registry::load_rhythm(arg, derive_seed(seed, SLOT_RHYTHM))
                    .map_err(|err| err.with_context(attribute))?
            }
            "fieldQ" => self.field = generator(arg, derive_seed(seed, SLOT_FIELD), attribute)?,
            "octQ" => self.octave = generator(arg, derive_seed(seed, SLOT_OCTAVE), attribute)?,
            "ampQ" => self.amp = generator(arg, derive_seed(seed, SLOT_AMP), attribute)?,
            "panQ" => self.pan = generator(arg, derive_seed(seed, SLOT_PAN), attribute)?,
            "tRange" => {
                let (range, arg) =
                    load_time_range(arg).map_err(|err| err.with_context(attribute))?;
                self.time_range = range;
                self.time_range_arg = arg;
            }
            "textQ" => {
                let mut statics = self.statics.clone();
                statics.set(arg).map_err(|err| err.with_context(attribute))?;
                self.statics = statics;
            }
            "mute" => self.mute = switch(arg, attribute)?,
            "silenceMode" => self.silence_mode = switch(arg, attribute)?,
            "orcMapMode" => self.orc_map_mode = switch(arg, attribute)?,
            "pitchMode" => {
                self.pitch_mode = PitchMode::try_from(string(arg, attribute)?)
                    .map_err(|err| Error::Argument(format!("{attribute}: {err}")))?
            }
            "temperament" => {
                self.temperament = Temperament::try_from(string(arg, attribute)?)
                    .map_err(|err| Error::Argument(format!("{attribute}: {err}")))?
                    .kind()
            }
            "midiProgram" => self.midi_program = midi_program(arg)?,
            "midiChannel" => self.midi_channel = midi_channel(arg)?,
            _ => {
                if let Some(index) = aux_index(attribute) {
                    let instrument = &self.instrument;
                    let aux_len = self.aux.len();
                    let slot = self.aux.get_mut(index).ok_or_else(|| {
                        Error::Argument(format!(
                            "{attribute}: instrument {} has {} auxiliary parameters",
                            instrument, aux_len
                        ))
                    })?;
                    *slot = generator(arg, aux_seed(seed, index), attribute)?;
                } else if let Some(index) =
                    self.dynamics.iter().position(|(name, _)| *name == attribute)
                {
                    self.dynamics[index].1 =
                        generator(arg, dynamic_seed(seed, index), attribute)?;
                } else {
                    return Err(Error::Argument(format!(
                        "texture {} has no attribute '{attribute}'",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Argument trees of all parameter objects and statics, keyed by attribute name.
    pub fn parameters(&self) -> BTreeMap<String, Arg> {
        let mut parameters = BTreeMap::new();
        parameters.insert("tRange".to_string(), self.time_range_arg.clone());
        parameters.insert("beatT".to_string(), self.beat.arg().clone());
        parameters.insert("rhythmQ".to_string(), self.rhythm.arg().clone());
        parameters.insert("fieldQ".to_string(), self.field.arg().clone());
        parameters.insert("octQ".to_string(), self.octave.arg().clone());
        parameters.insert("ampQ".to_string(), self.amp.arg().clone());
        parameters.insert("panQ".to_string(), self.pan.arg().clone());
        for (i, aux) in self.aux.iter().enumerate() {
            parameters.insert(aux_label(i), aux.arg().clone());
        }
        for (name, generator) in &self.dynamics {
            parameters.insert(name.to_string(), generator.arg().clone());
        }
        parameters
    }

    /// Argument trees of the static options, keyed by their long names.
    pub fn static_parameters(&self) -> BTreeMap<String, Arg> {
        self.statics
            .names()
            .filter_map(|name| Some((name.to_string(), self.statics.arg(name)?.clone())))
            .collect()
    }

    // ---------------------------------------------------------------------------------------------

    /// Rewind all parameter objects to their initial state.
    pub fn reset(&mut self) {
        self.beat.reset();
        self.rhythm.reset();
        self.field.reset();
        self.octave.reset();
        self.amp.reset();
        self.pan.reset();
        self.aux.iter_mut().for_each(GeneratorObject::reset);
        self.dynamics.iter_mut().for_each(|(_, d)| d.reset());
    }

    /// Create the texture's events for the given path, which must be the path the texture
    /// refers to. Parameter objects are reset first, so scoring is repeatable.
    pub fn score(&mut self, path: &Path, audio_dirs: &[PathBuf]) -> Result<EventSequence> {
        if path.is_empty() {
            return Err(Error::Texture(format!(
                "texture {}: path '{}' has no multisets",
                self.name,
                path.name()
            )));
        }
        self.reset();
        let (t_start, t_end) = self.time_range;
        if t_end <= t_start {
            return Ok(EventSequence::new());
        }
        let module = self.module.module();
        let name = self.name.clone();
        let mut scorer = Scorer::new(self, path, audio_dirs);
        module.score(&mut scorer).map_err(|err| match err {
            Error::Texture(msg) => Error::Texture(format!("texture {name}: {msg}")),
            other => other,
        })?;
        Ok(scorer.finish())
    }

    // ---------------------------------------------------------------------------------------------

    /// Serializable form of the texture.
    pub fn to_data(&self) -> TextureData {
        TextureData {
            name: self.name.clone(),
            module: self.module.name().to_string(),
            path: self.path.clone(),
            instrument: self.instrument,
            orchestra: self.orchestra.name().to_string(),
            aux_count: self.aux.len(),
            midi_program: self.midi_program,
            midi_channel: self.midi_channel,
            mute: self.mute,
            silence_mode: self.silence_mode,
            orc_map_mode: self.orc_map_mode,
            pitch_mode: self.pitch_mode.name().to_string(),
            temperament: self.temperament.name().to_string(),
            seed: self.seed,
            parameters: self.parameters(),
            statics: self.static_parameters(),
        }
    }

    /// Restore a texture from its serialized form.
    pub fn from_data(data: &TextureData) -> Result<Self> {
        let module = ModuleKind::try_from(data.module.as_str()).map_err(Error::Texture)?;
        let orchestra = OrchestraKind::try_from(data.orchestra.as_str()).map_err(Error::Texture)?;
        let mut texture = Self::new(
            data.name.clone(),
            module,
            data.path.clone(),
            orchestra,
            data.instrument,
            data.seed,
        )?;
        texture.set_instrument(orchestra, data.instrument, Some(data.aux_count))?;
        for (attribute, arg) in &data.parameters {
            texture.edit(attribute, arg)?;
        }
        for arg in data.statics.values() {
            texture.edit("textQ", arg)?;
        }
        texture.midi_program = data.midi_program;
        texture.midi_channel = data.midi_channel;
        texture.mute = data.mute;
        texture.silence_mode = data.silence_mode;
        texture.orc_map_mode = data.orc_map_mode;
        texture.pitch_mode = PitchMode::try_from(data.pitch_mode.as_str()).map_err(Error::Texture)?;
        texture.temperament = Temperament::try_from(data.temperament.as_str())
            .map_err(Error::Texture)?
            .kind();
        Ok(texture)
    }
}

// -------------------------------------------------------------------------------------------------

/// Serialized form of a [`Texture`]: settings and the argument trees of all parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureData {
    pub name: String,
    pub module: String,
    pub path: String,
    pub instrument: usize,
    pub orchestra: String,
    pub aux_count: usize,
    pub midi_program: u8,
    pub midi_channel: Option<u8>,
    pub mute: bool,
    pub silence_mode: bool,
    pub orc_map_mode: bool,
    pub pitch_mode: String,
    pub temperament: String,
    pub seed: u64,
    pub parameters: BTreeMap<String, Arg>,
    pub statics: BTreeMap<String, Arg>,
}

// -------------------------------------------------------------------------------------------------

/// Attribute name of an auxiliary parameter slot.
pub fn aux_label(index: usize) -> String {
    format!("auxQ{index}")
}

/// Slot index of an auxiliary parameter attribute name.
pub fn aux_index(attribute: &str) -> Option<usize> {
    attribute.strip_prefix("auxQ")?.parse().ok()
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(Error::Argument(format!(
            "invalid name '{name}': use letters, numbers, '_' or '-'"
        )));
    }
    Ok(())
}

fn aux_seed(seed: u64, index: usize) -> u64 {
    derive_seed(seed, SLOT_AUX + index as u64)
}

fn dynamic_seed(seed: u64, index: usize) -> u64 {
    derive_seed(seed, SLOT_DYNAMIC + index as u64)
}

fn generator(arg: &Arg, seed: u64, attribute: &str) -> Result<GeneratorObject> {
    registry::load_generator(arg, seed).map_err(|err| err.with_context(attribute))
}

fn string<'a>(arg: &'a Arg, attribute: &str) -> Result<&'a str> {
    arg.as_str()
        .ok_or_else(|| Error::Argument(format!("{attribute}: expected a name, got '{arg}'")))
}

pub(crate) fn switch(arg: &Arg, attribute: &str) -> Result<bool> {
    match arg {
        Arg::Number(value) => Ok(*value != 0.0),
        Arg::String(value) => match value.to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" => Ok(true),
            "off" | "false" | "no" => Ok(false),
            _ => Err(Error::Argument(format!(
                "{attribute}: expected on or off, got '{value}'"
            ))),
        },
        Arg::List(_) => Err(Error::Argument(format!(
            "{attribute}: expected on or off, got '{arg}'"
        ))),
    }
}

fn midi_program(arg: &Arg) -> Result<u8> {
    match arg {
        Arg::Number(value) if (0.0..=127.0).contains(value) => Ok(value.round() as u8),
        Arg::String(name) => general_midi::program_number(name)
            .ok_or_else(|| Error::Argument(format!("midiProgram: unknown program '{name}'"))),
        _ => Err(Error::Argument(format!(
            "midiProgram: expected a program number or name, got '{arg}'"
        ))),
    }
}

fn midi_channel(arg: &Arg) -> Result<Option<u8>> {
    match arg {
        Arg::Number(value) if (1.0..=16.0).contains(value) => Ok(Some(value.round() as u8)),
        Arg::String(value) if value.eq_ignore_ascii_case("auto") => Ok(None),
        _ => Err(Error::Argument(format!(
            "midiChannel: expected a channel in 1..=16 or auto, got '{arg}'"
        ))),
    }
}

/// Load a `staticRange` argument. Returns the range and the complete argument tree.
fn load_time_range(arg: &Arg) -> Result<((f64, f64), Arg)> {
    // a plain (start, end) pair is a shortcut for (staticRange, (start, end))
    let arg = match arg {
        Arg::List(items) if items.iter().all(|item| matches!(item, Arg::Number(_))) => {
            Arg::List(vec![Arg::String("staticRange".to_string()), arg.clone()])
        }
        _ => arg.clone(),
    };
    let (entry, args) = registry::resolve(Category::Generator, &arg, 0)?;
    if entry.name != "staticRange" {
        return Err(Error::ParameterObjectSyntax(format!(
            "expected a staticRange, got '{}'",
            entry.name
        )));
    }
    let range = StaticRange::from_args(&args)?.range();
    Ok((range, args.to_arg()))
}

/// Load a `staticInst` argument into an orchestra and instrument number.
pub fn load_instrument(arg: &Arg) -> Result<(OrchestraKind, usize)> {
    let (entry, args) = registry::resolve(Category::Generator, arg, 0)?;
    if entry.name != "staticInst" {
        return Err(Error::ParameterObjectSyntax(format!(
            "expected a staticInst, got '{}'",
            entry.name
        )));
    }
    let inst = StaticInst::from_args(&args)?;
    Ok((inst.orchestra(), inst.instrument()))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path() -> Result<Path> {
        Path::from_strings("a", &["3-4"])
    }

    pub(super) fn texture(module: ModuleKind) -> Result<Texture> {
        Texture::new("t1", module, "a", OrchestraKind::GeneralMidi, 0, 1)
    }

    fn edit(texture: &mut Texture, attribute: &str, arg: &str) -> Result<()> {
        texture.edit(attribute, &Arg::parse(arg)?)
    }

    #[test]
    fn module_kinds() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::try_from(kind.name()), Ok(kind));
            assert_eq!(ModuleKind::try_from(kind.alias()), Ok(kind));
            assert_eq!(kind.module().kind(), kind);
        }
        assert!(ModuleKind::try_from("FooBar").is_err());
    }

    #[test]
    fn defaults() -> Result<()> {
        for kind in ModuleKind::ALL {
            let texture = Texture::new("t", kind, "a", OrchestraKind::CsoundNative, 4, 0)?;
            assert_eq!(texture.time_range(), (0.0, 20.0));
            assert_eq!(texture.aux_count(), 2);
            let statics = texture.statics().names().collect::<Vec<_>>();
            assert_eq!(statics.len(), kind.module().static_names().len());
        }
        let percussion = Texture::new(
            "p",
            ModuleKind::LineGroove,
            "a",
            OrchestraKind::GeneralMidiPercussion,
            38,
            0,
        )?;
        assert_eq!(percussion.midi_channel(), Some(10));
        let piano = texture(ModuleKind::LineGroove)?;
        assert_eq!(piano.midi_program(), 0);
        assert!(Texture::new("t", ModuleKind::LineGroove, "a", OrchestraKind::GeneralMidi, 200, 0)
            .is_err());
        assert!(Texture::new("bad name", ModuleKind::LineGroove, "a", OrchestraKind::Generic, 0, 0)
            .is_err());
        Ok(())
    }

    #[test]
    fn edits() -> Result<()> {
        let mut texture = texture(ModuleKind::LineGroove)?;
        edit(&mut texture, "tRange", "0, 5")?;
        assert_eq!(texture.time_range(), (0.0, 5.0));
        edit(&mut texture, "tRange", "sr, (2, 4)")?;
        assert_eq!(texture.time_range(), (2.0, 4.0));
        assert!(edit(&mut texture, "tRange", "5, 2").is_err());
        assert_eq!(texture.time_range(), (2.0, 4.0));

        let before = texture.parameters();
        assert!(edit(&mut texture, "ampQ", "ru, foo").is_err());
        assert!(edit(&mut texture, "rhythmQ", "ws, e, 30").is_err());
        assert!(edit(&mut texture, "auxQ0", "c, 1").is_err());
        assert!(edit(&mut texture, "nothing", "c, 1").is_err());
        assert_eq!(texture.parameters(), before);

        edit(&mut texture, "textQ", "lfm, set")?;
        assert_eq!(
            texture.statics().level("levelFieldMonophonic"),
            crate::parameter::Level::Set
        );
        edit(&mut texture, "silenceMode", "on")?;
        assert!(texture.silence_mode());
        edit(&mut texture, "midiProgram", "violin")?;
        assert_eq!(texture.midi_program(), 40);
        edit(&mut texture, "pitchMode", "pcs")?;
        assert_eq!(texture.pitch_mode(), PitchMode::PitchClass);
        edit(&mut texture, "temperament", "pythagorean")?;
        assert_eq!(texture.temperament(), TemperamentKind::Pythagorean);
        Ok(())
    }

    #[test]
    fn instrument_changes() -> Result<()> {
        let mut texture =
            Texture::new("t", ModuleKind::LineGroove, "a", OrchestraKind::CsoundNative, 4, 0)?;
        edit(&mut texture, "auxQ0", "c, 7")?;
        texture.set_instrument(OrchestraKind::CsoundNative, 6, None)?;
        assert_eq!(texture.aux_count(), 4);
        assert_eq!(texture.parameters()["auxQ0"], Arg::parse("constant, 7")?);
        texture.set_instrument(OrchestraKind::GeneralMidi, 12, None)?;
        assert_eq!(texture.aux_count(), 0);
        assert_eq!(texture.midi_program(), 12);
        texture.set_instrument(OrchestraKind::CsoundExternal, 100, Some(3))?;
        assert_eq!(texture.aux_count(), 3);
        assert!(texture
            .set_instrument(OrchestraKind::CsoundNative, 999, None)
            .is_err());
        assert_eq!(texture.instrument(), 100);
        assert_eq!(
            load_instrument(&Arg::parse("si, 3, csoundNative")?)?,
            (OrchestraKind::CsoundNative, 3)
        );
        Ok(())
    }

    #[test]
    fn data_roundtrip() -> Result<()> {
        let mut texture = texture(ModuleKind::HarmonicAssembly)?;
        edit(&mut texture, "countPerMultiset", "c, 3")?;
        edit(&mut texture, "textQ", "mto, .1")?;
        edit(&mut texture, "ampQ", "ru, .2, (c, .8)")?;
        edit(&mut texture, "mute", "on")?;
        let data = texture.to_data();
        let restored = Texture::from_data(&data)?;
        assert_eq!(restored.to_data(), data);

        let path = Path::from_strings("a", &["3-4", "4-z15"])?;
        let (mut a, mut b) = (texture, restored);
        assert_eq!(a.score(&path, &[])?, b.score(&path, &[])?);
        Ok(())
    }

    #[test]
    fn repeatable_scores() -> Result<()> {
        let path = path()?;
        for kind in ModuleKind::ALL {
            let mut texture =
                Texture::new("t", kind, "a", OrchestraKind::CsoundNative, 4, 42)?;
            edit(&mut texture, "tRange", "0, 6")?;
            let first = texture.score(&path, &[])?;
            let second = texture.score(&path, &[])?;
            assert_eq!(first, second, "{kind} is not repeatable");
            assert!(!first.is_empty(), "{kind} created no events");
            let times = first.get_array(EventField::Time);
            assert!(times.windows(2).all(|w| w[0] <= w[1]), "{kind} is not sorted");
            assert!(first.iter().all(|e| e.aux.len() == 2));
        }
        Ok(())
    }

    #[test]
    fn degenerate_ranges() -> Result<()> {
        let mut texture = texture(ModuleKind::LineGroove)?;
        edit(&mut texture, "tRange", "3, 3")?;
        assert!(texture.score(&path()?, &[])?.is_empty());
        assert!(texture.score(&Path::new("empty"), &[]).is_err());
        Ok(())
    }

    #[test]
    fn invalid_rhythms() -> Result<()> {
        let mut texture = texture(ModuleKind::LineGroove)?;
        edit(&mut texture, "beatT", "c, 0")?;
        assert!(texture.score(&path()?, &[]).is_err());
        Ok(())
    }
}
