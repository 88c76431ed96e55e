//! Output engines: serialize performed textures and clones into score, MIDI, text and audio
//! files.
//!
//! An [`EventMode`] names the default orchestra of a session. When rendering, the event mode
//! and the requested [`FileFormat`]s select a set of engines. Each engine maps event values
//! with its own orchestra, skips textures whose orchestra it can't handle, and reports the
//! formats it actually wrote.

use std::{fmt::Write as _, path::Path};

use anyhow::Context;

use crate::{
    environment::{Environment, PathMap},
    orchestra::{Axis, Orchestra, OrchestraKind},
    parameter::Value,
    performer::{parts, Part, PerformedTexture, Performer},
};

pub mod ac_toolbox;
pub mod audio;
pub mod coll;
pub mod csound;
pub mod midi;
pub mod text;

pub use ac_toolbox::EngineAcToolbox;
pub use audio::EngineAudioFile;
pub use coll::EngineMaxColl;
pub use csound::{EngineCsoundExternal, EngineCsoundNative, EngineCsoundSilence};
pub use midi::EngineMidiFile;
pub use text::EngineText;

// -------------------------------------------------------------------------------------------------

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileFormat {
    CsoundOrchestra,
    CsoundScore,
    CsoundBatch,
    CsoundData,
    MidiFile,
    MaxColl,
    AcToolbox,
    AudioFile,
    TextTab,
    TextSpace,
}

impl FileFormat {
    pub const ALL: [FileFormat; 10] = [
        Self::CsoundOrchestra,
        Self::CsoundScore,
        Self::CsoundBatch,
        Self::CsoundData,
        Self::MidiFile,
        Self::MaxColl,
        Self::AcToolbox,
        Self::AudioFile,
        Self::TextTab,
        Self::TextSpace,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CsoundOrchestra => "csoundOrchestra",
            Self::CsoundScore => "csoundScore",
            Self::CsoundBatch => "csoundBatch",
            Self::CsoundData => "csoundData",
            Self::MidiFile => "midiFile",
            Self::MaxColl => "maxColl",
            Self::AcToolbox => "acToolbox",
            Self::AudioFile => "audioFile",
            Self::TextTab => "textTab",
            Self::TextSpace => "textSpace",
        }
    }

    /// File name extension, including the dot. Audio files use the extension of the
    /// session's audio format instead.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CsoundOrchestra => ".orc",
            Self::CsoundScore => ".sco",
            Self::CsoundBatch => {
                if cfg!(windows) {
                    ".bat"
                } else {
                    ".sh"
                }
            }
            Self::CsoundData => ".csd",
            Self::MidiFile => ".mid",
            Self::MaxColl => ".txt",
            Self::AcToolbox => ".lisp",
            Self::AudioFile => ".aif",
            Self::TextTab => "_tab.txt",
            Self::TextSpace => "_space.txt",
        }
    }
}

impl TryFrom<&str> for FileFormat {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        let lower = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name().to_ascii_lowercase() == lower)
            .ok_or_else(|| format!("invalid output format '{value}'"))
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Event modes: the default orchestra of new textures and the primary output engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventMode {
    #[default]
    CsoundNative,
    CsoundSilence,
    CsoundExternal,
    Midi,
    MidiPercussion,
}

impl EventMode {
    pub const ALL: [EventMode; 5] = [
        Self::CsoundNative,
        Self::CsoundSilence,
        Self::CsoundExternal,
        Self::Midi,
        Self::MidiPercussion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CsoundNative => "csoundNative",
            Self::CsoundSilence => "csoundSilence",
            Self::CsoundExternal => "csoundExternal",
            Self::Midi => "midi",
            Self::MidiPercussion => "midiPercussion",
        }
    }

    /// Orchestra of the event mode.
    pub fn orchestra(&self) -> OrchestraKind {
        match self {
            Self::CsoundNative => OrchestraKind::CsoundNative,
            Self::CsoundSilence => OrchestraKind::CsoundSilence,
            Self::CsoundExternal => OrchestraKind::CsoundExternal,
            Self::Midi => OrchestraKind::GeneralMidi,
            Self::MidiPercussion => OrchestraKind::GeneralMidiPercussion,
        }
    }

    /// Instrument of new textures in this event mode.
    pub fn default_instrument(&self) -> usize {
        match self {
            Self::CsoundNative => 4,
            Self::CsoundSilence | Self::CsoundExternal => 1,
            Self::Midi => 0,
            Self::MidiPercussion => 35,
        }
    }

    /// The engine which always gets used in this event mode.
    pub fn engine(&self) -> EngineKind {
        match self {
            Self::CsoundNative => EngineKind::CsoundNative,
            Self::CsoundSilence => EngineKind::CsoundSilence,
            Self::CsoundExternal => EngineKind::CsoundExternal,
            Self::Midi | Self::MidiPercussion => EngineKind::MidiFile,
        }
    }
}

impl TryFrom<&str> for EventMode {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csoundnative" | "cn" => Ok(Self::CsoundNative),
            "csoundsilence" | "cs" => Ok(Self::CsoundSilence),
            "csoundexternal" | "ce" => Ok(Self::CsoundExternal),
            "midi" | "m" => Ok(Self::Midi),
            "midipercussion" | "mp" => Ok(Self::MidiPercussion),
            _ => Err(format!("invalid event mode '{value}'")),
        }
    }
}

impl std::fmt::Display for EventMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// All available output engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    CsoundNative,
    CsoundExternal,
    CsoundSilence,
    MidiFile,
    MaxColl,
    AcToolbox,
    AudioFile,
    Text,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CsoundNative => "EngineCsoundNative",
            Self::CsoundExternal => "EngineCsoundExternal",
            Self::CsoundSilence => "EngineCsoundSilence",
            Self::MidiFile => "EngineMidiFile",
            Self::MaxColl => "EngineMaxColl",
            Self::AcToolbox => "EngineAcToolbox",
            Self::AudioFile => "EngineAudioFile",
            Self::Text => "EngineText",
        }
    }

    /// The engine implementation of this kind.
    pub fn engine(&self) -> &'static dyn OutputEngine {
        static CSOUND_NATIVE: EngineCsoundNative = EngineCsoundNative;
        static CSOUND_EXTERNAL: EngineCsoundExternal = EngineCsoundExternal;
        static CSOUND_SILENCE: EngineCsoundSilence = EngineCsoundSilence;
        static MIDI_FILE: EngineMidiFile = EngineMidiFile;
        static MAX_COLL: EngineMaxColl = EngineMaxColl;
        static AC_TOOLBOX: EngineAcToolbox = EngineAcToolbox;
        static AUDIO_FILE: EngineAudioFile = EngineAudioFile;
        static TEXT: EngineText = EngineText;
        match self {
            Self::CsoundNative => &CSOUND_NATIVE,
            Self::CsoundExternal => &CSOUND_EXTERNAL,
            Self::CsoundSilence => &CSOUND_SILENCE,
            Self::MidiFile => &MIDI_FILE,
            Self::MaxColl => &MAX_COLL,
            Self::AcToolbox => &AC_TOOLBOX,
            Self::AudioFile => &AUDIO_FILE,
            Self::Text => &TEXT,
        }
    }

    /// Orchestra which maps event values of this engine in the given event mode.
    pub fn orchestra(&self, mode: EventMode) -> OrchestraKind {
        match self {
            Self::CsoundNative => OrchestraKind::CsoundNative,
            Self::CsoundExternal => OrchestraKind::CsoundExternal,
            Self::CsoundSilence => OrchestraKind::CsoundSilence,
            Self::MaxColl => OrchestraKind::GeneralMidi,
            Self::MidiFile | Self::AcToolbox => match mode {
                EventMode::Midi | EventMode::MidiPercussion => mode.orchestra(),
                _ => OrchestraKind::GeneralMidi,
            },
            Self::AudioFile => OrchestraKind::Generic,
            Self::Text => mode.orchestra(),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Session settings which affect written files.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub event_mode: EventMode,
    /// Tempo of written MIDI files, in beats per minute.
    pub midi_tempo: f64,
    pub audio_channels: usize,
    pub audio_sample_rate: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            event_mode: EventMode::default(),
            midi_tempo: 120.0,
            audio_channels: 2,
            audio_sample_rate: 44100,
        }
    }
}

/// Everything an engine needs to write its files, besides the performed parts.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub orchestra: &'static dyn Orchestra,
    pub settings: &'a RenderSettings,
    pub environment: &'a Environment,
    pub paths: &'a PathMap,
}

// -------------------------------------------------------------------------------------------------

/// An output engine: writes the events of performed textures into one or more file formats.
pub trait OutputEngine: std::fmt::Debug + Sync {
    fn kind(&self) -> EngineKind;

    /// All formats the engine can write.
    fn formats(&self) -> &'static [FileFormat];

    /// Formats the engine always writes when it is used.
    fn min_formats(&self) -> &'static [FileFormat];

    /// Texture orchestras the engine can't handle.
    fn incompatible(&self) -> &'static [OrchestraKind] {
        &[]
    }

    /// Write the given parts in the requested formats, which have been completed with the
    /// engine's minimum formats. Returns the formats which got written.
    fn write(
        &self,
        parts: &[Part],
        request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>>;
}

/// Complete a format request for an engine: without any request the engine's minimum
/// formats are used. Requests which miss one of the minimum formats get them added.
pub fn complete_request(engine: &dyn OutputEngine, request: &[FileFormat]) -> Vec<FileFormat> {
    if request.is_empty() {
        return engine.min_formats().to_vec();
    }
    let mut completed = request.to_vec();
    for format in engine.min_formats() {
        if !completed.contains(format) {
            completed.push(*format);
        }
    }
    completed
}

/// Engines which are needed to write the requested formats in the given event mode.
pub fn allocate_engines(mode: EventMode, request: &[FileFormat]) -> Vec<EngineKind> {
    let requested = |format| request.contains(&format);
    let mut engines = Vec::new();
    match mode {
        EventMode::CsoundNative | EventMode::CsoundSilence | EventMode::CsoundExternal => {
            engines.push(mode.engine())
        }
        EventMode::Midi | EventMode::MidiPercussion => {
            if requested(FileFormat::CsoundScore) {
                engines.push(EngineKind::CsoundExternal);
            }
        }
    }
    if matches!(mode, EventMode::Midi | EventMode::MidiPercussion)
        || requested(FileFormat::MidiFile)
    {
        engines.push(EngineKind::MidiFile);
    }
    if requested(FileFormat::MaxColl) {
        engines.push(EngineKind::MaxColl);
    }
    if requested(FileFormat::TextTab) || requested(FileFormat::TextSpace) {
        engines.push(EngineKind::Text);
    }
    if requested(FileFormat::AcToolbox) {
        engines.push(EngineKind::AcToolbox);
    }
    if requested(FileFormat::AudioFile) {
        engines.push(EngineKind::AudioFile);
    }
    engines
}

/// Textures an engine can write. Incompatible textures are logged and skipped.
fn compatible_textures<'a>(
    kind: EngineKind,
    orchestra: OrchestraKind,
    performer: &'a Performer,
) -> Vec<&'a PerformedTexture> {
    let incompatible = kind.engine().incompatible();
    performer
        .textures()
        .iter()
        .filter(|texture| {
            if texture.orchestra != orchestra && incompatible.contains(&texture.orchestra) {
                log::warn!(
                    "texture {} (instrument {}, orchestra {}) is incompatible with {} \
                    (orchestra {}), skipping it",
                    texture.name,
                    texture.instrument,
                    texture.orchestra,
                    kind,
                    orchestra
                );
                false
            } else {
                true
            }
        })
        .collect()
}

/// Write a performance with all engines the event mode and format request need. Engines
/// which fail get logged, the remaining engines continue. Returns all written formats.
pub fn render(
    performer: &Performer,
    settings: &RenderSettings,
    environment: &Environment,
    paths: &PathMap,
    request: &[FileFormat],
) -> Vec<FileFormat> {
    let mut written = Vec::new();
    for kind in allocate_engines(settings.event_mode, request) {
        let engine = kind.engine();
        let orchestra = kind.orchestra(settings.event_mode);
        let textures = compatible_textures(kind, orchestra, performer);
        let parts = parts(textures);
        if parts.is_empty() {
            log::info!("{kind}: no compatible textures, nothing to write");
            continue;
        }
        let context = EngineContext {
            orchestra: orchestra.orchestra(),
            settings,
            environment,
            paths,
        };
        let request = complete_request(engine, request);
        match engine
            .write(&parts, &request, &context)
            .with_context(|| format!("{kind} failed to write '{}'", paths.stem()))
        {
            Ok(formats) => {
                for format in formats {
                    log::info!("{kind}: wrote {}", paths.get(format).display());
                    written.push(format);
                }
            }
            Err(err) => log::warn!("{err:#}"),
        }
    }
    written.sort();
    written.dedup();
    written
}

// -------------------------------------------------------------------------------------------------

/// Map an event value with the engine's orchestra, using the texture's instrument and
/// orchestra mapping mode.
pub(crate) fn post_map(context: &EngineContext, part: &Part, axis: Axis, value: f64) -> f64 {
    context
        .orchestra
        .post_map(part.texture.instrument, axis, value, part.texture.orc_map_mode)
}

/// Format a number rounded to the given number of decimal places. Integral values keep a
/// trailing `.0`, so columns can be told apart from integer columns.
pub(crate) fn format_float(value: f64, places: usize) -> String {
    let scale = 10f64.powi(places.min(15) as i32);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 {
        // no negative zeros
        "0.0".to_string()
    } else {
        format!("{rounded:?}")
    }
}

/// Format an auxiliary value: numbers are rounded, strings are written as they are.
pub(crate) fn format_value(value: &Value, places: usize) -> String {
    match value {
        Value::Number(number) => format_float(*number, places),
        Value::String(string) => string.clone(),
    }
}

/// Left aligned column of at least the given width, followed by a separating space.
pub(crate) fn column(text: &str, width: usize) -> String {
    format!("{text:<width$} ")
}

/// Trailing comment of a score row.
pub(crate) fn format_comment(comment: &[String], delimiter: &str) -> String {
    let mut text = format!(" {delimiter}");
    for (i, item) in comment.iter().enumerate() {
        if i > 0 {
            text.push(':');
        }
        let _ = write!(text, " {item}");
    }
    text.push('\n');
    text
}

/// Column labels of a score table, with one column per auxiliary value.
pub(crate) fn format_label(columns: &[&str], aux_count: usize, delimiter: &str) -> String {
    let mut labels = columns.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    labels.extend((1..=aux_count).map(|i| format!("aux{i:02}")));
    labels.push("comment".to_string());
    labels.join(delimiter)
}

/// Score file header. Headers contain no timestamps, so written files are reproducible.
pub(crate) fn format_header(kind: EngineKind, orchestra: OrchestraKind, prefix: &str) -> String {
    format!(
        "{prefix}athenacl {}\n{prefix}output generator: {kind} (orchestra: {orchestra})\n\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Section header of a texture or clone in score files.
pub(crate) fn format_part_header(part: &Part, prefix: &str) -> String {
    match part.clone {
        Some(clone) => format!(
            "{prefix}TM({}), TI({}), TC({clone})\n",
            part.texture.module, part.texture.name
        ),
        None => format!(
            "{prefix}TM({}), TI({})\n",
            part.texture.module, part.texture.name
        ),
    }
}

/// Number of auxiliary values of a part, taken from its first event.
pub(crate) fn aux_count(part: &Part) -> usize {
    part.events.get(0).map_or(0, |e| e.aux.len())
}

/// Write a text or binary file, adding the path to errors.
pub(crate) fn write_file<C: AsRef<[u8]>>(path: &Path, content: C) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("failed to write file '{}'", path.display()))
}

// -------------------------------------------------------------------------------------------------
