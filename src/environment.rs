//! Explicit rendering context: seeds, output locations and output format options which are
//! shared by all scoring and writing operations of a session.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use rand::Rng;

use crate::engine::FileFormat;

// -------------------------------------------------------------------------------------------------

/// Audio file container of rendered or mixed audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    #[default]
    Aif,
    Wav,
}

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aif => "aif",
            Self::Wav => "wav",
        }
    }

    /// File name extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aif => ".aif",
            Self::Wav => ".wav",
        }
    }

    /// Csound command line flag which selects this format.
    pub fn csound_flag(&self) -> &'static str {
        match self {
            Self::Aif => "-A",
            Self::Wav => "-W",
        }
    }
}

impl TryFrom<&str> for AudioFormat {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aif" | "aiff" => Ok(Self::Aif),
            "wav" | "wave" => Ok(Self::Wav),
            _ => Err(format!("invalid audio format '{value}': expected aif or wav")),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Conversion of unit interval values into signed audio samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AudioConversion {
    /// Map [0, 1] linearly into the full signed sample range.
    #[default]
    Direct,
    /// Map [0, 1] into the positive range, flipping the sign at each zero value.
    Reflect,
    /// Map [0, 1] into the full range, then fold into its absolute value, flipping the sign
    /// at each zero value.
    Fold,
}

impl AudioConversion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Reflect => "reflect",
            Self::Fold => "fold",
        }
    }
}

impl TryFrom<&str> for AudioConversion {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" | "d" => Ok(Self::Direct),
            "reflect" | "r" => Ok(Self::Reflect),
            "fold" | "f" => Ok(Self::Fold),
            _ => Err(format!(
                "invalid audio conversion '{value}': expected direct, reflect or fold"
            )),
        }
    }
}

impl std::fmt::Display for AudioConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Resolved output file paths, keyed by output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMap {
    stem: String,
    audio: PathBuf,
    paths: BTreeMap<FileFormat, PathBuf>,
}

impl PathMap {
    /// File stem all paths are derived from. Also used as the title of written scores.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Path of the file a format gets written to.
    pub fn get(&self, format: FileFormat) -> &Path {
        self.paths
            .get(&format)
            .map(PathBuf::as_path)
            .unwrap_or(Path::new(""))
    }

    /// Path of the audio file Csound renders into.
    pub fn audio(&self) -> &Path {
        &self.audio
    }
}

// -------------------------------------------------------------------------------------------------

/// Default shift of textures which share a MIDI channel: 5 milliseconds of a 960 ticks
/// per quarter note resolution.
pub const DEFAULT_MIDI_MICRO_OFFSET_TICKS: u32 = 5;

/// Default number of significant digits of Csound score values.
pub const DEFAULT_SCORE_PRECISION: usize = 6;

/// Session context for scoring and writing.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    seed: Option<u64>,
    output_directory: PathBuf,
    file_stem: String,
    csound_command: String,
    audio_directories: Vec<PathBuf>,
    audio_format: AudioFormat,
    audio_conversion: AudioConversion,
    midi_micro_offset_ticks: u32,
    score_precision: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            seed: None,
            output_directory: std::env::temp_dir(),
            file_stem: "athenacl".to_string(),
            csound_command: "csound".to_string(),
            audio_directories: Vec::new(),
            audio_format: AudioFormat::default(),
            audio_conversion: AudioConversion::default(),
            midi_micro_offset_ticks: DEFAULT_MIDI_MICRO_OFFSET_TICKS,
            score_precision: DEFAULT_SCORE_PRECISION,
        }
    }
}

macro_rules! generate_builder_funcs {
    ($name:ident, $type:ty) => {
        paste::paste! {
            #[must_use]
            pub fn [<with_ $name>](self, $name: $type) -> Self {
                Self { $name, ..self }
            }
        }
    };
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed seed for all newly created textures and clones.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Write output files into the given directory.
    #[must_use]
    pub fn with_output_directory<P: Into<PathBuf>>(self, directory: P) -> Self {
        Self {
            output_directory: directory.into(),
            ..self
        }
    }

    /// Name output files after the given stem.
    #[must_use]
    pub fn with_file_stem<S: Into<String>>(self, stem: S) -> Self {
        Self {
            file_stem: stem.into(),
            ..self
        }
    }

    /// Command which renders csound files in written batch scripts.
    #[must_use]
    pub fn with_csound_command<S: Into<String>>(self, command: S) -> Self {
        Self {
            csound_command: command.into(),
            ..self
        }
    }

    generate_builder_funcs!(audio_directories, Vec<PathBuf>);
    generate_builder_funcs!(audio_format, AudioFormat);
    generate_builder_funcs!(audio_conversion, AudioConversion);
    generate_builder_funcs!(midi_micro_offset_ticks, u32);
    generate_builder_funcs!(score_precision, usize);

    /// The session's seed. Without a fixed seed, a random one gets picked once and is kept
    /// for the rest of the session.
    pub fn seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(|| rand::rng().random())
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    pub fn csound_command(&self) -> &str {
        &self.csound_command
    }

    /// Directories which get searched for audio files.
    pub fn audio_directories(&self) -> &[PathBuf] {
        &self.audio_directories
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    pub fn audio_conversion(&self) -> AudioConversion {
        self.audio_conversion
    }

    pub fn midi_micro_offset_ticks(&self) -> u32 {
        self.midi_micro_offset_ticks
    }

    /// Significant digits of Csound score values.
    pub fn score_precision(&self) -> usize {
        self.score_precision
    }

    /// Resolve the paths of all output formats for the given file stem, within the output
    /// directory.
    pub fn path_map(&self, stem: &str) -> PathMap {
        let path = |extension: &str| self.output_directory.join(format!("{stem}{extension}"));
        let paths = FileFormat::ALL
            .iter()
            .map(|format| {
                // mixed audio must not overwrite audio rendered by csound
                let extension = match format {
                    FileFormat::AudioFile => format!(".synth{}", self.audio_format.extension()),
                    _ => format.extension().to_string(),
                };
                (*format, path(&extension))
            })
            .collect();
        PathMap {
            stem: stem.to_string(),
            audio: path(self.audio_format.extension()),
            paths,
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builders() {
        let environment = Environment::new()
            .with_seed(12)
            .with_output_directory("/tmp/out")
            .with_audio_format(AudioFormat::Wav)
            .with_midi_micro_offset_ticks(10)
            .with_score_precision(4);
        assert_eq!(environment.clone().seed(), 12);
        assert_eq!(environment.output_directory(), Path::new("/tmp/out"));
        assert_eq!(environment.audio_format(), AudioFormat::Wav);
        assert_eq!(environment.audio_conversion(), AudioConversion::Direct);
        assert_eq!(environment.midi_micro_offset_ticks(), 10);
        assert_eq!(environment.score_precision(), 4);
    }

    #[test]
    fn random_seed_is_kept() {
        let mut environment = Environment::new();
        let seed = environment.seed();
        assert_eq!(environment.seed(), seed);
    }

    #[test]
    fn paths() {
        let environment = Environment::new()
            .with_output_directory("/tmp/out")
            .with_audio_format(AudioFormat::Wav);
        let paths = environment.path_map("test");
        assert_eq!(paths.stem(), "test");
        assert_eq!(paths.get(FileFormat::CsoundScore), Path::new("/tmp/out/test.sco"));
        assert_eq!(paths.get(FileFormat::MidiFile), Path::new("/tmp/out/test.mid"));
        assert_eq!(paths.get(FileFormat::TextTab), Path::new("/tmp/out/test_tab.txt"));
        assert_eq!(
            paths.get(FileFormat::AudioFile),
            Path::new("/tmp/out/test.synth.wav")
        );
        assert_eq!(paths.audio(), Path::new("/tmp/out/test.wav"));
    }

    #[test]
    fn names() {
        assert_eq!(AudioFormat::try_from("AIFF"), Ok(AudioFormat::Aif));
        assert!(AudioFormat::try_from("sd2").is_err());
        assert_eq!(AudioConversion::try_from("fold"), Ok(AudioConversion::Fold));
        assert!(AudioConversion::try_from("mirror").is_err());
    }
}
