//! Orchestras: named instrument collections which declare the auxiliary parameters of their
//! instruments and map normalized amplitude, pitch and panning values into the native units
//! of an output format.

use std::fmt::Debug;

use crate::{error::Result, parameter::Arg};

pub mod csound;
pub mod general_midi;

pub use csound::{CsoundExternal, CsoundNative, CsoundSilence};
pub use general_midi::{GeneralMidi, GeneralMidiPercussion};

// -------------------------------------------------------------------------------------------------

/// Names of all available orchestras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestraKind {
    CsoundNative,
    CsoundExternal,
    CsoundSilence,
    GeneralMidi,
    GeneralMidiPercussion,
    Generic,
}

impl OrchestraKind {
    pub const ALL: [OrchestraKind; 6] = [
        Self::CsoundNative,
        Self::CsoundExternal,
        Self::CsoundSilence,
        Self::GeneralMidi,
        Self::GeneralMidiPercussion,
        Self::Generic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CsoundNative => "csoundNative",
            Self::CsoundExternal => "csoundExternal",
            Self::CsoundSilence => "csoundSilence",
            Self::GeneralMidi => "generalMidi",
            Self::GeneralMidiPercussion => "generalMidiPercussion",
            Self::Generic => "generic",
        }
    }

    /// The orchestra implementation of this kind.
    pub fn orchestra(&self) -> &'static dyn Orchestra {
        static CSOUND_NATIVE: CsoundNative = CsoundNative;
        static CSOUND_EXTERNAL: CsoundExternal = CsoundExternal;
        static CSOUND_SILENCE: CsoundSilence = CsoundSilence;
        static GENERAL_MIDI: GeneralMidi = GeneralMidi;
        static GENERAL_MIDI_PERCUSSION: GeneralMidiPercussion = GeneralMidiPercussion;
        static GENERIC: Generic = Generic;
        match self {
            Self::CsoundNative => &CSOUND_NATIVE,
            Self::CsoundExternal => &CSOUND_EXTERNAL,
            Self::CsoundSilence => &CSOUND_SILENCE,
            Self::GeneralMidi => &GENERAL_MIDI,
            Self::GeneralMidiPercussion => &GENERAL_MIDI_PERCUSSION,
            Self::Generic => &GENERIC,
        }
    }
}

impl TryFrom<&str> for OrchestraKind {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csoundnative" | "cn" => Ok(Self::CsoundNative),
            "csoundexternal" | "ce" => Ok(Self::CsoundExternal),
            "csoundsilence" | "cs" => Ok(Self::CsoundSilence),
            "generalmidi" | "gm" => Ok(Self::GeneralMidi),
            "generalmidipercussion" | "gmp" => Ok(Self::GeneralMidiPercussion),
            "generic" | "g" => Ok(Self::Generic),
            _ => Err(format!("invalid orchestra '{value}'")),
        }
    }
}

impl std::fmt::Display for OrchestraKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Event axes which orchestras map into native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Amp,
    Ps,
    Pan,
}

/// Declaration of an instrument's auxiliary parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxParameter {
    pub name: &'static str,
    /// Default parameter object, as argument string.
    pub default: &'static str,
}

impl AuxParameter {
    pub const fn new(name: &'static str, default: &'static str) -> Self {
        Self { name, default }
    }

    /// Parsed default argument tree.
    pub fn default_arg(&self) -> Result<Arg> {
        Arg::parse(self.default)
    }
}

// -------------------------------------------------------------------------------------------------

/// An orchestra: instrument declarations and value mappings of one output family.
pub trait Orchestra: Debug + Sync {
    fn kind(&self) -> OrchestraKind;

    /// True when the instrument number is valid in this orchestra.
    fn has_instrument(&self, instrument: usize) -> bool;

    /// Instrument numbers of the orchestra, or None when any number is accepted.
    fn instruments(&self) -> Option<Vec<usize>> {
        None
    }

    fn instrument_name(&self, instrument: usize) -> String;

    /// Auxiliary parameters of an instrument. Orchestras without fixed instruments take the
    /// requested parameter count.
    fn aux_parameters(&self, instrument: usize, count: Option<usize>) -> Vec<AuxParameter>;

    /// Default MIDI program of an instrument.
    fn default_midi_program(&self, _instrument: usize) -> u8 {
        0
    }

    /// Fixed MIDI channel of the orchestra, if any.
    fn midi_channel(&self) -> Option<u8> {
        None
    }

    /// Default amplitude parameter object of new textures, as argument string.
    fn default_amplitude(&self) -> &'static str {
        "rb, .4, .4, .7, .9"
    }

    /// Map a normalized value into native units. When `map_mode` is off, values are only
    /// limited, not scaled.
    fn post_map(&self, _instrument: usize, axis: Axis, value: f64, map_mode: bool) -> f64 {
        generic_post_map(axis, value, map_mode)
    }

    /// Orchestra file content for the given instruments, if the orchestra is file based.
    fn construct_orchestra(
        &self,
        _channels: usize,
        _sample_rate: u32,
        _instruments: &[usize],
    ) -> Option<String> {
        None
    }

    /// Function tables the orchestra's instruments need in a score.
    fn score_tables(&self) -> Option<String> {
        None
    }
}

/// Wrap panning values outside of the unit interval.
pub(crate) fn wrap_pan(value: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        value.rem_euclid(1.0)
    }
}

/// Limit amplitudes to the unit interval and wrap panning values.
pub(crate) fn generic_post_map(axis: Axis, value: f64, map_mode: bool) -> f64 {
    match axis {
        Axis::Amp => {
            if map_mode {
                value.clamp(0.0, 1.0)
            } else {
                value.max(0.0)
            }
        }
        Axis::Pan => {
            if map_mode {
                wrap_pan(value)
            } else {
                value
            }
        }
        Axis::Ps => value,
    }
}

// -------------------------------------------------------------------------------------------------

/// An orchestra without instruments or auxiliary parameters. Used when mixing amplitudes to
/// audio files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Orchestra for Generic {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::Generic
    }

    fn has_instrument(&self, _instrument: usize) -> bool {
        true
    }

    fn instrument_name(&self, _instrument: usize) -> String {
        "generic".to_string()
    }

    fn aux_parameters(&self, _instrument: usize, _count: Option<usize>) -> Vec<AuxParameter> {
        Vec::new()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::parameter::GeneratorObject;

    #[test]
    fn kinds() {
        for kind in OrchestraKind::ALL {
            assert_eq!(OrchestraKind::try_from(kind.name()), Ok(kind));
            assert_eq!(kind.orchestra().kind(), kind);
        }
        assert_eq!(OrchestraKind::try_from("GM"), Ok(OrchestraKind::GeneralMidi));
        assert!(OrchestraKind::try_from("supercollider").is_err());
    }

    #[test]
    fn generic_mapping() {
        let generic = OrchestraKind::Generic.orchestra();
        assert_eq!(generic.post_map(0, Axis::Amp, 1.5, true), 1.0);
        assert_eq!(generic.post_map(0, Axis::Amp, 1.5, false), 1.5);
        assert_eq!(generic.post_map(0, Axis::Amp, -0.5, false), 0.0);
        assert_eq!(generic.post_map(0, Axis::Pan, 1.25, true), 0.25);
        assert_eq!(generic.post_map(0, Axis::Pan, 1.0, true), 1.0);
        assert_eq!(generic.post_map(0, Axis::Ps, 13.5, true), 13.5);
    }

    #[test]
    fn aux_defaults_parse() -> Result<()> {
        for kind in OrchestraKind::ALL {
            let orchestra = kind.orchestra();
            let instruments = orchestra.instruments().unwrap_or_else(|| vec![1]);
            for instrument in instruments {
                for aux in orchestra.aux_parameters(instrument, Some(2)) {
                    GeneratorObject::new(&aux.default_arg()?, 0)?;
                }
            }
        }
        Ok(())
    }
}
