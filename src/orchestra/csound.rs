//! Csound orchestras: the built-in instrument collection, instruments defined outside of the
//! crate, and the Silence csound front end.

use std::fmt::Write;

use crate::pitch::{ps_to_midi_real, ps_to_pch};

use super::{generic_post_map, wrap_pan, Axis, AuxParameter, Orchestra, OrchestraKind};

// -------------------------------------------------------------------------------------------------

#[derive(Debug)]
struct NativeInstrument {
    number: usize,
    name: &'static str,
    aux: &'static [AuxParameter],
    /// Instrument body. Must set `aMix` and may use `iAmp`, `iCps`, `iPan`.
    body: &'static str,
}

const NATIVE_INSTRUMENTS: [NativeInstrument; 10] = [
    NativeInstrument {
        number: 3,
        name: "sineDrone",
        aux: &[
            AuxParameter::new("vibrato depth, in frequency ratio", "c, .01"),
            AuxParameter::new("vibrato rate, in Hz", "ru, 4, 6"),
        ],
        body: "\
kEnv     linseg  0, p3*.1, iAmp, p3*.8, iAmp, p3*.1, 0
kVib     oscili  p7*iCps, p8, 1
aMix     oscili  kEnv, iCps+kVib, 1",
    },
    NativeInstrument {
        number: 4,
        name: "sineUnitEnvelope",
        aux: &[
            AuxParameter::new("attack, as proportion of sustain", "ru, .01, .2"),
            AuxParameter::new("release, as proportion of sustain", "ru, .1, .5"),
        ],
        body: "\
iAtk     =       p7*p3
iRel     =       p8*p3
kEnv     linen   iAmp, iAtk, p3, iRel
aMix     oscili  kEnv, iCps, 1",
    },
    NativeInstrument {
        number: 5,
        name: "sawtoothLowpass",
        aux: &[
            AuxParameter::new("lowpass cutoff start, in Hz", "ru, 500, 4000"),
            AuxParameter::new("lowpass cutoff end, in Hz", "c, 200"),
            AuxParameter::new("lowpass resonance, within unit interval", "c, .5"),
        ],
        body: "\
kEnv     linen   iAmp, .01, p3, .1
kCut     expon   p7, p3, p8
aSaw     vco2    1, iCps
aMix     moogladder aSaw*kEnv, kCut, p9",
    },
    NativeInstrument {
        number: 6,
        name: "noiseBandpass",
        aux: &[
            AuxParameter::new("bandpass center, in Hz", "ru, 200, 2000"),
            AuxParameter::new("bandpass width, in Hz", "c, 50"),
            AuxParameter::new("attack, in seconds", "c, .01"),
            AuxParameter::new("release, in seconds", "c, .2"),
        ],
        body: "\
kEnv     linen   iAmp, p9, p3, p10
aNoise   rand    1
aFilter  butterbp aNoise, p7, p8
aMix     =       aFilter*kEnv",
    },
    NativeInstrument {
        number: 11,
        name: "noiseSustain",
        aux: &[
            AuxParameter::new("lowpass cutoff, in Hz", "c, 2000"),
            AuxParameter::new("attack, in seconds", "c, .1"),
        ],
        body: "\
kEnv     linen   iAmp, p8, p3, .1
aNoise   rand    1
aMix     butterlp aNoise*kEnv, p7",
    },
    NativeInstrument {
        number: 13,
        name: "fmBasic",
        aux: &[
            AuxParameter::new("carrier frequency ratio", "c, 1"),
            AuxParameter::new("modulator frequency ratio", "c, 2"),
            AuxParameter::new("modulation index", "ru, 1, 5"),
        ],
        body: "\
kEnv     linen   iAmp, .02, p3, .2
kIndex   line    p9, p3, p9*.2
aMix     foscili kEnv, iCps, p7, p8, kIndex, 1",
    },
    NativeInstrument {
        number: 30,
        name: "pluckString",
        aux: &[
            AuxParameter::new("pluck position, within unit interval", "ru, .1, .5"),
            AuxParameter::new("pickup position, within unit interval", "c, .25"),
            AuxParameter::new("reflection coefficient, within unit interval", "c, .5"),
        ],
        body: "\
aPluck   wgpluck2 p7, iAmp, iCps, p8, p9
aMix     linen   aPluck, .005, p3, .05",
    },
    NativeInstrument {
        number: 31,
        name: "grainCloud",
        aux: &[
            AuxParameter::new("grain density, in grains per second", "ru, 10, 40"),
            AuxParameter::new("grain duration, in seconds", "c, .05"),
        ],
        body: "\
kEnv     linseg  0, p3*.5, iAmp, p3*.5, 0
aMix     grain   kEnv, iCps, p7, 0, iCps*.05, p8, 1, 2, p8",
    },
    NativeInstrument {
        number: 32,
        name: "additiveBell",
        aux: &[AuxParameter::new("partial frequency ratio", "c, 1.4")],
        body: "\
kEnv     expseg  iAmp, p3, iAmp*.001
aOne     oscili  kEnv, iCps, 1
aTwo     oscili  kEnv*.6, iCps*p7, 1
aThree   oscili  kEnv*.4, iCps*p7*p7, 1
aMix     =       (aOne+aTwo+aThree)*.5",
    },
    NativeInstrument {
        number: 40,
        name: "sineReverb",
        aux: &[
            AuxParameter::new("reverb time, in seconds", "c, 1.5"),
            AuxParameter::new("reverb mix, within unit interval", "c, .3"),
        ],
        body: "\
kEnv     linen   iAmp, .01, p3, .2
aDry     oscili  kEnv, iCps, 1
aWet     reverb  aDry, p7
aMix     =       aDry*(1-p8)+aWet*p8",
    },
];

fn native_instrument(number: usize) -> Option<&'static NativeInstrument> {
    NATIVE_INSTRUMENTS.iter().find(|i| i.number == number)
}

fn output_statement(channels: usize) -> &'static str {
    match channels {
        0 | 1 => "         out     aMix",
        2 => "         outs    aMix*sqrt(1-iPan), aMix*sqrt(iPan)",
        _ => "         outch   1, aMix*sqrt(1-iPan), 2, aMix*sqrt(iPan)",
    }
}

// -------------------------------------------------------------------------------------------------

/// The built-in Csound instruments. Amplitudes are written in decibels, pitches as `pch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsoundNative;

impl Orchestra for CsoundNative {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::CsoundNative
    }

    fn has_instrument(&self, instrument: usize) -> bool {
        native_instrument(instrument).is_some()
    }

    fn instruments(&self) -> Option<Vec<usize>> {
        Some(NATIVE_INSTRUMENTS.iter().map(|i| i.number).collect())
    }

    fn instrument_name(&self, instrument: usize) -> String {
        native_instrument(instrument)
            .map(|i| i.name.to_string())
            .unwrap_or_else(|| format!("unknown instrument {instrument}"))
    }

    fn aux_parameters(&self, instrument: usize, _count: Option<usize>) -> Vec<AuxParameter> {
        native_instrument(instrument)
            .map(|i| i.aux.to_vec())
            .unwrap_or_default()
    }

    fn post_map(&self, _instrument: usize, axis: Axis, value: f64, map_mode: bool) -> f64 {
        match axis {
            Axis::Amp => {
                let value = generic_post_map(axis, value, map_mode);
                if map_mode {
                    value * 90.0
                } else {
                    value
                }
            }
            Axis::Ps => ps_to_pch(value),
            Axis::Pan => generic_post_map(axis, value, map_mode),
        }
    }

    fn construct_orchestra(
        &self,
        channels: usize,
        sample_rate: u32,
        instruments: &[usize],
    ) -> Option<String> {
        let mut orc = String::new();
        let _ = writeln!(orc, "sr = {sample_rate}");
        let _ = writeln!(orc, "ksmps = 10");
        let _ = writeln!(orc, "nchnls = {}", channels.max(1));
        orc.push('\n');
        for instrument in NATIVE_INSTRUMENTS
            .iter()
            .filter(|i| instruments.is_empty() || instruments.contains(&i.number))
        {
            let _ = writeln!(orc, "instr {}", instrument.number);
            let _ = writeln!(orc, "; {}", instrument.name);
            let _ = writeln!(orc, "iAmp     =       ampdb(p4)");
            let _ = writeln!(orc, "iCps     =       cpspch(p5)");
            let _ = writeln!(orc, "iPan     =       p6");
            let _ = writeln!(orc, "{}", instrument.body);
            let _ = writeln!(orc, "{}", output_statement(channels));
            let _ = writeln!(orc, "endin");
            orc.push('\n');
        }
        Some(orc)
    }

    fn score_tables(&self) -> Option<String> {
        Some("f 1 0 16384 10 1\nf 2 0 8192 20 2\n".to_string())
    }
}

// -------------------------------------------------------------------------------------------------

/// Csound instruments defined outside of the crate. Any instrument number is valid, the number
/// of auxiliary parameters is declared by the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsoundExternal;

impl Orchestra for CsoundExternal {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::CsoundExternal
    }

    fn has_instrument(&self, _instrument: usize) -> bool {
        true
    }

    fn instrument_name(&self, _instrument: usize) -> String {
        "csoundExternal".to_string()
    }

    fn aux_parameters(&self, _instrument: usize, count: Option<usize>) -> Vec<AuxParameter> {
        vec![AuxParameter::new("unknown parameter", "c, 1"); count.unwrap_or(0)]
    }
}

// -------------------------------------------------------------------------------------------------

/// Instruments of the Silence csound front end: fixed auxiliary parameters, MIDI note
/// pitches and MIDI velocity amplitudes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsoundSilence;

const SILENCE_AUX: [AuxParameter; 4] = [
    AuxParameter::new("phase", "c, 1"),
    AuxParameter::new("y pan depth", "c, .5"),
    AuxParameter::new("z pan depth", "c, .5"),
    AuxParameter::new("mason index, pitch class set", "pr, mason"),
];

impl Orchestra for CsoundSilence {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::CsoundSilence
    }

    fn has_instrument(&self, _instrument: usize) -> bool {
        true
    }

    fn instrument_name(&self, _instrument: usize) -> String {
        "csoundSilence".to_string()
    }

    fn aux_parameters(&self, _instrument: usize, _count: Option<usize>) -> Vec<AuxParameter> {
        SILENCE_AUX.to_vec()
    }

    fn post_map(&self, _instrument: usize, axis: Axis, value: f64, _map_mode: bool) -> f64 {
        match axis {
            Axis::Amp => (value * 127.0).max(0.0),
            Axis::Ps => ps_to_midi_real(value),
            Axis::Pan => wrap_pan(value),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn native_instruments() {
        let orchestra = CsoundNative;
        assert!(orchestra.has_instrument(3));
        assert!(!orchestra.has_instrument(0));
        assert_eq!(orchestra.aux_parameters(6, None).len(), 4);
        assert_eq!(orchestra.instrument_name(13), "fmBasic");
        assert_eq!(orchestra.instruments().map(|i| i.len()), Some(10));
    }

    #[test]
    fn native_mapping() {
        let orchestra = CsoundNative;
        assert!((orchestra.post_map(3, Axis::Amp, 0.5, true) - 45.0).abs() < 1e-9);
        assert!((orchestra.post_map(3, Axis::Amp, 2.0, true) - 90.0).abs() < 1e-9);
        assert!((orchestra.post_map(3, Axis::Ps, 0.0, true) - 8.0).abs() < 1e-9);
        assert!((orchestra.post_map(3, Axis::Ps, 14.0, true) - 9.02).abs() < 1e-9);
    }

    #[test]
    fn orchestra_text() {
        let orc = CsoundNative
            .construct_orchestra(2, 44100, &[3, 40])
            .unwrap_or_default();
        assert!(orc.starts_with("sr = 44100\nksmps = 10\nnchnls = 2\n"));
        assert!(orc.contains("instr 3\n; sineDrone\n"));
        assert!(orc.contains("instr 40\n"));
        assert!(!orc.contains("instr 4\n"));
        assert_eq!(orc.matches("endin").count(), 2);
        assert!(orc.contains("outs    aMix"));
        let mono = CsoundNative
            .construct_orchestra(1, 48000, &[])
            .unwrap_or_default();
        assert_eq!(mono.matches("endin").count(), 10);
        assert!(mono.contains("out     aMix"));
    }

    #[test]
    fn external_and_silence() {
        assert_eq!(CsoundExternal.aux_parameters(1, Some(3)).len(), 3);
        assert!(CsoundExternal.aux_parameters(1, None).is_empty());
        assert_eq!(CsoundSilence.aux_parameters(1, None).len(), 4);
        assert!((CsoundSilence.post_map(1, Axis::Ps, 0.5, true) - 60.5).abs() < 1e-9);
        assert!((CsoundSilence.post_map(1, Axis::Amp, 0.5, true) - 63.5).abs() < 1e-9);
        assert!((CsoundSilence.post_map(1, Axis::Pan, -0.25, true) - 0.75).abs() < 1e-9);
    }
}
