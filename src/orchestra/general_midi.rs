//! General MIDI orchestras: the 128 melodic programs and the percussion key map.

use crate::pitch::ps_to_midi_real;

use super::{wrap_pan, Axis, AuxParameter, Orchestra, OrchestraKind};

// -------------------------------------------------------------------------------------------------

/// General MIDI program names, indexed by program number.
pub const PROGRAM_NAMES: [&str; 128] = [
    "acousticGrandPiano",
    "brightAcousticPiano",
    "electricGrandPiano",
    "honkyTonkPiano",
    "electricPiano1",
    "electricPiano2",
    "harpsichord",
    "clavinet",
    "celesta",
    "glockenspiel",
    "musicBox",
    "vibraphone",
    "marimba",
    "xylophone",
    "tubularBells",
    "dulcimer",
    "drawbarOrgan",
    "percussiveOrgan",
    "rockOrgan",
    "churchOrgan",
    "reedOrgan",
    "accordion",
    "harmonica",
    "tangoAccordion",
    "acousticGuitarNylon",
    "acousticGuitarSteel",
    "electricGuitarJazz",
    "electricGuitarClean",
    "electricGuitarMuted",
    "overdrivenGuitar",
    "distortionGuitar",
    "guitarHarmonics",
    "acousticBass",
    "electricBassFinger",
    "electricBassPick",
    "fretlessBass",
    "slapBass1",
    "slapBass2",
    "synthBass1",
    "synthBass2",
    "violin",
    "viola",
    "cello",
    "contrabass",
    "tremoloStrings",
    "pizzicatoStrings",
    "orchestralHarp",
    "timpani",
    "stringEnsemble1",
    "stringEnsemble2",
    "synthStrings1",
    "synthStrings2",
    "choirAahs",
    "voiceOohs",
    "synthVoice",
    "orchestraHit",
    "trumpet",
    "trombone",
    "tuba",
    "mutedTrumpet",
    "frenchHorn",
    "brassSection",
    "synthBrass1",
    "synthBrass2",
    "sopranoSax",
    "altoSax",
    "tenorSax",
    "baritoneSax",
    "oboe",
    "englishHorn",
    "bassoon",
    "clarinet",
    "piccolo",
    "flute",
    "recorder",
    "panFlute",
    "blownBottle",
    "shakuhachi",
    "whistle",
    "ocarina",
    "lead1Square",
    "lead2Sawtooth",
    "lead3Calliope",
    "lead4Chiff",
    "lead5Charang",
    "lead6Voice",
    "lead7Fifths",
    "lead8BassLead",
    "pad1NewAge",
    "pad2Warm",
    "pad3Polysynth",
    "pad4Choir",
    "pad5Bowed",
    "pad6Metallic",
    "pad7Halo",
    "pad8Sweep",
    "fx1Rain",
    "fx2Soundtrack",
    "fx3Crystal",
    "fx4Atmosphere",
    "fx5Brightness",
    "fx6Goblins",
    "fx7Echoes",
    "fx8SciFi",
    "sitar",
    "banjo",
    "shamisen",
    "koto",
    "kalimba",
    "bagpipe",
    "fiddle",
    "shanai",
    "tinkleBell",
    "agogo",
    "steelDrums",
    "woodblock",
    "taikoDrum",
    "melodicTom",
    "synthDrum",
    "reverseCymbal",
    "guitarFretNoise",
    "breathNoise",
    "seashore",
    "birdTweet",
    "telephoneRing",
    "helicopter",
    "applause",
    "gunshot",
];

/// General MIDI percussion key names, starting at key 35.
pub const PERCUSSION_NAMES: [&str; 47] = [
    "acousticBassDrum",
    "bassDrum1",
    "sideStick",
    "acousticSnare",
    "handClap",
    "electricSnare",
    "lowFloorTom",
    "closedHiHat",
    "highFloorTom",
    "pedalHiHat",
    "lowTom",
    "openHiHat",
    "lowMidTom",
    "hiMidTom",
    "crashCymbal1",
    "highTom",
    "rideCymbal1",
    "chineseCymbal",
    "rideBell",
    "tambourine",
    "splashCymbal",
    "cowbell",
    "crashCymbal2",
    "vibraslap",
    "rideCymbal2",
    "hiBongo",
    "lowBongo",
    "muteHiConga",
    "openHiConga",
    "lowConga",
    "highTimbale",
    "lowTimbale",
    "highAgogo",
    "lowAgogo",
    "cabasa",
    "maracas",
    "shortWhistle",
    "longWhistle",
    "shortGuiro",
    "longGuiro",
    "claves",
    "hiWoodBlock",
    "lowWoodBlock",
    "muteCuica",
    "openCuica",
    "muteTriangle",
    "openTriangle",
];

/// First percussion key number.
pub const PERCUSSION_OFFSET: usize = 35;

/// The percussion channel, counting channels from 1.
pub const PERCUSSION_CHANNEL: u8 = 10;

/// Look up a program number by name, case-insensitive.
pub fn program_number(name: &str) -> Option<u8> {
    let name = name.trim().to_ascii_lowercase();
    PROGRAM_NAMES
        .iter()
        .position(|n| n.to_ascii_lowercase() == name)
        .map(|p| p as u8)
}

fn midi_velocity(value: f64, map_mode: bool) -> f64 {
    let value = if map_mode { value * 127.0 } else { value };
    value.round().clamp(0.0, 127.0)
}

fn midi_pan(value: f64, map_mode: bool) -> f64 {
    let value = if map_mode {
        wrap_pan(value) * 127.0
    } else {
        value
    };
    value.round().clamp(0.0, 127.0)
}

fn midi_post_map(axis: Axis, value: f64, map_mode: bool) -> f64 {
    match axis {
        Axis::Amp => midi_velocity(value, map_mode),
        Axis::Ps => ps_to_midi_real(value).clamp(0.0, 127.0),
        Axis::Pan => midi_pan(value, map_mode),
    }
}

// -------------------------------------------------------------------------------------------------

/// General MIDI melodic programs. Instrument numbers are program numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralMidi;

impl Orchestra for GeneralMidi {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::GeneralMidi
    }

    fn has_instrument(&self, instrument: usize) -> bool {
        instrument < PROGRAM_NAMES.len()
    }

    fn instruments(&self) -> Option<Vec<usize>> {
        Some((0..PROGRAM_NAMES.len()).collect())
    }

    fn instrument_name(&self, instrument: usize) -> String {
        PROGRAM_NAMES
            .get(instrument)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("unknown program {instrument}"))
    }

    fn aux_parameters(&self, _instrument: usize, _count: Option<usize>) -> Vec<AuxParameter> {
        Vec::new()
    }

    fn default_midi_program(&self, instrument: usize) -> u8 {
        instrument.min(127) as u8
    }

    fn post_map(&self, _instrument: usize, axis: Axis, value: f64, map_mode: bool) -> f64 {
        midi_post_map(axis, value, map_mode)
    }
}

// -------------------------------------------------------------------------------------------------

/// General MIDI percussion. Instrument numbers are percussion keys and override the pitch.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralMidiPercussion;

impl Orchestra for GeneralMidiPercussion {
    fn kind(&self) -> OrchestraKind {
        OrchestraKind::GeneralMidiPercussion
    }

    fn has_instrument(&self, instrument: usize) -> bool {
        (PERCUSSION_OFFSET..PERCUSSION_OFFSET + PERCUSSION_NAMES.len()).contains(&instrument)
    }

    fn instruments(&self) -> Option<Vec<usize>> {
        Some((PERCUSSION_OFFSET..PERCUSSION_OFFSET + PERCUSSION_NAMES.len()).collect())
    }

    fn instrument_name(&self, instrument: usize) -> String {
        instrument
            .checked_sub(PERCUSSION_OFFSET)
            .and_then(|i| PERCUSSION_NAMES.get(i))
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("unknown percussion {instrument}"))
    }

    fn aux_parameters(&self, _instrument: usize, _count: Option<usize>) -> Vec<AuxParameter> {
        Vec::new()
    }

    fn midi_channel(&self) -> Option<u8> {
        Some(PERCUSSION_CHANNEL)
    }

    fn post_map(&self, instrument: usize, axis: Axis, value: f64, map_mode: bool) -> f64 {
        match axis {
            Axis::Ps => instrument as f64,
            _ => midi_post_map(axis, value, map_mode),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(GeneralMidi.instrument_name(0), "acousticGrandPiano");
        assert_eq!(GeneralMidi.instrument_name(127), "gunshot");
        assert_eq!(program_number("Violin"), Some(40));
        assert_eq!(GeneralMidiPercussion.instrument_name(35), "acousticBassDrum");
        assert_eq!(GeneralMidiPercussion.instrument_name(81), "openTriangle");
        assert!(!GeneralMidiPercussion.has_instrument(34));
        assert!(!GeneralMidiPercussion.has_instrument(82));
        assert_eq!(GeneralMidiPercussion.midi_channel(), Some(10));
    }

    #[test]
    fn mapping_ranges() {
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            let amp = GeneralMidi.post_map(0, Axis::Amp, x, true);
            let pan = GeneralMidi.post_map(0, Axis::Pan, x, true);
            assert!((0.0..=127.0).contains(&amp) && amp.fract() == 0.0);
            assert!((0.0..=127.0).contains(&pan) && pan.fract() == 0.0);
        }
        assert_eq!(GeneralMidi.post_map(0, Axis::Amp, 0.9, true), 114.0);
        assert_eq!(GeneralMidi.post_map(0, Axis::Ps, 100.0, true), 127.0);
        assert_eq!(GeneralMidi.post_map(0, Axis::Ps, -100.0, true), 0.0);
        assert_eq!(GeneralMidi.post_map(0, Axis::Ps, 1.5, true), 61.5);
        assert_eq!(GeneralMidiPercussion.post_map(38, Axis::Ps, 3.0, true), 38.0);
    }
}
