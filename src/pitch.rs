//! Pitch space conversions.
//!
//! Pitch space (`ps`) counts semitones from middle C (C4, MIDI note 60, Csound pch 8.00).
//! Pitch space values are reals: fractional parts are micro tones and are preserved through
//! all octave splits.

use crate::{
    error::{Error, Result},
    temperament::Temperament,
};

// -------------------------------------------------------------------------------------------------

const PC_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// -------------------------------------------------------------------------------------------------

/// Split a pitch space value into an octave offset and a pitch space value within 0..12.
pub fn split_oct_ps(ps: f64) -> (i64, f64) {
    let oct = (ps / 12.0).floor();
    (oct as i64, ps - oct * 12.0)
}

/// Split a pitch space value into octave, integer pitch class and micro tone fraction.
pub fn split_ps_real(ps: f64) -> (i64, i64, f64) {
    let (oct, ps_real) = split_oct_ps(ps);
    let pc = ps_real.floor();
    (oct, pc as i64, ps_real - pc)
}

/// Inverse of [`split_ps_real`]. The pitch class may exceed 0..12.
pub fn join_ps_real(oct: i64, pc: f64, micro: f64) -> f64 {
    (oct * 12) as f64 + pc + micro
}

// -------------------------------------------------------------------------------------------------

/// Pitch space to a rounded MIDI note number, limited to 0..=127.
pub fn ps_to_midi(ps: f64) -> u8 {
    (60.0 + ps).round().clamp(0.0, 127.0) as u8
}

/// Pitch space to a MIDI note number keeping micro tones and without limiting.
pub fn ps_to_midi_real(ps: f64) -> f64 {
    60.0 + ps
}

pub fn midi_to_ps(midi: f64) -> f64 {
    midi - 60.0
}

/// Pitch space to frequency in Hz: A4 (ps 9) is 440 Hz.
pub fn ps_to_fq(ps: f64) -> f64 {
    let fq = 440.0 * 2f64.powf((ps - 9.0) / 12.0);
    if fq.is_finite() {
        fq
    } else {
        0.0
    }
}

/// Frequency in Hz to pitch space. Non positive frequencies map to ps 0.
pub fn fq_to_ps(fq: f64) -> f64 {
    if fq <= 0.0 {
        return 0.0;
    }
    12.0 * (fq / 440.0).log2() + 9.0
}

/// Pitch space to a Csound `octave.pc` value, where 8.00 is middle C.
pub fn ps_to_pch(ps: f64) -> f64 {
    let (oct, pc, micro) = split_ps_real(ps);
    let micro = (micro * 1e6).round() / 1e6;
    (oct + 8) as f64 + (pc as f64 + micro) / 100.0
}

/// Csound `octave.pc` value to pitch space.
pub fn pch_to_ps(pch: f64) -> f64 {
    let oct = pch.trunc();
    let pc_micro = ((pch - oct) * 100.0 * 1e6).round() / 1e6;
    (oct - 8.0) * 12.0 + pc_micro
}

/// Pitch space to a note name with an octave, rounding micro tones to quarter tones.
/// Quarter tones are marked with `~`: ps 0.5 is `C~4`.
pub fn ps_to_note_name(ps: f64) -> String {
    let (oct, pc, micro) = split_ps_real(ps);
    let (quarter, offset) = if micro < 0.25 {
        ("", 0)
    } else if micro < 0.75 {
        ("~", 0)
    } else {
        ("", 1)
    };
    let oct_offset = if pc + offset > 11 { 1 } else { 0 };
    let name = PC_NAMES[((pc + offset) % 12) as usize];
    format!("{}{}{}", name, quarter, oct + oct_offset + 4)
}

/// Parse a note name into pitch space.
///
/// Supported notation: a diatonic letter, any number of sharps (`#`) or flats (`b`, `$`),
/// quarter tone raises (`~`), an optional, possibly negative, octave number (defaults to 4)
/// and an optional trailing cent offset such as `a4+25` or `c4-10`.
pub fn ps_name_to_ps(name: &str) -> Result<f64> {
    let lower = name.trim().to_ascii_lowercase();
    let mut chars = lower.chars().peekable();
    let base = match chars.next() {
        Some('c') => 0.0,
        Some('d') => 2.0,
        Some('e') => 4.0,
        Some('f') => 5.0,
        Some('g') => 7.0,
        Some('a') => 9.0,
        Some('b') => 11.0,
        _ => {
            return Err(Error::PitchSyntax(format!(
                "invalid pitch name '{name}'"
            )))
        }
    };
    let mut ps = base;
    while let Some(c) = chars.peek() {
        match c {
            '#' => ps += 1.0,
            'b' | '$' => ps -= 1.0,
            '~' => ps += 0.5,
            _ => break,
        }
        chars.next();
    }
    let rest = chars.collect::<String>();
    let (octave_str, cent_str) = split_octave_and_cents(&rest);
    let octave = if octave_str.is_empty() {
        4
    } else {
        octave_str.parse::<i64>().map_err(|_| {
            Error::PitchSyntax(format!("invalid octave in pitch name '{name}'"))
        })?
    };
    let cents = if cent_str.is_empty() {
        0.0
    } else {
        cent_str.parse::<f64>().map_err(|_| {
            Error::PitchSyntax(format!("invalid cent offset in pitch name '{name}'"))
        })?
    };
    Ok(ps + ((octave - 4) * 12) as f64 + cents / 100.0)
}

fn split_octave_and_cents(rest: &str) -> (&str, &str) {
    // a leading minus belongs to the octave, any later sign starts the cent offset
    let sign_pos = rest
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i)
        .or_else(|| rest.starts_with('+').then_some(0));
    match sign_pos {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    }
}

/// Realize a pitch: shift by octaves and a transposition, then apply a temperament.
pub fn ps_to_tempered(
    ps: f64,
    oct_shift: f64,
    temperament: Option<&mut Temperament>,
    transposition: f64,
) -> f64 {
    let ps = oct_shift * 12.0 + transposition + ps;
    match temperament {
        Some(temperament) => temperament.apply(ps),
        None => ps,
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits() {
        assert_eq!(split_oct_ps(23.0), (1, 11.0));
        assert_eq!(split_oct_ps(-1.0), (-1, 11.0));
        let (oct, pc, micro) = split_ps_real(6.25);
        assert_eq!((oct, pc), (0, 6));
        assert!((micro - 0.25).abs() < 1e-9);
        assert!((join_ps_real(4, 3.0, 0.018) - 51.018).abs() < 1e-9);
    }

    #[test]
    fn conversions() {
        assert_eq!(ps_to_midi(0.0), 60);
        assert_eq!(ps_to_midi(100.0), 127);
        assert_eq!(ps_to_midi(-100.0), 0);
        assert!((ps_to_fq(9.0) - 440.0).abs() < 1e-9);
        assert!((ps_to_fq(0.0) - 261.6255653).abs() < 1e-6);
        assert!((fq_to_ps(440.0) - 9.0).abs() < 1e-9);
        assert!((ps_to_pch(0.0) - 8.0).abs() < 1e-9);
        assert!((ps_to_pch(-1.0) - 7.11).abs() < 1e-9);
        assert!((pch_to_ps(7.11) + 1.0).abs() < 1e-9);
        assert!((pch_to_ps(9.02) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn note_names() -> Result<()> {
        assert_eq!(ps_to_note_name(0.5), "C~4");
        assert_eq!(ps_to_note_name(10.0), "A#4");
        assert_eq!(ps_to_note_name(-1.0), "B3");
        assert_eq!(ps_to_note_name(11.8), "C5");
        assert_eq!(ps_name_to_ps("C4")?, 0.0);
        assert_eq!(ps_name_to_ps("c#")?, 1.0);
        assert_eq!(ps_name_to_ps("bb3")?, -2.0);
        assert_eq!(ps_name_to_ps("d-2")?, 2.0 - 72.0);
        assert_eq!(ps_name_to_ps("c~5")?, 12.5);
        assert!((ps_name_to_ps("a4+25")? - 9.25).abs() < 1e-9);
        assert!(ps_name_to_ps("x4").is_err());
        assert!(ps_name_to_ps("c4+x").is_err());
        Ok(())
    }

    #[test]
    fn tempered() {
        assert_eq!(ps_to_tempered(1.0, 1.0, None, 2.0), 15.0);
        let mut just = Temperament::try_from("just").unwrap();
        assert!((ps_to_tempered(4.0, 0.0, Some(&mut just), 0.0) - 3.86).abs() < 1e-9);
    }
}
