//! Micro tonal temperaments, applied as the last step of pitch realization.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{pitch, random::new_rand_gen};

// -------------------------------------------------------------------------------------------------

/// Available temperament kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperamentKind {
    TwelveEqual,
    Pythagorean,
    Just,
    MeanTone,
    Split24Upper,
    Split24Lower,
    Interleave24Even,
    Interleave24Odd,
    NoiseLight,
    NoiseMedium,
    NoiseHeavy,
    NoiseUser,
}

impl TemperamentKind {
    pub const ALL: [TemperamentKind; 12] = [
        Self::TwelveEqual,
        Self::Pythagorean,
        Self::Just,
        Self::MeanTone,
        Self::Split24Upper,
        Self::Split24Lower,
        Self::Interleave24Even,
        Self::Interleave24Odd,
        Self::NoiseLight,
        Self::NoiseMedium,
        Self::NoiseHeavy,
        Self::NoiseUser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TwelveEqual => "TwelveEqual",
            Self::Pythagorean => "Pythagorean",
            Self::Just => "Just",
            Self::MeanTone => "MeanTone",
            Self::Split24Upper => "Split24Upper",
            Self::Split24Lower => "Split24Lower",
            Self::Interleave24Even => "Interleave24Even",
            Self::Interleave24Odd => "Interleave24Odd",
            Self::NoiseLight => "NoiseLight",
            Self::NoiseMedium => "NoiseMedium",
            Self::NoiseHeavy => "NoiseHeavy",
            Self::NoiseUser => "NoiseUser",
        }
    }

    fn static_table(&self) -> Option<&'static [f64; 12]> {
        match self {
            Self::Pythagorean => Some(&PYTHAGOREAN),
            Self::Just => Some(&JUST),
            Self::MeanTone => Some(&MEAN_TONE),
            _ => None,
        }
    }

    fn max_noise(&self) -> Option<f64> {
        match self {
            Self::NoiseLight => Some(0.05),
            Self::NoiseMedium => Some(0.10),
            Self::NoiseHeavy => Some(0.15),
            Self::NoiseUser => Some(0.10),
            _ => None,
        }
    }
}

impl std::fmt::Display for TemperamentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

const PYTHAGOREAN: [f64; 12] = [
    0.00, 0.90, 2.04, 2.94, 4.08, 4.98, 6.00, 7.02, 7.92, 9.06, 9.96, 11.09,
];
const JUST: [f64; 12] = [
    0.00, 1.12, 2.04, 3.16, 3.86, 4.98, 6.00, 7.02, 8.14, 8.84, 10.18, 10.88,
];
const MEAN_TONE: [f64; 12] = [
    0.00, 1.17, 1.93, 3.10, 3.86, 5.03, 5.80, 6.97, 8.14, 8.90, 10.07, 10.83,
];

// -------------------------------------------------------------------------------------------------

/// A temperament maps a realized pitch space value to a tempered pitch space value.
///
/// Static temperaments replace the integer pitch class with a tuned value and keep the micro
/// tone part. Noise temperaments add a seeded uniform random offset.
#[derive(Debug, Clone)]
pub struct Temperament {
    kind: TemperamentKind,
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
}

impl Temperament {
    pub fn new(kind: TemperamentKind) -> Self {
        Self::with_seed(kind, 0)
    }

    pub fn with_seed(kind: TemperamentKind, seed: u64) -> Self {
        let rand_gen = new_rand_gen(seed);
        Self {
            kind,
            seed,
            rand_gen,
        }
    }

    pub fn kind(&self) -> TemperamentKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Restore the initial random state.
    pub fn reset(&mut self) {
        self.rand_gen = new_rand_gen(self.seed);
    }

    /// Temper the given pitch space value.
    pub fn apply(&mut self, ps: f64) -> f64 {
        let (oct, pc, micro) = pitch::split_ps_real(ps);
        let pc = pc as f64;
        let pc = match self.kind {
            TemperamentKind::TwelveEqual | TemperamentKind::Interleave24Even => pc,
            TemperamentKind::Split24Lower => pc * 0.5,
            TemperamentKind::Split24Upper => pc * 0.5 + 6.0,
            TemperamentKind::Interleave24Odd => pc + 0.5,
            kind => {
                if let Some(table) = kind.static_table() {
                    table[pc as usize % 12]
                } else if let Some(max_noise) = kind.max_noise() {
                    pc + self.rand_gen.random_range(-max_noise..=max_noise)
                } else {
                    pc
                }
            }
        };
        pitch::join_ps_real(oct, pc, micro)
    }
}

impl Default for Temperament {
    fn default() -> Self {
        Self::new(TemperamentKind::TwelveEqual)
    }
}

impl TryFrom<&str> for Temperament {
    type Error = String;

    fn try_from(name: &str) -> Result<Self, String> {
        TemperamentKind::ALL
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
            .map(|kind| Self::new(*kind))
            .ok_or_else(|| format!("unknown temperament '{name}'"))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn static_temperaments() -> Result<(), String> {
        let mut twelve = Temperament::default();
        assert_eq!(twelve.apply(13.25), 13.25);
        let mut pyth = Temperament::try_from("pythagorean")?;
        assert!((pyth.apply(13.0) - 12.9).abs() < 1e-9);
        let mut upper = Temperament::try_from("Split24Upper")?;
        assert_eq!(upper.apply(2.0), 7.0);
        let mut odd = Temperament::try_from("interleave24odd")?;
        assert_eq!(odd.apply(-12.0), -11.5);
        assert!(Temperament::try_from("foo").is_err());
        Ok(())
    }

    #[test]
    fn noise_temperaments() {
        let mut noise = Temperament::with_seed(TemperamentKind::NoiseLight, 12);
        let values = (0..20).map(|_| noise.apply(5.0)).collect::<Vec<_>>();
        assert!(values.iter().all(|v| (v - 5.0).abs() <= 0.05 + 1e-9));
        noise.reset();
        assert_eq!(noise.apply(5.0), values[0]);
    }
}
