//! Pulse triples: rhythm atoms of divisor, multiplier and accent, realized against a tempo.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// -------------------------------------------------------------------------------------------------

/// Duration strings as (divisor, multiplier) of a beat.
pub const DURATION_STRINGS: [(&str, (u32, u32)); 18] = [
    ("w", (1, 4)),
    ("h", (1, 2)),
    ("q", (1, 1)),
    ("e", (2, 1)),
    ("s", (4, 1)),
    ("t", (8, 1)),
    ("tw", (3, 8)),
    ("th", (3, 4)),
    ("tq", (3, 2)),
    ("te", (3, 1)),
    ("ts", (6, 1)),
    ("tt", (12, 1)),
    ("dw", (1, 6)),
    ("dh", (1, 3)),
    ("dq", (2, 3)),
    ("de", (4, 3)),
    ("ds", (8, 3)),
    ("dt", (16, 3)),
];

/// Dynamic strings with their lower and upper accent bounds.
pub const DYNAMIC_STRINGS: [(&str, (f64, f64)); 10] = [
    ("+", (1.0, 1.0)),
    ("fff", (0.95, 1.0)),
    ("ff", (0.9, 0.95)),
    ("f", (0.8, 0.9)),
    ("mf", (0.6, 0.8)),
    ("mp", (0.4, 0.6)),
    ("p", (0.3, 0.4)),
    ("pp", (0.15, 0.3)),
    ("ppp", (0.0001, 0.15)),
    ("o", (0.0, 0.0)),
];

/// Look up a duration string such as `q`, `te` or `dh`.
pub fn duration_string(name: &str) -> Option<(u32, u32)> {
    let name = name.trim().to_ascii_lowercase();
    DURATION_STRINGS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ratio)| *ratio)
}

/// Accent value of a dynamic string: the median of its accent range.
pub fn dynamic_to_accent(name: &str) -> Option<f64> {
    let name = name.trim().to_ascii_lowercase();
    DYNAMIC_STRINGS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, (min, max))| if min == max { *min } else { (min + max) * 0.5 })
}

/// Dynamic string for an accent value.
pub fn accent_to_dynamic(accent: f64) -> &'static str {
    if accent >= 0.9999 {
        return "+";
    } else if accent < 0.0001 {
        return "o";
    }
    let accent = (accent * 10000.0).round() / 10000.0;
    DYNAMIC_STRINGS
        .iter()
        .find(|(_, (min, max))| accent >= *min && accent < *max)
        .map(|(name, _)| *name)
        .unwrap_or("+")
}

/// Seconds per beat at the given tempo.
pub fn bpm_to_beat_time(bpm: f64) -> f64 {
    60.0 / bpm
}

/// Tempo of the given seconds per beat.
pub fn beat_time_to_bpm(beat_time: f64) -> f64 {
    60.0 / beat_time
}

// -------------------------------------------------------------------------------------------------

/// A rhythm atom: `multiplier / divisor` beats with an accent in the unit interval.
///
/// The sustain scalar relates the sounding time to the duration: below 1 the pulse is played
/// staccato, above 1 legato.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    divisor: f64,
    multiplier: f64,
    accent: f64,
    sustain: f64,
}

impl Pulse {
    /// Create a new pulse. Divisor and multiplier are taken as absolute values and must not be
    /// zero. The accent is limited to the unit interval.
    pub fn new(divisor: f64, multiplier: f64, accent: f64) -> Result<Self> {
        let (divisor, multiplier) = (divisor.abs(), multiplier.abs());
        if divisor == 0.0 || multiplier == 0.0 || !divisor.is_finite() || !multiplier.is_finite()
        {
            return Err(Error::PulseSyntax(format!(
                "invalid pulse divisor and multiplier: {divisor}, {multiplier}"
            )));
        }
        Ok(Self {
            divisor,
            multiplier,
            accent: accent.clamp(0.0, 1.0),
            sustain: 1.0,
        })
    }

    /// Create a pulse from one (accent), two (divisor, multiplier) or three values.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        match *values {
            [accent] => Self::new(1.0, 1.0, accent),
            [divisor, multiplier] => Self::new(divisor, multiplier, 1.0),
            [divisor, multiplier, accent, ..] => Self::new(divisor, multiplier, accent),
            [] => Err(Error::PulseSyntax("empty pulse".to_string())),
        }
    }

    #[must_use]
    pub fn with_sustain(mut self, sustain: f64) -> Self {
        self.sustain = sustain;
        self
    }

    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn accent(&self) -> f64 {
        self.accent
    }

    pub fn set_accent(&mut self, accent: f64) {
        self.accent = accent.clamp(0.0, 1.0);
    }

    pub fn sustain(&self) -> f64 {
        self.sustain
    }

    pub fn set_sustain(&mut self, sustain: f64) {
        self.sustain = sustain;
    }

    /// Duration in beats as exact ratio, when divisor and multiplier are integers.
    pub fn ratio(&self) -> Option<Rational64> {
        let (divisor, multiplier) = self.integer_parts()?;
        Some(Rational64::new(multiplier, divisor))
    }

    /// Duration in beats.
    pub fn beats(&self) -> f64 {
        self.multiplier / self.divisor
    }

    /// Duration, sustain and accent in seconds at the given tempo.
    pub fn seconds(&self, bpm: f64) -> (f64, f64, f64) {
        let dur = bpm_to_beat_time(bpm) / self.divisor * self.multiplier;
        (dur, dur * self.sustain, self.accent)
    }

    fn integer_parts(&self) -> Option<(i64, i64)> {
        if self.divisor.fract() == 0.0 && self.multiplier.fract() == 0.0 {
            Some((self.divisor as i64, self.multiplier as i64))
        } else {
            None
        }
    }

    fn integer_parts_or_err(&self) -> Result<(i64, i64)> {
        self.integer_parts().ok_or_else(|| {
            Error::PulseSyntax(format!("pulse {self} has non integer divisor or multiplier"))
        })
    }

    /// Scale the multiplier, changing the duration.
    pub fn scale(&mut self, value: u32) -> Result<()> {
        if value == 0 {
            return Err(Error::PulseSyntax("pulse scale must not be zero".to_string()));
        }
        self.multiplier *= value as f64;
        Ok(())
    }

    /// Raise divisor and multiplier to higher terms, keeping the duration.
    pub fn ratio_raise(&mut self, value: u32) -> Result<()> {
        if value == 0 {
            return Err(Error::PulseSyntax("pulse ratio must not be zero".to_string()));
        }
        self.divisor *= value as f64;
        self.multiplier *= value as f64;
        Ok(())
    }

    /// Raise to the given divisor, which must be a multiple of the current one.
    pub fn ratio_target(&mut self, divisor: u32) -> Result<()> {
        let (current, _) = self.integer_parts_or_err()?;
        if divisor == 0 || divisor as i64 % current != 0 {
            return Err(Error::PulseSyntax(format!(
                "target divisor {divisor} is not a multiple of {current}"
            )));
        }
        self.ratio_raise((divisor as i64 / current) as u32)
    }

    /// Split into two pulses of `numerator / denominator` and the remaining duration.
    pub fn fracture(&self, numerator: u32, denominator: u32) -> Result<(Pulse, Pulse)> {
        if denominator == 0 || numerator == 0 || numerator >= denominator {
            return Err(Error::PulseSyntax(format!(
                "invalid pulse fracture {numerator}/{denominator}"
            )));
        }
        let mut a = self.clone();
        let mut b = self.clone();
        a.divisor = self.divisor * denominator as f64;
        b.divisor = self.divisor * denominator as f64;
        a.multiplier = self.multiplier * numerator as f64;
        b.multiplier = self.multiplier * (denominator - numerator) as f64;
        Ok((a, b))
    }

    /// Split into two pulses whose multipliers sum to the current multiplier.
    pub fn cut(&self, multiplier: u32) -> Result<(Pulse, Pulse)> {
        if multiplier == 0 || multiplier as f64 >= self.multiplier {
            return Err(Error::PulseSyntax(format!(
                "cut multiplier {multiplier} must be below {}",
                self.multiplier
            )));
        }
        let mut a = self.clone();
        let mut b = self.clone();
        a.multiplier = multiplier as f64;
        b.multiplier = self.multiplier - multiplier as f64;
        Ok((a, b))
    }
}

/// Least common divisor of the given pulses, so they can be expressed in the same terms.
pub fn common_divisor(pulses: &[Pulse]) -> Result<u32> {
    let mut divisor = 1i64;
    for pulse in pulses {
        let (d, _) = pulse.integer_parts_or_err()?;
        divisor = lcm(divisor, d);
    }
    u32::try_from(divisor).map_err(|_| Error::PulseSyntax("divisor out of range".to_string()))
}

fn lcm(a: i64, b: i64) -> i64 {
    fn gcd(a: i64, b: i64) -> i64 {
        if b == 0 {
            a.abs()
        } else {
            gcd(b, a % b)
        }
    }
    if a == 0 || b == 0 {
        0
    } else {
        (a / gcd(a, b) * b).abs()
    }
}

impl TryFrom<&str> for Pulse {
    type Error = Error;

    /// Parses `"(3,1,1)"`, `"3,1"`, `"(4,1,mf)"`, duration strings like `"q"` or `"te"`,
    /// dynamic strings like `"ff"` or plain accent numbers.
    fn try_from(value: &str) -> Result<Self> {
        let text = value
            .trim()
            .trim_start_matches(['(', '['])
            .trim_end_matches([')', ']'])
            .trim()
            .to_ascii_lowercase();
        if text.is_empty() {
            return Err(Error::PulseSyntax(format!("empty pulse '{value}'")));
        }
        if let Some((divisor, multiplier)) = duration_string(&text) {
            return Self::new(divisor as f64, multiplier as f64, 1.0);
        }
        let values = text
            .split(',')
            .map(|part| {
                let part = part.trim();
                dynamic_to_accent(part)
                    .or_else(|| part.parse::<f64>().ok())
                    .ok_or_else(|| Error::PulseSyntax(format!("invalid pulse '{value}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_values(&values)
    }
}

impl std::fmt::Display for Pulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{})",
            self.divisor,
            self.multiplier,
            accent_to_dynamic(self.accent)
        )
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse() -> Result<()> {
        assert_eq!(Pulse::try_from("(3,1,1)")?, Pulse::new(3.0, 1.0, 1.0)?);
        assert_eq!(Pulse::try_from("3,1")?, Pulse::new(3.0, 1.0, 1.0)?);
        assert_eq!(Pulse::try_from("[4, 1, 0]")?.accent(), 0.0);
        assert!((Pulse::try_from("(4,1,mf)")?.accent() - 0.7).abs() < 1e-9);
        assert_eq!(Pulse::try_from("te")?, Pulse::new(3.0, 1.0, 1.0)?);
        assert_eq!(Pulse::try_from("dq")?, Pulse::new(2.0, 3.0, 1.0)?);
        assert!((Pulse::try_from("pp")?.accent() - 0.225).abs() < 1e-9);
        assert!(Pulse::try_from("(0,1,1)").is_err());
        assert!(Pulse::try_from("xyz").is_err());
        assert_eq!(Pulse::try_from("(3,1,1)")?.to_string(), "(3,1,+)");
        assert_eq!(Pulse::try_from("(3,2,.5)")?.to_string(), "(3,2,mp)");
        Ok(())
    }

    #[test]
    fn seconds() -> Result<()> {
        let pulse = Pulse::new(4.0, 1.0, 1.0)?;
        assert_eq!(pulse.seconds(120.0), (0.125, 0.125, 1.0));
        let pulse = Pulse::new(1.0, 3.0, 0.5)?.with_sustain(0.5);
        assert_eq!(pulse.seconds(60.0), (3.0, 1.5, 0.5));
        assert_eq!(pulse.ratio(), Some(Rational64::new(3, 1)));
        Ok(())
    }

    #[test]
    fn arithmetic() -> Result<()> {
        let mut pulse = Pulse::new(3.0, 2.0, 1.0)?;
        pulse.ratio_raise(2)?;
        assert_eq!((pulse.divisor(), pulse.multiplier()), (6.0, 4.0));
        pulse.ratio_target(12)?;
        assert_eq!((pulse.divisor(), pulse.multiplier()), (12.0, 8.0));
        assert!(pulse.ratio_target(18).is_err());

        let (a, b) = Pulse::new(2.0, 1.0, 1.0)?.fracture(4, 5)?;
        assert_eq!((a.divisor(), a.multiplier()), (10.0, 4.0));
        assert_eq!((b.divisor(), b.multiplier()), (10.0, 1.0));

        let (a, b) = Pulse::new(2.0, 5.0, 1.0)?.cut(2)?;
        assert_eq!((a.multiplier(), b.multiplier()), (2.0, 3.0));
        assert!(Pulse::new(2.0, 1.0, 1.0)?.cut(2).is_err());

        let pulses = vec![Pulse::new(3.0, 1.0, 1.0)?, Pulse::new(4.0, 1.0, 1.0)?];
        assert_eq!(common_divisor(&pulses)?, 12);
        Ok(())
    }
}
