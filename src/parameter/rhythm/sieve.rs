//! Rhythms from binary sieve segments.

use crate::{
    error::{Error, Result},
    parameter::{
        generator::series::{checked_length, parse_sieve},
        Args, RefDict, Rhythm, RhythmObject, RhythmValue,
    },
    pulse::Pulse,
    selector::{Selector, SelectorKind},
    sieve::Sieve,
};

// -------------------------------------------------------------------------------------------------

/// Sounding (true) and silent (false) positions of a sieve within `0..length`.
fn binary_segment(sieve: &Sieve, length: usize) -> Vec<bool> {
    let z = (0..length as i64).collect::<Vec<_>>();
    let points = sieve.segment_int(0, Some(&z));
    z.iter().map(|i| points.contains(i)).collect()
}

// -------------------------------------------------------------------------------------------------

/// How sounding sieve points are articulated in a [`PulseSieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Articulation {
    /// Each sieve point is a separate pulse.
    Attack,
    /// Sounding pulses sustain through all following rests.
    Sustain,
}

impl TryFrom<&str> for Articulation {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "attack" | "a" => Ok(Self::Attack),
            "sustain" | "s" => Ok(Self::Sustain),
            _ => Err(format!(
                "invalid articulation '{value}', expected 'attack' or 'sustain'"
            )),
        }
    }
}

/// Sounding pulses at sieve points, rests elsewhere.
#[derive(Debug, Clone)]
pub struct PulseSieve {
    selector: Selector<Pulse>,
}

impl PulseSieve {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sieve = parse_sieve(args, 0)?;
        let bits = binary_segment(&sieve, checked_length(args, 1)?);
        let pulse = args.pulse(2)?;
        let kind = args.option::<SelectorKind>(3)?;
        let pulses = match args.option::<Articulation>(4)? {
            Articulation::Attack => Self::attack_pulses(&bits, &pulse),
            Articulation::Sustain => Self::sustain_pulses(&bits, &pulse)?,
        };
        Ok(Self {
            selector: Selector::new(pulses, kind, args.seed())?,
        })
    }

    fn attack_pulses(bits: &[bool], pulse: &Pulse) -> Vec<Pulse> {
        bits.iter()
            .map(|sounding| {
                let mut pulse = pulse.clone();
                if !sounding {
                    pulse.set_accent(0.0);
                }
                pulse
            })
            .collect()
    }

    fn sustain_pulses(bits: &[bool], pulse: &Pulse) -> Result<Vec<Pulse>> {
        let mut pulses: Vec<Pulse> = Vec::new();
        let mut sounding = false;
        for bit in bits {
            if *bit {
                pulses.push(pulse.clone());
                sounding = true;
            } else if let (true, Some(last)) = (sounding, pulses.last_mut()) {
                *last = Pulse::new(
                    last.divisor(),
                    last.multiplier() + pulse.multiplier(),
                    last.accent(),
                )?
                .with_sustain(pulse.sustain());
            } else {
                let mut rest = pulse.clone();
                rest.set_accent(0.0);
                pulses.push(rest);
            }
        }
        if pulses.is_empty() {
            return Err(Error::ParameterObjectSyntax(
                "pulseSieve: empty sieve segment".to_string(),
            ));
        }
        Ok(pulses)
    }
}

impl Rhythm for PulseSieve {
    fn value(&mut self, _t: f64, context: &RefDict) -> RhythmValue {
        RhythmValue::from_pulse(&self.selector.next(), context.bpm)
    }

    fn reset(&mut self) {
        self.selector.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Values of a rhythm, muted where the selected sieve position has no point.
#[derive(Debug, Clone)]
pub struct RhythmSieve {
    selector: Selector<bool>,
    rhythm: RhythmObject,
}

impl RhythmSieve {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sieve = parse_sieve(args, 0)?;
        let bits = binary_segment(&sieve, checked_length(args, 1)?);
        let kind = args.option::<SelectorKind>(2)?;
        Ok(Self {
            selector: Selector::new(bits, kind, args.seed())?,
            rhythm: args.rhythm(3)?,
        })
    }
}

impl Rhythm for RhythmSieve {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        let mut value = self.rhythm.value(t, context);
        if !self.selector.next() {
            value.acc = 0.0;
        }
        value
    }

    fn reset(&mut self) {
        self.selector.reset();
        self.rhythm.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(input: &str, count: usize) -> Result<Vec<(f64, f64)>> {
        let mut rhythm = RhythmObject::parse(input, 1)?;
        let context = RefDict::with_bpm(60.0);
        Ok((0..count)
            .map(|i| {
                let value = rhythm.value(i as f64, &context);
                (value.dur, value.acc)
            })
            .collect())
    }

    #[test]
    fn binary() -> Result<()> {
        let sieve = Sieve::try_from("3@0|4@1")?;
        assert_eq!(
            binary_segment(&sieve, 6),
            vec![true, true, false, true, false, true]
        );
        Ok(())
    }

    #[test]
    fn pulse_sieve() -> Result<()> {
        assert_eq!(
            values("ps, 3@0, 6, (1, 1, 1), oc, a", 4)?,
            vec![(1.0, 1.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0)]
        );
        assert_eq!(
            values("ps, 3@0, 6, (2, 1, 1), oc, s", 3)?,
            vec![(1.5, 1.0), (1.5, 1.0), (1.5, 1.0)]
        );
        assert_eq!(
            values("ps, 3@1, 4, (1, 1, 1), oc, s", 2)?,
            vec![(1.0, 0.0), (3.0, 1.0)]
        );
        assert!(RhythmObject::parse("ps, 3@0, 6, (1, 1, 1), oc, x", 1).is_err());
        Ok(())
    }

    #[test]
    fn rhythm_sieve() -> Result<()> {
        assert_eq!(
            values("rs, 2@0, 4, oc, (l, ((1, 1, 1), (2, 1, 1)), oc)", 4)?,
            vec![(1.0, 1.0), (0.5, 0.0), (1.0, 1.0), (0.5, 0.0)]
        );
        Ok(())
    }
}
