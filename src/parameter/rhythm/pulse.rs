//! Pulse based rhythms and rhythms in seconds.

use crate::{
    error::{Error, Result},
    parameter::{Args, GeneratorObject, RefDict, Rhythm, RhythmValue},
    pulse::Pulse,
    selector::{Selector, SelectorKind},
};

use super::{accent_value, fallback_value};

// -------------------------------------------------------------------------------------------------

/// Pulses from generated divisors, multipliers, accents and sustain scalars.
#[derive(Debug, Clone)]
pub struct PulseTriple {
    divisor: GeneratorObject,
    multiplier: GeneratorObject,
    accent: GeneratorObject,
    sustain: GeneratorObject,
}

impl PulseTriple {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            divisor: args.generator(0)?,
            multiplier: args.generator(1)?,
            accent: args.generator(2)?,
            sustain: args.generator(3)?,
        })
    }
}

impl Rhythm for PulseTriple {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        let divisor = self.divisor.number(t, context);
        let multiplier = self.multiplier.number(t, context);
        let accent = accent_value(&self.accent.value(t, context));
        let sustain = self.sustain.number(t, context).max(0.0);
        match Pulse::new(divisor, multiplier, accent) {
            Ok(pulse) => RhythmValue::from_pulse(&pulse.with_sustain(sustain), context.bpm),
            Err(err) => {
                log::warn!("pulseTriple: {err} at time {t}, using one beat");
                fallback_value(context)
            }
        }
    }

    fn reset(&mut self) {
        self.divisor.reset();
        self.multiplier.reset();
        self.accent.reset();
        self.sustain.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from a list of pulses with a selector.
#[derive(Debug, Clone)]
pub struct Loop {
    selector: Selector<Pulse>,
}

impl Loop {
    const SUSTAIN: f64 = 0.94;

    pub fn from_args(args: &Args) -> Result<Self> {
        let pulses = args
            .pulses(0)?
            .into_iter()
            .map(|pulse| pulse.with_sustain(Self::SUSTAIN))
            .collect();
        let kind = args.option::<SelectorKind>(1)?;
        Ok(Self {
            selector: Selector::new(pulses, kind, args.seed())?,
        })
    }
}

impl Rhythm for Loop {
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

/// Plays the second of two pulses on the first pitch of each multiset, else the first one.
/// Accented pulses are played louder and more legato.
#[derive(Debug, Clone)]
pub struct BinaryAccent {
    normal: Pulse,
    accented: Pulse,
}

impl BinaryAccent {
    const SUSTAIN: f64 = 1.4;
    const ACCENT_SUSTAIN: f64 = 1.6;
    const ACCENT_AMP: f64 = 1.08;

    pub fn from_args(args: &Args) -> Result<Self> {
        match args.pulses(0)?.as_slice() {
            [normal, accented] => Ok(Self {
                normal: normal.clone().with_sustain(Self::SUSTAIN),
                accented: accented.clone().with_sustain(Self::ACCENT_SUSTAIN),
            }),
            pulses => Err(Error::ParameterObjectSyntax(format!(
                "binaryAccent: expected two pulses, got {}",
                pulses.len()
            ))),
        }
    }

    fn is_set_root(context: &RefDict) -> bool {
        let root = context
            .multiset
            .as_ref()
            .and_then(|multiset| multiset.pitches().first().copied());
        match (root, context.ps_raw) {
            (Some(root), Some(ps)) => (root - ps).abs() < 1e-9,
            _ => false,
        }
    }
}

impl Rhythm for BinaryAccent {
    fn value(&mut self, _t: f64, context: &RefDict) -> RhythmValue {
        if Self::is_set_root(context) {
            let mut value = RhythmValue::from_pulse(&self.accented, context.bpm);
            value.acc *= Self::ACCENT_AMP;
            value
        } else {
            RhythmValue::from_pulse(&self.normal, context.bpm)
        }
    }

    fn reset(&mut self) {}

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Durations in seconds from a generator.
#[derive(Debug, Clone)]
pub struct ConvertSecond {
    duration: GeneratorObject,
}

impl ConvertSecond {
    const SUSTAIN: f64 = 0.999;

    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            duration: args.generator(0)?,
        })
    }
}

impl Rhythm for ConvertSecond {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        let dur = self.duration.number(t, context).abs();
        RhythmValue::new(dur, dur * Self::SUSTAIN, 1.0)
    }

    fn reset(&mut self) {
        self.duration.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

/// Durations, sustains and accents in seconds from independent generators.
#[derive(Debug, Clone)]
pub struct ConvertSecondTriple {
    duration: GeneratorObject,
    sustain: GeneratorObject,
    accent: GeneratorObject,
}

impl ConvertSecondTriple {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            duration: args.generator(0)?,
            sustain: args.generator(1)?,
            accent: args.generator(2)?,
        })
    }
}

impl Rhythm for ConvertSecondTriple {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        let dur = self.duration.number(t, context).abs();
        let sus = self.sustain.number(t, context).abs();
        let acc = accent_value(&self.accent.value(t, context)).clamp(0.0, 1.0);
        RhythmValue::new(dur, sus, acc)
    }

    fn reset(&mut self) {
        self.duration.reset();
        self.sustain.reset();
        self.accent.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{multiset::Multiset, parameter::RhythmObject};
    use pretty_assertions::assert_eq;

    fn triples(input: &str, count: usize, context: &RefDict) -> Result<Vec<(f64, f64, f64)>> {
        let mut rhythm = RhythmObject::parse(input, 1)?;
        Ok((0..count)
            .map(|i| {
                let value = rhythm.value(i as f64, context);
                let round = |v: f64| (v * 1e6).round() / 1e6;
                (round(value.dur), round(value.sus), round(value.acc))
            })
            .collect())
    }

    #[test]
    fn pulse_triple() -> Result<()> {
        let context = RefDict::with_bpm(60.0);
        assert_eq!(
            triples("pt, (bg, oc, (4, 2)), 1, (bg, oc, (1, 0))", 2, &context)?,
            vec![(0.25, 0.25, 1.0), (0.5, 0.5, 0.0)]
        );
        assert_eq!(
            triples("pt, 2, 3, (bg, oc, (mf)), .5", 1, &context)?,
            vec![(1.5, 0.75, 0.7)]
        );
        // zero divisors fall back to a beat
        assert_eq!(triples("pt, 0, 1, 1", 1, &context)?, vec![(1.0, 1.0, 1.0)]);
        Ok(())
    }

    #[test]
    fn loops() -> Result<()> {
        let context = RefDict::with_bpm(120.0);
        assert_eq!(
            triples("l, ((2, 1, 1), (1, 1, 0)), oc", 3, &context)?,
            vec![(0.25, 0.235, 1.0), (0.5, 0.47, 0.0), (0.25, 0.235, 1.0)]
        );
        assert!(RhythmObject::parse("l, (), oc", 1).is_err());
        Ok(())
    }

    #[test]
    fn binary_accent() -> Result<()> {
        let mut rhythm = RhythmObject::parse("ba, ((1, 1, 1), (1, 2, 1))", 1)?;
        let mut context = RefDict::with_bpm(60.0);
        context.multiset = Some(Multiset::from_pitches(vec![2.0, 5.0])?);
        context.ps_raw = Some(5.0);
        let normal = rhythm.value(0.0, &context);
        assert_eq!((normal.dur, normal.acc), (1.0, 1.0));
        assert!((normal.sus - 1.4).abs() < 1e-9);
        context.ps_raw = Some(2.0);
        let accented = rhythm.value(1.0, &context);
        assert_eq!((accented.dur, accented.acc), (2.0, 1.08));
        assert!((accented.sus - 3.2).abs() < 1e-9);
        assert!(RhythmObject::parse("ba, ((1, 1, 1))", 1).is_err());
        Ok(())
    }

    #[test]
    fn seconds() -> Result<()> {
        let context = RefDict::default();
        assert_eq!(triples("cs, 2", 1, &context)?, vec![(2.0, 1.998, 1.0)]);
        assert_eq!(triples("cst, 2, 1, 0", 1, &context)?, vec![(2.0, 1.0, 0.0)]);
        Ok(())
    }
}
