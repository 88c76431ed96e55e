//! Rhythms evolved with a genetic algorithm.

use crate::{
    error::{Error, Result},
    genetic::{Gene, GeneticAlgorithm, Genome},
    parameter::{Args, RefDict, Rhythm, RhythmValue},
    pulse::Pulse,
    selector::{Selector, SelectorKind},
};

// -------------------------------------------------------------------------------------------------

/// Chooses from the pulses of the distinct best rhythms of all generations of a genetic
/// algorithm, which evolves rhythms towards the duration of a source rhythm.
#[derive(Debug, Clone)]
pub struct GaRhythm {
    selector: Selector<Pulse>,
}

impl GaRhythm {
    const GENERATIONS: usize = 40;

    pub fn from_args(args: &Args) -> Result<Self> {
        let source = args
            .pulses(0)?
            .iter()
            .map(Self::gene)
            .collect::<Result<Vec<_>>>()?;
        let crossover = args.number(1)?;
        let mutation = args.number(2)?;
        let elitism = args.number(3)?;
        let kind = args.option::<SelectorKind>(4)?;
        let population = args.count(5)?;
        let ga = GeneticAlgorithm::new(
            source.clone(),
            population,
            1.0,
            crossover,
            mutation,
            args.seed(),
        )?;
        let mut rhythms = Genome::new(ga, elitism).evolve(Self::GENERATIONS);
        if rhythms.is_empty() {
            rhythms.push(source);
        }
        let pulses = rhythms
            .iter()
            .flatten()
            .map(|gene| {
                let accent = if gene.note { 1.0 } else { 0.0 };
                Pulse::new(gene.divisor as f64, gene.multiplier as f64, accent)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            selector: Selector::new(pulses, kind, args.seed())?,
        })
    }

    fn gene(pulse: &Pulse) -> Result<Gene> {
        let (divisor, multiplier) = (pulse.divisor(), pulse.multiplier());
        if divisor.fract() != 0.0 || multiplier.fract() != 0.0 {
            return Err(Error::ParameterObjectSyntax(format!(
                "gaRhythm: pulse {pulse} needs an integer divisor and multiplier"
            )));
        }
        Ok(Gene::new(
            divisor as u32,
            multiplier as u32,
            pulse.accent() > 0.0,
        ))
    }
}

impl Rhythm for GaRhythm {
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::parameter::RhythmObject;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "((3, 1, 1), (3, 1, 1), (6, 1, 1), (6, 3, 1), (3, 1, 0))";

    #[test]
    fn evolve() -> Result<()> {
        let mut rhythm = RhythmObject::parse(&format!("gr, {SOURCE}, .7, .06, .01, oc, 20"), 5)?;
        let context = RefDict::with_bpm(60.0);
        let values = (0..40)
            .map(|i| rhythm.value(i as f64, &context))
            .collect::<Vec<_>>();
        assert!(values.iter().all(|v| v.dur > 0.0 && (v.acc == 0.0 || v.acc == 1.0)));
        // same seed, same rhythms
        let mut other = RhythmObject::parse(&format!("gr, {SOURCE}, .7, .06, .01, oc, 20"), 5)?;
        let other_values = (0..40)
            .map(|i| other.value(i as f64, &context))
            .collect::<Vec<_>>();
        assert_eq!(values, other_values);
        Ok(())
    }

    #[test]
    fn invalid_sources() {
        assert!(RhythmObject::parse("gr, ((2.5, 1, 1)), .7, .06, .01, oc, 20", 1).is_err());
        assert!(RhythmObject::parse(&format!("gr, {SOURCE}, .7, .06, .01, oc, 1"), 1).is_err());
    }
}
