//! Markov chain rhythms.

use crate::{
    error::{Error, Result},
    markov::Transition,
    parameter::{generator::generative::MarkovWalk, Args, GeneratorObject, RefDict, Rhythm,
        RhythmObject, RhythmValue},
    pulse::Pulse,
};

use super::fallback_value;

// -------------------------------------------------------------------------------------------------

/// Pulses of a Markov chain with a dynamic order.
#[derive(Debug, Clone)]
pub struct MarkovPulse {
    walk: MarkovWalk,
    order: GeneratorObject,
}

impl MarkovPulse {
    pub fn from_args(args: &Args) -> Result<Self> {
        let transition = Transition::try_from(args.string(0)?)
            .map_err(|err| err.with_context("markovPulse"))?;
        for value in transition.values() {
            Pulse::try_from(value).map_err(|err| err.with_context("markovPulse"))?;
        }
        Ok(Self {
            walk: MarkovWalk::new(transition, args.seed()),
            order: args.generator(1)?,
        })
    }
}

impl Rhythm for MarkovPulse {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        let order = self.order.number(t, context);
        let pulse = self
            .walk
            .next(order, "markovPulse", t)
            .and_then(|value| Pulse::try_from(value.as_str()).ok());
        match pulse {
            Some(pulse) => RhythmValue::from_pulse(&pulse, context.bpm),
            None => fallback_value(context),
        }
    }

    fn reset(&mut self) {
        self.walk.reset();
        self.order.reset();
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Values of a Markov chain, created by analysing `count` values of a rhythm on first use.
///
/// Pulse based values are re-evaluated with the current tempo, all others are used as they
/// were collected.
#[derive(Debug, Clone)]
pub struct MarkovRhythmAnalysis {
    source: RhythmObject,
    count: usize,
    max_order: usize,
    order: GeneratorObject,
    seed: u64,
    states: Vec<RhythmValue>,
    walk: Option<MarkovWalk>,
}

impl MarkovRhythmAnalysis {
    pub fn from_args(args: &Args) -> Result<Self> {
        let count = args.count(1)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(
                "markovRhythmAnalysis: count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            source: args.rhythm(0)?,
            count,
            max_order: args.count(2)?,
            order: args.generator(3)?,
            seed: args.seed(),
            states: Vec::new(),
            walk: None,
        })
    }

    // collect source values, returning the state index of each value
    fn analyse(&mut self, t: f64, context: &RefDict) -> Vec<String> {
        self.states.clear();
        let mut symbols = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let value = self.source.value(t, context);
            let index = match self.states.iter().position(|state| *state == value) {
                Some(index) => index,
                None => {
                    self.states.push(value);
                    self.states.len() - 1
                }
            };
            symbols.push(index.to_string());
        }
        symbols
    }
}

impl Rhythm for MarkovRhythmAnalysis {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        if self.walk.is_none() {
            let symbols = self.analyse(t, context);
            match Transition::from_analysis(&symbols, self.max_order) {
                Ok(transition) => self.walk = Some(MarkovWalk::new(transition, self.seed)),
                Err(err) => {
                    log::warn!("markovRhythmAnalysis: {err} at time {t}");
                    return fallback_value(context);
                }
            }
        }
        let order = self.order.number(t, context);
        let state = self
            .walk
            .as_mut()
            .and_then(|walk| walk.next(order, "markovRhythmAnalysis", t))
            .and_then(|symbol| symbol.parse::<usize>().ok())
            .and_then(|index| self.states.get(index));
        match state {
            Some(RhythmValue {
                pulse: Some(pulse), ..
            }) => RhythmValue::from_pulse(pulse, context.bpm),
            Some(state) => state.clone(),
            None => fallback_value(context),
        }
    }

    fn reset(&mut self) {
        self.source.reset();
        self.order.reset();
        self.states.clear();
        self.walk = None;
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

    fn durations(input: &str, count: usize) -> Result<Vec<f64>> {
        let mut rhythm = RhythmObject::parse(input, 3)?;
        let context = RefDict::with_bpm(60.0);
        Ok((0..count)
            .map(|i| rhythm.value(i as f64, &context).dur)
            .collect())
    }

    #[test]
    fn markov_pulse() -> Result<()> {
        assert_eq!(durations("mp, a{2,1,1}:{a=1}", 3)?, vec![0.5, 0.5, 0.5]);
        let values = durations("mp, a{1,1,1}b{4,1,1}:{a=1|b=1}, 0", 50)?;
        assert!(values.iter().all(|v| *v == 1.0 || *v == 0.25));
        assert!(values.contains(&1.0) && values.contains(&0.25));
        assert!(RhythmObject::parse("mp, a{x,y}:{a=1}", 1).is_err());
        Ok(())
    }

    #[test]
    fn markov_rhythm_analysis() -> Result<()> {
        // a strictly alternating source produces an alternating first order chain
        let values = durations("mra, (l, ((1, 1, 1), (2, 1, 1)), oc), 8, 1, 1", 6)?;
        assert!(values.windows(2).all(|pair| pair[0] != pair[1]));
        assert!(values.iter().all(|v| *v == 1.0 || *v == 0.5));
        // values follow the tempo
        let mut rhythm = RhythmObject::parse("mra, (l, ((1, 1, 1))), 4, 1, 1", 3)?;
        assert_eq!(rhythm.value(0.0, &RefDict::with_bpm(120.0)).dur, 0.5);
        Ok(())
    }
}
