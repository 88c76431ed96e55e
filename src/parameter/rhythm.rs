//! Rhythm implementations, grouped by family.

use crate::{
    error::{Error, Result},
    pulse::{bpm_to_beat_time, dynamic_to_accent},
};

use super::{Args, Generator, GeneratorObject, RefDict, Rhythm, RhythmObject, RhythmValue, Value};

pub mod genetic;
pub mod iterate;
pub mod markov;
pub mod pulse;
pub mod sieve;

// -------------------------------------------------------------------------------------------------

/// Construct the rhythm with the given long name.
pub(crate) fn build(name: &str, args: &Args) -> Result<Box<dyn Rhythm>> {
    let rhythm: Box<dyn Rhythm> = match name {
        "pulseTriple" => Box::new(pulse::PulseTriple::from_args(args)?),
        "loop" => Box::new(pulse::Loop::from_args(args)?),
        "binaryAccent" => Box::new(pulse::BinaryAccent::from_args(args)?),
        "convertSecond" => Box::new(pulse::ConvertSecond::from_args(args)?),
        "convertSecondTriple" => Box::new(pulse::ConvertSecondTriple::from_args(args)?),
        "gaRhythm" => Box::new(genetic::GaRhythm::from_args(args)?),
        "pulseSieve" => Box::new(sieve::PulseSieve::from_args(args)?),
        "rhythmSieve" => Box::new(sieve::RhythmSieve::from_args(args)?),
        "markovPulse" => Box::new(markov::MarkovPulse::from_args(args)?),
        "markovRhythmAnalysis" => Box::new(markov::MarkovRhythmAnalysis::from_args(args)?),
        "iterateRhythmGroup" => Box::new(iterate::IterateRhythmGroup::from_args(args)?),
        "iterateRhythmWindow" => Box::new(iterate::IterateRhythmWindow::from_args(args)?),
        "iterateRhythmHold" => Box::new(iterate::IterateRhythmHold::from_args(args)?),
        _ => {
            return Err(Error::ParameterObjectSyntax(format!(
                "no rhythm named '{name}'"
            )))
        }
    };
    Ok(rhythm)
}

/// Accent of a generated value: numbers, or dynamic strings such as `mf`.
pub(crate) fn accent_value(value: &Value) -> f64 {
    match value {
        Value::Number(value) => *value,
        Value::String(text) => dynamic_to_accent(text.trim()).unwrap_or_else(|| value.as_f64()),
    }
}

/// A one beat value, used when a rhythm can't produce a valid value.
pub(crate) fn fallback_value(context: &RefDict) -> RhythmValue {
    let beat_time = bpm_to_beat_time(context.bpm);
    RhythmValue::new(beat_time, beat_time, 1.0)
}

// -------------------------------------------------------------------------------------------------

/// Uses the durations of a rhythm as generator values.
#[derive(Debug, Clone)]
pub struct RhythmDuration {
    rhythm: RhythmObject,
}

impl RhythmDuration {
    /// Wrap a rhythm into a generator object with the rhythm's name and arguments.
    pub fn wrap(rhythm: RhythmObject) -> GeneratorObject {
        let (name, arg) = (rhythm.name(), rhythm.arg().clone());
        GeneratorObject::from_parts(name, arg, Box::new(Self { rhythm }))
    }
}

impl Generator for RhythmDuration {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        Value::Number(self.rhythm.value(t, context).dur)
    }

    fn reset(&mut self) {
        self.rhythm.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accents() {
        assert_eq!(accent_value(&Value::Number(0.5)), 0.5);
        assert_eq!(accent_value(&Value::String("+".into())), 1.0);
        assert_eq!(accent_value(&Value::String("0.25".into())), 0.25);
    }

    #[test]
    fn durations() -> Result<()> {
        let rhythm = RhythmObject::parse("l, ((1, 1, 1), (2, 1, 1))", 1)?;
        let mut generator = RhythmDuration::wrap(rhythm);
        assert_eq!(generator.name(), "loop");
        let context = RefDict::with_bpm(60.0);
        let values = (0..3)
            .map(|i| generator.number(i as f64, &context))
            .collect::<Vec<_>>();
        assert_eq!(values, vec![1.0, 0.5, 1.0]);
        Ok(())
    }
}
