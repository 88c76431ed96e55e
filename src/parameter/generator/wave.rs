//! Periodic unit interval waves, scaled within dynamic boundaries.

use crate::{
    error::Result,
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
    unit,
};

use super::{StepMode, Stepper};

// -------------------------------------------------------------------------------------------------

/// Shapes of [`Wave`] generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Cosine,
    SawUp,
    SawDown,
    Pulse,
    Triangle,
    PowerUp,
    PowerDown,
}

impl WaveShape {
    /// Shapes with an additional exponent argument.
    pub fn has_exponent(&self) -> bool {
        matches!(self, Self::PowerUp | Self::PowerDown)
    }

    /// Evaluate the shape at the given phase position. Returns a unit interval value.
    pub fn at(&self, position: f64, exponent: f64) -> f64 {
        let phase = position.rem_euclid(1.0);
        match self {
            Self::Sine => (1.0 + (std::f64::consts::TAU * phase).sin()) / 2.0,
            Self::Cosine => (1.0 + (std::f64::consts::TAU * phase).cos()) / 2.0,
            Self::SawUp => phase,
            Self::SawDown => 1.0 - phase,
            Self::Pulse => {
                if phase < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Triangle => {
                if phase < 0.5 {
                    phase * 2.0
                } else {
                    1.0 - (phase - 0.5) * 2.0
                }
            }
            Self::PowerUp => phase.powf(2f64.powf(exponent)),
            Self::PowerDown => (1.0 - phase).powf(2f64.powf(exponent)),
        }
    }
}

/// Read seconds or events per cycle, falling back to 1 for non positive values.
fn cycle_length(name: &str, spc: &mut GeneratorObject, t: f64, context: &RefDict) -> f64 {
    let value = spc.number(t, context);
    if value > 0.0 {
        value
    } else {
        log::warn!("{name}: invalid cycle length {value} at time {t}, using 1");
        1.0
    }
}

// -------------------------------------------------------------------------------------------------

/// A wave with a dynamic cycle length in events or seconds.
#[derive(Debug, Clone)]
pub struct Wave {
    name: &'static str,
    shape: WaveShape,
    stepper: Stepper,
    spc: GeneratorObject,
    phase: f64,
    exponent: f64,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl Wave {
    pub fn from_args(args: &Args, shape: WaveShape) -> Result<Self> {
        let (exponent, min) = if shape.has_exponent() {
            (args.number(3)?, 4)
        } else {
            (0.0, 3)
        };
        Ok(Self {
            name: args.name(),
            shape,
            stepper: Stepper::new(args.option::<StepMode>(0)?),
            spc: args.generator(1)?,
            phase: args.number(2)?,
            exponent,
            min: args.generator(min)?,
            max: args.generator(min + 1)?,
        })
    }
}

impl Generator for Wave {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let x = self.stepper.next(t);
        let spc = cycle_length(self.name, &mut self.spc, t, context);
        let value = self.shape.at(self.phase + x / spc, self.exponent);
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.stepper.reset();
        self.spc.reset();
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Current half period of a [`HalfPeriodWave`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct HalfPeriod {
    start: f64,
    end: f64,
    spc: f64,
    shift: f64,
}

/// A wave which draws a new cycle length at the start of each half period. Cycle lengths
/// are the length of one half period.
#[derive(Debug, Clone)]
pub struct HalfPeriodWave {
    name: &'static str,
    shape: WaveShape,
    stepper: Stepper,
    spc: GeneratorObject,
    phase: f64,
    min: GeneratorObject,
    max: GeneratorObject,
    current: Option<HalfPeriod>,
}

impl HalfPeriodWave {
    pub fn from_args(args: &Args, shape: WaveShape) -> Result<Self> {
        Ok(Self {
            name: args.name(),
            shape,
            stepper: Stepper::new(args.option::<StepMode>(0)?),
            spc: args.generator(1)?,
            phase: args.number(2)?,
            min: args.generator(3)?,
            max: args.generator(4)?,
            current: None,
        })
    }
}

impl Generator for HalfPeriodWave {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let x = self.stepper.next(t);
        let current = match self.current {
            Some(half) if x >= half.start && x < half.end => half,
            previous => {
                let spc = cycle_length(self.name, &mut self.spc, t, context) * 2.0;
                let shift = match previous {
                    Some(half) if half.shift == 0.0 => 0.5,
                    _ => 0.0,
                };
                let half = HalfPeriod {
                    start: x,
                    end: x + spc / 2.0,
                    spc,
                    shift,
                };
                self.current = Some(half);
                half
            }
        };
        let position = self.phase + current.shift + (x - current.start) / current.spc;
        let value = self.shape.at(position, 0.0);
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.stepper.reset();
        self.spc.reset();
        self.min.reset();
        self.max.reset();
        self.current = None;
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

    fn numbers(input: &str, count: usize) -> Result<Vec<f64>> {
        let mut generator = GeneratorObject::parse(input, 1)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| (generator.number(i as f64 * 0.5, &context) * 1e6).round() / 1e6)
            .collect())
    }

    #[test]
    fn shapes() -> Result<()> {
        assert_eq!(numbers("ws, e, 4, 0, 0, 1", 5)?, vec![0.5, 1.0, 0.5, 0.0, 0.5]);
        assert_eq!(numbers("wc, e, 4, 0, 0, 1", 3)?, vec![1.0, 0.5, 0.0]);
        assert_eq!(numbers("wsu, e, 4, 0, 0, 8", 5)?, vec![0.0, 2.0, 4.0, 6.0, 0.0]);
        assert_eq!(numbers("wsd, e, 4, 0, 0, 8", 2)?, vec![8.0, 6.0]);
        assert_eq!(numbers("wp, e, 4, .5, 0, 1", 4)?, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(numbers("wt, e, 4, 0, 0, 1", 4)?, vec![0.0, 0.5, 1.0, 0.5]);
        assert_eq!(numbers("wpu, e, 4, 0, 1, 0, 1", 3)?, vec![0.0, 0.0625, 0.25]);
        assert_eq!(numbers("wpd, e, 4, 0, 0, 0, 1", 2)?, vec![1.0, 0.75]);
        Ok(())
    }

    #[test]
    fn time_steps() -> Result<()> {
        // time advances in half seconds
        assert_eq!(numbers("wsu, t, 2, 0, 0, 1", 5)?, vec![0.0, 0.25, 0.5, 0.75, 0.0]);
        // zero cycle lengths fall back to one
        assert_eq!(numbers("wsu, t, 0, 0, 0, 1", 2)?, vec![0.0, 0.5]);
        Ok(())
    }

    #[test]
    fn half_period() -> Result<()> {
        assert_eq!(numbers("whpp, e, 2, 0, 0, 1", 6)?, vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(
            numbers("whps, e, (bg, oc, (2, 1)), 0, 0, 1", 4)?,
            vec![0.5, 1.0, 0.5, 0.5]
        );
        Ok(())
    }
}
