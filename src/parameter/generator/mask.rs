//! Noise, masks, funnels, accumulation and grid quantization.

use crate::{
    error::{Error, Result},
    noise::{GameNoise, NoiseColor},
    parameter::{Arg, Args, Generator, GeneratorObject, RefDict, Value},
    quantize::{funnel_binary, Quantizer, ThresholdMatch},
    selector::{Selector, SelectorKind},
    unit::{self, BoundaryMethod},
};

// -------------------------------------------------------------------------------------------------

/// Fractional 1/f noise. The color is a named color or a gamma value, possibly dynamic.
#[derive(Debug, Clone)]
pub struct Noise {
    game: GameNoise,
    gamma: GeneratorObject,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl Noise {
    pub fn from_args(args: &Args) -> Result<Self> {
        let resolution = args.count(0)?;
        let gamma = match args.get(1)? {
            Arg::String(name) => {
                let color = NoiseColor::try_from(name.as_str()).map_err(|err| {
                    Error::ParameterObjectSyntax(format!("noise argument 2: {err}"))
                })?;
                GeneratorObject::constant(color.0)
            }
            _ => args.generator(1)?,
        };
        Ok(Self {
            game: GameNoise::new(resolution, args.seed())
                .map_err(|err| err.with_context("noise"))?,
            gamma,
            min: args.generator(2)?,
            max: args.generator(3)?,
        })
    }
}

impl Generator for Noise {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let gamma = self.gamma.number(t, context);
        let value = self.game.step(gamma);
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.game.reset();
        self.gamma.reset();
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Fits the values of a generator into, or rejects them out of, dynamic boundaries.
#[derive(Debug, Clone)]
pub struct Mask {
    method: BoundaryMethod,
    reject: bool,
    min: GeneratorObject,
    max: GeneratorObject,
    source: GeneratorObject,
}

impl Mask {
    pub fn from_args(args: &Args, reject: bool) -> Result<Self> {
        Ok(Self {
            method: args.option(0)?,
            reject,
            min: args.generator(1)?,
            max: args.generator(2)?,
            source: args.generator(3)?,
        })
    }
}

impl Generator for Mask {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        let value = self.source.number(t, context);
        if self.reject {
            Value::Number(unit::boundary_reject(min, max, value, self.method))
        } else {
            Value::Number(unit::boundary_fit(min, max, value, self.method))
        }
    }

    fn reset(&mut self) {
        self.min.reset();
        self.max.reset();
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Collects `count` values of a generator on first use, normalizes them, then chooses from
/// them with a selector and scales them within dynamic boundaries.
#[derive(Debug, Clone)]
pub struct MaskScale {
    source: GeneratorObject,
    count: usize,
    min: GeneratorObject,
    max: GeneratorObject,
    kind: SelectorKind,
    seed: u64,
    selector: Option<Selector<f64>>,
}

impl MaskScale {
    pub fn from_args(args: &Args) -> Result<Self> {
        let count = args.count(1)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(
                "maskScale: count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            source: args.generator(0)?,
            count,
            min: args.generator(2)?,
            max: args.generator(3)?,
            kind: args.option(4)?,
            seed: args.seed(),
            selector: None,
        })
    }
}

impl Generator for MaskScale {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.selector.is_none() {
            let values = (0..self.count)
                .map(|_| self.source.number(t, context))
                .collect::<Vec<_>>();
            self.selector = Selector::new(unit::norm_range(&values, None), self.kind, self.seed).ok();
        }
        let value = self.selector.as_mut().map_or(0.0, Selector::next);
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.source.reset();
        self.min.reset();
        self.max.reset();
        self.selector = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Moves the values of a generator to one of two dynamic boundaries, depending on a threshold.
#[derive(Debug, Clone)]
pub struct FunnelBinary {
    on_match: ThresholdMatch,
    threshold: GeneratorObject,
    a: GeneratorObject,
    b: GeneratorObject,
    source: GeneratorObject,
}

impl FunnelBinary {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            on_match: args.option(0)?,
            threshold: args.generator(1)?,
            a: args.generator(2)?,
            b: args.generator(3)?,
            source: args.generator(4)?,
        })
    }
}

impl Generator for FunnelBinary {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let threshold = self.threshold.number(t, context);
        let a = self.a.number(t, context);
        let b = self.b.number(t, context);
        let value = self.source.number(t, context);
        Value::Number(funnel_binary(threshold, a, b, value, self.on_match))
    }

    fn reset(&mut self) {
        self.threshold.reset();
        self.a.reset();
        self.b.reset();
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Running sum of generated values, starting at an initial value.
#[derive(Debug, Clone)]
pub struct Accumulator {
    init: f64,
    total: f64,
    source: GeneratorObject,
}

impl Accumulator {
    pub fn from_args(args: &Args) -> Result<Self> {
        let init = args.number(0)?;
        Ok(Self {
            init,
            total: init,
            source: args.generator(1)?,
        })
    }
}

impl Generator for Accumulator {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        self.total += self.source.number(t, context);
        Value::Number(self.total)
    }

    fn reset(&mut self) {
        self.total = self.init;
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Attracts the values of a generator to a dynamic grid of `repeat` steps of a width, anchored
/// at a grid reference value.
#[derive(Debug, Clone)]
pub struct Quantize {
    grid_ref: GeneratorObject,
    width: GeneratorObject,
    repeat: usize,
    pull: GeneratorObject,
    source: GeneratorObject,
    quantizer: Quantizer,
}

impl Quantize {
    pub fn from_args(args: &Args) -> Result<Self> {
        let repeat = args.count(2)?;
        if repeat == 0 {
            return Err(Error::ParameterObjectSyntax(
                "quantize: step count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            grid_ref: args.generator(0)?,
            width: args.generator(1)?,
            repeat,
            pull: args.generator(3)?,
            source: args.generator_or_rhythm(4)?,
            quantizer: Quantizer::new(),
        })
    }
}

/// Quantize a single value with the grid, width and pull generators evaluated at `t`.
pub(crate) fn quantize_value(
    quantizer: &mut Quantizer,
    grid_ref: f64,
    width: f64,
    repeat: usize,
    pull: f64,
    value: f64,
) -> f64 {
    if width <= 0.0 {
        log::warn!("quantize: ignoring non positive grid width {width}");
        return value;
    }
    quantizer.update_grid(vec![width; repeat]);
    quantizer.attract(value, unit::limit(pull), grid_ref)
}

impl Generator for Quantize {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let grid_ref = self.grid_ref.number(t, context);
        let width = self.width.number(t, context);
        let pull = self.pull.number(t, context);
        let value = self.source.number(t, context);
        Value::Number(quantize_value(
            &mut self.quantizer,
            grid_ref,
            width,
            self.repeat,
            pull,
            value,
        ))
    }

    fn reset(&mut self) {
        self.grid_ref.reset();
        self.width.reset();
        self.pull.reset();
        self.source.reset();
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
        let mut generator = GeneratorObject::parse(input, 11)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| (generator.number(i as f64, &context) * 1e6).round() / 1e6)
            .collect())
    }

    #[test]
    fn noise() -> Result<()> {
        let values = numbers("n, 100, pink, 2, 4", 100)?;
        assert!(values.iter().all(|v| (2.0..=4.0).contains(v)));
        // dynamic colors
        let values = numbers("n, 64, (bg, oc, (0, 3)), 0, 1", 20)?;
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(GeneratorObject::parse("n, 100, purple, 0, 1", 1).is_err());
        Ok(())
    }

    #[test]
    fn masks() -> Result<()> {
        let source = "(bg, oc, (-1, .5, 1.5))";
        assert_eq!(numbers(&format!("m, l, 0, 1, {source}"), 3)?, vec![0.0, 0.5, 1.0]);
        assert_eq!(numbers(&format!("m, w, 0, 1, {source}"), 3)?, vec![0.0, 0.5, 0.5]);
        assert_eq!(numbers(&format!("m, r, 0, 1, {source}"), 3)?, vec![1.0, 0.5, 0.5]);
        assert_eq!(numbers("mr, l, 0, 1, (bg, oc, (.2, .7, 2))", 3)?, vec![0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn mask_scale() -> Result<()> {
        assert_eq!(
            numbers("ms, (bg, oc, (2, 4, 3)), 3, 10, 20, oc", 4)?,
            vec![10.0, 20.0, 15.0, 10.0]
        );
        Ok(())
    }

    #[test]
    fn funnel_and_accumulate() -> Result<()> {
        assert_eq!(
            numbers("fb, u, .5, 0, 1, (bg, oc, (.2, .5, .8))", 3)?,
            vec![0.0, 1.0, 1.0]
        );
        assert_eq!(
            numbers("fb, m, .5, 0, 1, (bg, oc, (.2, .5, .8))", 3)?,
            vec![0.0, 0.5, 1.0]
        );
        assert_eq!(numbers("a, 10, (bg, oc, (1, -2))", 4)?, vec![11.0, 9.0, 10.0, 8.0]);
        Ok(())
    }

    #[test]
    fn quantize() -> Result<()> {
        assert_eq!(
            numbers("q, 0, .25, 1, 1, (bg, oc, (.1, .2, .9))", 3)?,
            vec![0.0, 0.25, 1.0]
        );
        // half pull moves half the way
        assert_eq!(numbers("q, 0, 1, 1, .5, (c, .2)", 1)?, vec![0.1]);
        Ok(())
    }
}
