//! Filter implementations: array transformers used by clones.
//!
//! Filters receive all values of one event parameter at once, together with the event times
//! and reference contexts at which embedded generators are evaluated. Generator arguments of
//! filters also accept rhythms, in which case the rhythm durations are used.

use crate::{
    error::{Error, Result},
    quantize::{funnel_binary, Quantizer, ThresholdMatch},
    unit::{self, BoundaryMethod},
};

use super::{generator::mask::quantize_value, Args, Filter, FilterObject, GeneratorObject, RefDict};

// -------------------------------------------------------------------------------------------------

/// Construct the filter with the given long name.
pub(crate) fn build(name: &str, args: &Args) -> Result<Box<dyn Filter>> {
    let filter: Box<dyn Filter> = match name {
        "bypass" => Box::new(Bypass),
        "replace" => Box::new(Replace::from_args(args)?),
        "orderBackward" => Box::new(OrderBackward),
        "orderRotate" => Box::new(OrderRotate::from_args(args)?),
        "pipeLine" => Box::new(PipeLine::from_args(args)?),
        "filterAdd" => Box::new(FilterOperator::from_args(args, Operation::Add)?),
        "filterMultiply" => Box::new(FilterOperator::from_args(args, Operation::Multiply)?),
        "filterDivide" => Box::new(FilterOperator::from_args(args, Operation::Divide)?),
        "filterPower" => Box::new(FilterOperator::from_args(args, Operation::Power)?),
        "filterMultiplyAnchor" => {
            Box::new(FilterOperatorAnchor::from_args(args, Operation::Multiply)?)
        }
        "filterDivideAnchor" => Box::new(FilterOperatorAnchor::from_args(args, Operation::Divide)?),
        "filterQuantize" => Box::new(FilterQuantize::from_args(args)?),
        "filterFunnelBinary" => Box::new(FilterFunnelBinary::from_args(args)?),
        "maskFilter" => Box::new(MaskFilter::from_args(args)?),
        "maskScaleFilter" => Box::new(MaskScaleFilter::from_args(args)?),
        _ => {
            return Err(Error::ParameterObjectSyntax(format!(
                "no filter named '{name}'"
            )))
        }
    };
    Ok(filter)
}

/// Evaluate a generator once per value, at the value's time and context.
fn evaluate(
    generator: &mut GeneratorObject,
    times: &[f64],
    contexts: &[RefDict],
    len: usize,
) -> Vec<f64> {
    let fallback = RefDict::default();
    (0..len)
        .map(|i| {
            let t = times.get(i).copied().unwrap_or(0.0);
            let context = contexts.get(i).unwrap_or(&fallback);
            generator.number(t, context)
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

/// Returns values unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Bypass;

impl Filter for Bypass {
    fn filter(&mut self, values: &[f64], _times: &[f64], _contexts: &[RefDict]) -> Vec<f64> {
        values.to_vec()
    }

    fn reset(&mut self) {}

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }
}

/// Reverses the order of values.
#[derive(Debug, Clone, Copy)]
pub struct OrderBackward;

impl Filter for OrderBackward {
    fn filter(&mut self, values: &[f64], _times: &[f64], _contexts: &[RefDict]) -> Vec<f64> {
        values.iter().rev().copied().collect()
    }

    fn reset(&mut self) {}

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }
}

/// Rotates values to the left by a number of steps.
#[derive(Debug, Clone, Copy)]
pub struct OrderRotate {
    steps: usize,
}

impl OrderRotate {
    pub fn from_args(args: &Args) -> Result<Self> {
        let steps = args.count(0)?;
        if steps == 0 {
            return Err(Error::ParameterObjectSyntax(
                "orderRotate: number of rotation steps must be above zero".to_string(),
            ));
        }
        Ok(Self { steps })
    }
}

impl Filter for OrderRotate {
    fn filter(&mut self, values: &[f64], _times: &[f64], _contexts: &[RefDict]) -> Vec<f64> {
        let mut values = values.to_vec();
        if !values.is_empty() {
            let cut = self.steps % values.len();
            values.rotate_left(cut);
        }
        values
    }

    fn reset(&mut self) {}

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(*self)
    }
}

/// Applies a list of filters in order.
#[derive(Debug, Clone)]
pub struct PipeLine {
    filters: Vec<FilterObject>,
}

impl PipeLine {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            filters: args.filters(0)?,
        })
    }
}

impl Filter for PipeLine {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        self.filters
            .iter_mut()
            .fold(values.to_vec(), |values, filter| {
                filter.filter(&values, times, contexts)
            })
    }

    fn reset(&mut self) {
        self.filters.iter_mut().for_each(FilterObject::reset);
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Replaces all values with generated values.
#[derive(Debug, Clone)]
pub struct Replace {
    source: GeneratorObject,
}

impl Replace {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.generator_or_rhythm(0)?,
        })
    }
}

impl Filter for Replace {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        evaluate(&mut self.source, times, contexts, values.len())
    }

    fn reset(&mut self) {
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Arithmetic of [`FilterOperator`] and [`FilterOperatorAnchor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Multiply,
    Divide,
    Power,
}

impl Operation {
    /// Apply the operation. Division by zero leaves the value unchanged.
    pub fn apply(&self, value: f64, operand: f64) -> f64 {
        match self {
            Self::Add => value + operand,
            Self::Multiply => value * operand,
            Self::Divide => {
                if operand == 0.0 {
                    value
                } else {
                    value / operand
                }
            }
            Self::Power => value.powf(operand),
        }
    }
}

/// Combines each value with a generated value.
#[derive(Debug, Clone)]
pub struct FilterOperator {
    operation: Operation,
    source: GeneratorObject,
}

impl FilterOperator {
    pub fn from_args(args: &Args, operation: Operation) -> Result<Self> {
        Ok(Self {
            operation,
            source: args.generator_or_rhythm(0)?,
        })
    }
}

impl Filter for FilterOperator {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let operands = evaluate(&mut self.source, times, contexts, values.len());
        values
            .iter()
            .zip(operands)
            .map(|(value, operand)| self.operation.apply(*value, operand))
            .collect()
    }

    fn reset(&mut self) {
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Reference point of [`FilterOperatorAnchor`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Lower,
    Upper,
    Average,
    Median,
}

impl Anchor {
    /// The anchor value of a series. Empty series anchor at 0.
    pub fn value(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Self::Lower => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Upper => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Average => values.iter().sum::<f64>() / values.len() as f64,
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let middle = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[middle - 1] + sorted[middle]) / 2.0
                } else {
                    sorted[middle]
                }
            }
        }
    }
}

impl TryFrom<&str> for Anchor {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "l" | "lower" => Ok(Self::Lower),
            "u" | "upper" => Ok(Self::Upper),
            "a" | "average" => Ok(Self::Average),
            "m" | "median" => Ok(Self::Median),
            _ => Err(format!(
                "invalid anchor '{value}', expected lower, upper, average or median"
            )),
        }
    }
}

/// Scales the distances of values to an anchor with generated values.
#[derive(Debug, Clone)]
pub struct FilterOperatorAnchor {
    operation: Operation,
    anchor: Anchor,
    source: GeneratorObject,
}

impl FilterOperatorAnchor {
    pub fn from_args(args: &Args, operation: Operation) -> Result<Self> {
        Ok(Self {
            operation,
            anchor: args.option(0)?,
            source: args.generator_or_rhythm(1)?,
        })
    }
}

impl Filter for FilterOperatorAnchor {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let anchor = self.anchor.value(values);
        let operands = evaluate(&mut self.source, times, contexts, values.len());
        values
            .iter()
            .zip(operands)
            .map(|(value, operand)| self.operation.apply(value - anchor, operand) + anchor)
            .collect()
    }

    fn reset(&mut self) {
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Attracts values to a dynamic grid.
#[derive(Debug, Clone)]
pub struct FilterQuantize {
    grid_ref: GeneratorObject,
    width: GeneratorObject,
    repeat: usize,
    pull: GeneratorObject,
    quantizer: Quantizer,
}

impl FilterQuantize {
    pub fn from_args(args: &Args) -> Result<Self> {
        let repeat = args.count(2)?;
        if repeat == 0 {
            return Err(Error::ParameterObjectSyntax(
                "filterQuantize: step count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            grid_ref: args.generator_or_rhythm(0)?,
            width: args.generator_or_rhythm(1)?,
            repeat,
            pull: args.generator_or_rhythm(3)?,
            quantizer: Quantizer::new(),
        })
    }
}

impl Filter for FilterQuantize {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let len = values.len();
        let grid_refs = evaluate(&mut self.grid_ref, times, contexts, len);
        let widths = evaluate(&mut self.width, times, contexts, len);
        let pulls = evaluate(&mut self.pull, times, contexts, len);
        values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                quantize_value(
                    &mut self.quantizer,
                    grid_refs[i],
                    widths[i].abs(),
                    self.repeat,
                    pulls[i],
                    *value,
                )
            })
            .collect()
    }

    fn reset(&mut self) {
        self.grid_ref.reset();
        self.width.reset();
        self.pull.reset();
        self.quantizer = Quantizer::new();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Moves values to one of two dynamic boundaries, depending on which side of a threshold
/// they are.
#[derive(Debug, Clone)]
pub struct FilterFunnelBinary {
    on_match: ThresholdMatch,
    threshold: GeneratorObject,
    a: GeneratorObject,
    b: GeneratorObject,
}

impl FilterFunnelBinary {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            on_match: args.option(0)?,
            threshold: args.generator_or_rhythm(1)?,
            a: args.generator_or_rhythm(2)?,
            b: args.generator_or_rhythm(3)?,
        })
    }
}

impl Filter for FilterFunnelBinary {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let len = values.len();
        let thresholds = evaluate(&mut self.threshold, times, contexts, len);
        let a = evaluate(&mut self.a, times, contexts, len);
        let b = evaluate(&mut self.b, times, contexts, len);
        values
            .iter()
            .enumerate()
            .map(|(i, value)| funnel_binary(thresholds[i], a[i], b[i], *value, self.on_match))
            .collect()
    }

    fn reset(&mut self) {
        self.threshold.reset();
        self.a.reset();
        self.b.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Fits values into dynamic boundaries by limiting, wrapping or reflecting.
#[derive(Debug, Clone)]
pub struct MaskFilter {
    method: BoundaryMethod,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl MaskFilter {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            method: args.option(0)?,
            min: args.generator_or_rhythm(1)?,
            max: args.generator_or_rhythm(2)?,
        })
    }
}

impl Filter for MaskFilter {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let len = values.len();
        let min = evaluate(&mut self.min, times, contexts, len);
        let max = evaluate(&mut self.max, times, contexts, len);
        values
            .iter()
            .enumerate()
            .map(|(i, value)| unit::boundary_fit(min[i], max[i], *value, self.method))
            .collect()
    }

    fn reset(&mut self) {
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

/// Normalizes values within their own range, then scales them within dynamic boundaries.
#[derive(Debug, Clone)]
pub struct MaskScaleFilter {
    min: GeneratorObject,
    max: GeneratorObject,
}

impl MaskScaleFilter {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            min: args.generator_or_rhythm(0)?,
            max: args.generator_or_rhythm(1)?,
        })
    }
}

impl Filter for MaskScaleFilter {
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        let len = values.len();
        let min = evaluate(&mut self.min, times, contexts, len);
        let max = evaluate(&mut self.max, times, contexts, len);
        unit::norm_range(values, None)
            .into_iter()
            .enumerate()
            .map(|(i, value)| unit::denorm(value, min[i], max[i]))
            .collect()
    }

    fn reset(&mut self) {
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str, values: &[f64]) -> Result<Vec<f64>> {
        let mut filter = FilterObject::parse(input, 1)?;
        let times = (0..values.len()).map(|i| i as f64).collect::<Vec<_>>();
        let contexts = vec![RefDict::with_bpm(60.0); values.len()];
        Ok(filter
            .filter(values, &times, &contexts)
            .into_iter()
            .map(|v| (v * 1e6).round() / 1e6)
            .collect())
    }

    #[test]
    fn order() -> Result<()> {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(run("b", &values)?, values.to_vec());
        assert_eq!(run("ob", &values)?, vec![4.0, 3.0, 2.0, 1.0]);
        assert_eq!(run("or, 1", &values)?, vec![2.0, 3.0, 4.0, 1.0]);
        assert_eq!(run("or, 6", &values)?, vec![3.0, 4.0, 1.0, 2.0]);
        assert_eq!(run("pl, ((or, 1), (ob))", &values)?, vec![1.0, 4.0, 3.0, 2.0]);
        assert!(run("or, 0", &values).is_err());
        assert_eq!(run("ob", &[])?, Vec::<f64>::new());
        Ok(())
    }

    #[test]
    fn operators() -> Result<()> {
        let values = [1.0, 2.0, 4.0];
        assert_eq!(run("r, (bg, oc, (7, 8))", &values)?, vec![7.0, 8.0, 7.0]);
        assert_eq!(run("fa, (c, 1)", &values)?, vec![2.0, 3.0, 5.0]);
        assert_eq!(run("fm, (c, 2)", &values)?, vec![2.0, 4.0, 8.0]);
        assert_eq!(run("fd, (bg, oc, (2, 0))", &values)?, vec![0.5, 2.0, 2.0]);
        assert_eq!(run("fp, (c, 2)", &values)?, vec![1.0, 4.0, 16.0]);
        // rhythms are used with their durations
        assert_eq!(run("fm, (l, ((2, 1, 1)))", &values)?, vec![0.5, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn anchors() -> Result<()> {
        let values = [1.0, 2.0, 4.0];
        assert_eq!(run("fma, l, (c, 2)", &values)?, vec![1.0, 3.0, 7.0]);
        assert_eq!(run("fma, u, (c, 2)", &values)?, vec![-2.0, 0.0, 4.0]);
        assert_eq!(run("fda, m, (c, 2)", &values)?, vec![1.5, 2.0, 3.0]);
        assert_eq!(Anchor::Average.value(&values), 7.0 / 3.0);
        assert_eq!(Anchor::Median.value(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(run("fma, x, (c, 2)", &values).is_err());
        Ok(())
    }

    #[test]
    fn boundaries() -> Result<()> {
        let values = [0.1, 0.4, 0.6, 0.9];
        assert_eq!(run("ffb, u, (c, .5), (c, 0), (c, 1)", &values)?, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(run("mf, l, (c, .2), (c, .8)", &values)?, vec![0.2, 0.4, 0.6, 0.8]);
        assert_eq!(run("msf, (c, 0), (c, 8)", &values)?, vec![0.0, 3.0, 5.0, 8.0]);
        assert_eq!(run("fq, (c, 0), (c, .5), 1, (c, 1)", &values)?, vec![0.0, 0.5, 0.5, 1.0]);
        Ok(())
    }
}
