//! Number series: Fibonacci terms, sieve segments and prime segments.

use crate::{
    chaos::fibonacci_series,
    error::{Error, Result},
    parameter::{Arg, Args, Generator, GeneratorObject, RefDict, Value},
    selector::{Selector, SelectorKind},
    sieve::{PrimeSegment, Sieve, SieveFormat},
    unit,
};

// -------------------------------------------------------------------------------------------------

pub(crate) fn parse_sieve(args: &Args, index: usize) -> Result<Sieve> {
    let text = match args.get(index)? {
        Arg::Number(value) => format!("{value}@0"),
        _ => args.string(index)?.to_string(),
    };
    Sieve::try_from(text.as_str()).map_err(|err| err.with_context(args.name()))
}

pub(crate) fn checked_length(args: &Args, index: usize) -> Result<usize> {
    let length = args.count(index)?;
    if length == 0 {
        return Err(Error::ParameterObjectSyntax(format!(
            "{}: length must be above zero",
            args.name()
        )));
    }
    Ok(length)
}

/// Unit interval values, chosen with a selector and scaled into dynamic boundaries.
#[derive(Debug, Clone)]
struct ScaledSelection {
    selector: Selector<f64>,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl ScaledSelection {
    fn new(args: &Args, values: Vec<f64>, min: usize, max: usize, selector: usize) -> Result<Self> {
        let kind = args.option::<SelectorKind>(selector)?;
        Ok(Self {
            selector: Selector::new(values, kind, args.seed())?,
            min: args.generator(min)?,
            max: args.generator(max)?,
        })
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let value = self.selector.next();
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.selector.reset();
        self.min.reset();
        self.max.reset();
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from `length` Fibonacci terms, starting with the first term at or above `start`,
/// normalized and scaled within min and max.
#[derive(Debug, Clone)]
pub struct FibonacciSeries {
    selection: ScaledSelection,
}

impl FibonacciSeries {
    pub fn from_args(args: &Args) -> Result<Self> {
        let start = args.number(0)?;
        let length = checked_length(args, 1)?;
        let first = (0..1000)
            .find(|i| fibonacci_series(*i, i + 1).first().is_some_and(|v| *v >= start))
            .ok_or_else(|| {
                Error::ParameterObjectSyntax(format!("fibonacciSeries: start {start} too large"))
            })?;
        let series = fibonacci_series(first, first + length);
        if series.iter().any(|v| !v.is_finite()) {
            return Err(Error::ParameterObjectSyntax(format!(
                "fibonacciSeries: length {length} exceeds the numeric range"
            )));
        }
        let values = unit::norm_range(&series, None);
        Ok(Self {
            selection: ScaledSelection::new(args, values, 2, 3, 4)?,
        })
    }
}

impl Generator for FibonacciSeries {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        self.selection.value(t, context)
    }

    fn reset(&mut self) {
        self.selection.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from a sieve segment of `length` values, normalized within its integer range and
/// scaled within min and max.
#[derive(Debug, Clone)]
pub struct ValueSieve {
    selection: ScaledSelection,
}

impl ValueSieve {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sieve = parse_sieve(args, 0)?;
        let length = checked_length(args, 1)?;
        let values = sieve
            .collect(0, 0, length, SieveFormat::Unit, 100)
            .map_err(|err| err.with_context("valueSieve"))?;
        Ok(Self {
            selection: ScaledSelection::new(args, values, 2, 3, 4)?,
        })
    }
}

impl Generator for ValueSieve {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        self.selection.value(t, context)
    }

    fn reset(&mut self) {
        self.selection.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Moves the values of a generator to the nearest point of a sieve segment scaled within
/// min and max.
#[derive(Debug, Clone)]
pub struct SieveFunnel {
    grid: Vec<f64>,
    min: GeneratorObject,
    max: GeneratorObject,
    source: GeneratorObject,
}

impl SieveFunnel {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sieve = parse_sieve(args, 0)?;
        let length = checked_length(args, 1)?;
        let grid = sieve
            .collect(0, 0, length, SieveFormat::Unit, 100)
            .map_err(|err| err.with_context("sieveFunnel"))?;
        Ok(Self {
            grid,
            min: args.generator(2)?,
            max: args.generator(3)?,
            source: args.generator(4)?,
        })
    }
}

impl Generator for SieveFunnel {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        let value = self.source.number(t, context);
        let nearest = self
            .grid
            .iter()
            .map(|v| unit::denorm(*v, min, max))
            .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
            .unwrap_or(value);
        Value::Number(nearest)
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

/// Chooses from a sieve segment within an integer range, in a sieve format.
#[derive(Debug, Clone)]
pub struct SieveList {
    selector: Selector<f64>,
}

impl SieveList {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sieve = parse_sieve(args, 0)?;
        let (a, b) = (args.integer(1)?, args.integer(2)?);
        let z = (a.min(b)..=a.max(b)).collect::<Vec<_>>();
        let format = args.option::<SieveFormat>(3)?;
        let values = sieve.segment(0, Some(&z), format);
        if values.is_empty() {
            return Err(Error::ParameterObjectSyntax(format!(
                "sieveList: sieve '{sieve}' has no values within ({a}, {b})"
            )));
        }
        Ok(Self {
            selector: Selector::new(values, args.option(4)?, args.seed())?,
        })
    }
}

impl Generator for SieveList {
    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        Value::Number(self.selector.next())
    }

    fn reset(&mut self) {
        self.selector.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from a segment of prime numbers in a sieve format.
#[derive(Debug, Clone)]
pub struct ListPrime {
    selector: Selector<f64>,
}

impl ListPrime {
    pub fn from_args(args: &Args) -> Result<Self> {
        let segment = PrimeSegment::new(args.integer(0)?, checked_length(args, 1)?);
        let values = segment.values(args.option(2)?);
        Ok(Self {
            selector: Selector::new(values, args.option(3)?, args.seed())?,
        })
    }
}

impl Generator for ListPrime {
    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        Value::Number(self.selector.next())
    }

    fn reset(&mut self) {
        self.selector.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from a normalized segment of prime numbers, scaled within min and max.
#[derive(Debug, Clone)]
pub struct ValuePrime {
    selection: ScaledSelection,
}

impl ValuePrime {
    pub fn from_args(args: &Args) -> Result<Self> {
        let segment = PrimeSegment::new(args.integer(0)?, checked_length(args, 1)?);
        let values = segment.values(SieveFormat::Unit);
        Ok(Self {
            selection: ScaledSelection::new(args, values, 2, 3, 4)?,
        })
    }
}

impl Generator for ValuePrime {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        self.selection.value(t, context)
    }

    fn reset(&mut self) {
        self.selection.reset();
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
        let mut generator = GeneratorObject::parse(input, 3)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| (generator.number(i as f64, &context) * 1e6).round() / 1e6)
            .collect())
    }

    #[test]
    fn fibonacci() -> Result<()> {
        // 3, 5, 8 normalized
        assert_eq!(numbers("fs, 3, 3, 0, 10, oc", 3)?, vec![0.0, 4.0, 10.0]);
        assert!(GeneratorObject::parse("fs, 3, 0, 0, 1, oc", 1).is_err());
        Ok(())
    }

    #[test]
    fn sieves() -> Result<()> {
        // 0, 3, 4, 6 within 0..=6
        assert_eq!(numbers("vs, 3|4, 4, 0, 6, oc", 4)?, vec![0.0, 3.0, 4.0, 6.0]);
        assert_eq!(
            numbers("sl, 3|4, -4, 4, int, oc", 5)?,
            vec![-4.0, -3.0, 0.0, 3.0, 4.0]
        );
        assert_eq!(numbers("sf, 3|4, 4, 0, 6, (bg, oc, (1, 3.8, 5.5))", 3)?, vec![0.0, 4.0, 6.0]);
        assert!(GeneratorObject::parse("sl, 5@1, 2, 3, int, oc", 1).is_err());
        assert!(GeneratorObject::parse("vs, 3|&4, 4, 0, 1, oc", 1).is_err());
        Ok(())
    }

    #[test]
    fn primes() -> Result<()> {
        assert_eq!(numbers("lp, 2, 4, int, oc", 4)?, vec![2.0, 3.0, 5.0, 7.0]);
        assert_eq!(numbers("lp, 2, 4, wid, oc", 3)?, vec![1.0, 2.0, 2.0]);
        assert_eq!(numbers("vp, 2, 3, 0, 3, oc", 3)?, vec![0.0, 1.0, 3.0]);
        Ok(())
    }
}
