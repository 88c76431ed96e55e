//! Baskets: choose from literal or generated lists of values.

use crate::{
    error::{Error, Result},
    parameter::{Arg, Args, Generator, GeneratorObject, OutputFormat, RefDict, Value},
    selector::{Selector, SelectorKind},
    unit,
};

// -------------------------------------------------------------------------------------------------

/// Index of a unit interval value within a list of `len` values.
pub(crate) fn unit_index(value: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((unit::limit(value) * len as f64).floor() as usize).min(len - 1)
}

fn basket_values(args: &Args, index: usize) -> Result<Vec<Value>> {
    let values = args
        .list(index)?
        .iter()
        .map(|item| match item {
            Arg::Number(value) => Ok(Value::Number(*value)),
            Arg::String(value) => Ok(Value::String(value.clone())),
            Arg::List(_) => Err(Error::ParameterObjectSyntax(format!(
                "{}: nested lists are not valid basket values, got '{item}'",
                args.name()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(Error::ParameterObjectSyntax(format!(
            "{}: expected at least one value",
            args.name()
        )));
    }
    Ok(values)
}

// -------------------------------------------------------------------------------------------------

/// Chooses values from a literal list with a selector.
#[derive(Debug, Clone)]
pub struct BasketGen {
    selector: Selector<Value>,
    format: OutputFormat,
}

impl BasketGen {
    pub fn from_args(args: &Args) -> Result<Self> {
        let kind = args.option::<SelectorKind>(0)?;
        let values = basket_values(args, 1)?;
        let format = if values.iter().all(Value::is_number) {
            OutputFormat::Number
        } else {
            OutputFormat::String
        };
        Ok(Self {
            selector: Selector::new(values, kind, args.seed())?,
            format,
        })
    }
}

impl Generator for BasketGen {
    fn output_format(&self) -> OutputFormat {
        self.format
    }

    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        self.selector.next()
    }

    fn reset(&mut self) {
        self.selector.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Fills a list with `count` values of a generator on first use, then chooses from it.
#[derive(Debug, Clone)]
pub struct BasketFill {
    kind: SelectorKind,
    source: GeneratorObject,
    count: usize,
    seed: u64,
    selector: Option<Selector<f64>>,
}

impl BasketFill {
    pub fn from_args(args: &Args) -> Result<Self> {
        let count = args.count(2)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(
                "basketFill: count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            kind: args.option(0)?,
            source: args.generator(1)?,
            count,
            seed: args.seed(),
            selector: None,
        })
    }
}

impl Generator for BasketFill {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.selector.is_none() {
            let values = (0..self.count)
                .map(|_| self.source.number(t, context))
                .collect::<Vec<_>>();
            self.selector = Selector::new(values, self.kind, self.seed).ok();
        }
        Value::Number(self.selector.as_mut().map_or(0.0, Selector::next))
    }

    fn reset(&mut self) {
        self.source.reset();
        self.selector = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Fills a list with `count` values of a generator on first use, then chooses from it with a
/// unit interval position.
#[derive(Debug, Clone)]
pub struct BasketFillSelect {
    source: GeneratorObject,
    count: usize,
    unit: GeneratorObject,
    values: Vec<f64>,
}

impl BasketFillSelect {
    pub fn from_args(args: &Args) -> Result<Self> {
        let count = args.count(1)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(
                "basketFillSelect: count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            source: args.generator(0)?,
            count,
            unit: args.generator(2)?,
            values: Vec::new(),
        })
    }
}

impl Generator for BasketFillSelect {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.values.is_empty() {
            self.values = (0..self.count)
                .map(|_| self.source.number(t, context))
                .collect();
        }
        let index = unit_index(self.unit.number(t, context), self.values.len());
        Value::Number(self.values[index])
    }

    fn reset(&mut self) {
        self.source.reset();
        self.unit.reset();
        self.values.clear();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from a literal list with a unit interval position.
#[derive(Debug, Clone)]
pub struct BasketSelect {
    values: Vec<Value>,
    unit: GeneratorObject,
}

impl BasketSelect {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            values: basket_values(args, 0)?,
            unit: args.generator(1)?,
        })
    }
}

impl Generator for BasketSelect {
    fn output_format(&self) -> OutputFormat {
        if self.values.iter().all(Value::is_number) {
            OutputFormat::Number
        } else {
            OutputFormat::String
        }
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let index = unit_index(self.unit.number(t, context), self.values.len());
        self.values[index].clone()
    }

    fn reset(&mut self) {
        self.unit.reset();
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
        let mut generator = GeneratorObject::parse(input, 7)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| generator.number(i as f64, &context))
            .collect())
    }

    #[test]
    fn basket_gen() -> Result<()> {
        assert_eq!(numbers("bg, oc, (1, 2, 3)", 4)?, vec![1.0, 2.0, 3.0, 1.0]);
        assert_eq!(numbers("bg, oo, (1, 2, 3)", 5)?, vec![1.0, 2.0, 3.0, 2.0, 1.0]);
        let mut generator = GeneratorObject::parse("bg, rc, (a, b)", 7)?;
        assert_eq!(generator.output_format(), OutputFormat::String);
        let value = generator.value(0.0, &RefDict::default()).to_string();
        assert!(value == "a" || value == "b");
        assert!(GeneratorObject::parse("bg, rc, ()", 7).is_err());
        // reset repeats random selections
        let mut generator = GeneratorObject::parse("bg, rp, (1, 2, 3, 4, 5)", 7)?;
        let context = RefDict::default();
        let first = (0..5).map(|_| generator.number(0.0, &context)).collect::<Vec<_>>();
        generator.reset();
        let second = (0..5).map(|_| generator.number(0.0, &context)).collect::<Vec<_>>();
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn basket_fill() -> Result<()> {
        let values = numbers("bf, oc, (cg, u, 0, 4, 1), 3", 5)?;
        assert_eq!(values, vec![0.0, 1.0, 2.0, 0.0, 1.0]);
        let values = numbers("bfs, (cg, u, 0, 4, 1), 4, (bg, oc, (0, .3, .6, .99, 1))", 5)?;
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 3.0]);
        assert!(GeneratorObject::parse("bf, oc, (ru, 0, 1), 0", 7).is_err());
        Ok(())
    }

    #[test]
    fn basket_select() -> Result<()> {
        let values = numbers("bs, (1.5, 2, 3), (bg, oc, (0, .5, 1))", 3)?;
        assert_eq!(values, vec![1.5, 2.0, 3.0]);
        Ok(())
    }
}
