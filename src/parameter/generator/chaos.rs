//! Generators driven by chaotic systems.

use crate::{
    chaos::{logistic, Henon, Lorenz},
    error::{Error, Result},
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
    selector::{Selector, SelectorKind},
    unit,
};

// -------------------------------------------------------------------------------------------------

/// The logistic map with a dynamic growth rate, scaled within min and max.
#[derive(Debug, Clone)]
pub struct LogisticMap {
    init: f64,
    x: f64,
    lambda: GeneratorObject,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl LogisticMap {
    pub fn from_args(args: &Args) -> Result<Self> {
        let init = args.number(0)?;
        if !(0.0..=1.0).contains(&init) {
            return Err(Error::ParameterObjectSyntax(format!(
                "logisticMap: init value {init} must be within the unit interval"
            )));
        }
        Ok(Self {
            init,
            x: init,
            lambda: args.generator(1)?,
            min: args.generator(2)?,
            max: args.generator(3)?,
        })
    }
}

impl Generator for LogisticMap {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let lambda = self.lambda.number(t, context).clamp(0.0, 4.0);
        self.x = unit::limit(logistic(lambda, self.x));
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(self.x, min, max))
    }

    fn reset(&mut self) {
        self.x = self.init;
        self.lambda.reset();
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Parse a readout string like `xy` into indices of the given axes.
fn parse_readout(name: &str, readout: &str, axes: &str) -> Result<Vec<usize>> {
    let readout = readout.trim().to_ascii_lowercase();
    let indices = readout
        .chars()
        .map(|c| axes.find(c))
        .collect::<Option<Vec<_>>>()
        .filter(|indices| !indices.is_empty());
    indices.ok_or_else(|| {
        Error::ParameterObjectSyntax(format!(
            "{name}: invalid readout '{readout}', expected a combination of '{axes}'"
        ))
    })
}

/// Read out steps of an attractor, normalize them and create a scaled selection.
fn attractor_selection(
    args: &Args,
    steps: Vec<Vec<f64>>,
    readout: &[usize],
    first: usize,
) -> Result<(Selector<f64>, GeneratorObject, GeneratorObject)> {
    let series = steps
        .iter()
        .flat_map(|step| readout.iter().map(|axis| step[*axis]))
        .collect::<Vec<_>>();
    let values = unit::norm_range(&series, None);
    let kind = args.option::<SelectorKind>(first + 2)?;
    Ok((
        Selector::new(values, kind, args.seed())?,
        args.generator(first)?,
        args.generator(first + 1)?,
    ))
}

fn step_count(args: &Args, index: usize) -> Result<usize> {
    let count = args.count(index)?;
    if count == 0 {
        return Err(Error::ParameterObjectSyntax(format!(
            "{}: count must be above zero",
            args.name()
        )));
    }
    Ok(count)
}

// -------------------------------------------------------------------------------------------------

/// Chooses from the normalized values of a Hénon attractor.
#[derive(Debug, Clone)]
pub struct HenonBasket {
    selector: Selector<f64>,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl HenonBasket {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (x, y) = (args.number(0)?, args.number(1)?);
        let (a, b) = (args.number(2)?, args.number(3)?);
        let count = step_count(args, 4)?;
        let readout = parse_readout("henonBasket", args.string(5)?, "xy")?;
        let mut henon = Henon::new(a, b, x, y);
        let steps = (0..count)
            .map(|_| {
                let (x, y) = henon.step(None, None);
                vec![x, y]
            })
            .collect();
        let (selector, min, max) = attractor_selection(args, steps, &readout, 6)?;
        Ok(Self { selector, min, max })
    }
}

impl Generator for HenonBasket {
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

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from the normalized values of a Lorenz attractor.
#[derive(Debug, Clone)]
pub struct LorenzBasket {
    selector: Selector<f64>,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl LorenzBasket {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (x, y, z) = (args.number(0)?, args.number(1)?, args.number(2)?);
        let (r, s, b) = (args.number(3)?, args.number(4)?, args.number(5)?);
        let count = step_count(args, 6)?;
        let readout = parse_readout("lorenzBasket", args.string(7)?, "xyz")?;
        let mut lorenz = Lorenz::new(r, s, b, x, y, z);
        let steps = (0..count)
            .map(|_| {
                let (x, y, z) = lorenz.step();
                vec![x, y, z]
            })
            .collect::<Vec<_>>();
        if steps.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::ParameterObjectSyntax(
                "lorenzBasket: the attractor diverges with the given coefficients".to_string(),
            ));
        }
        let (selector, min, max) = attractor_selection(args, steps, &readout, 8)?;
        Ok(Self { selector, min, max })
    }
}

impl Generator for LorenzBasket {
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

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn numbers(input: &str, count: usize) -> Result<Vec<f64>> {
        let mut generator = GeneratorObject::parse(input, 5)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| generator.number(i as f64, &context))
            .collect())
    }

    #[test]
    fn logistic_map() -> Result<()> {
        assert_eq!(numbers("lm, .5, 4, 0, 1", 2)?, vec![1.0, 0.0]);
        assert_eq!(numbers("lm, .5, 2, 10, 20", 2)?, vec![15.0, 15.0]);
        assert!(GeneratorObject::parse("lm, 2, 4, 0, 1", 1).is_err());
        Ok(())
    }

    #[test]
    fn attractors() -> Result<()> {
        let values = numbers("hb, .5, .5, 1.4, .3, 100, xy, 0, 1, oc", 200)?;
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(values.contains(&0.0) && values.contains(&1.0));
        let values = numbers("lb, 1, 1, 1, 28, 10, 2.67, 200, z, -1, 1, rc", 50)?;
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!(GeneratorObject::parse("hb, .5, .5, 1.4, .3, 100, q, 0, 1, oc", 1).is_err());
        assert!(GeneratorObject::parse("lb, 1, 1, 1, 28, 10, 2.67, 0, z, 0, 1, oc", 1).is_err());
        Ok(())
    }
}
