//! Arithmetic combinations of two generators.

use crate::{
    error::{Error, Result},
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
};

// -------------------------------------------------------------------------------------------------

/// Binary operations of [`Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Congruence,
}

impl Operation {
    /// Apply the operation. Returns `None` for undefined results.
    pub fn apply(&self, a: f64, b: f64) -> Option<f64> {
        let result = match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide if b == 0.0 => return None,
            Self::Divide => a / b,
            Self::Power => a.powf(b),
            Self::Congruence if b == 0.0 => return None,
            Self::Congruence => a.rem_euclid(b),
        };
        result.is_finite().then_some(result)
    }
}

impl TryFrom<&str> for Operation {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value {
            "operatorAdd" => Ok(Self::Add),
            "operatorSubtract" => Ok(Self::Subtract),
            "operatorMultiply" => Ok(Self::Multiply),
            "operatorDivide" => Ok(Self::Divide),
            "operatorPower" => Ok(Self::Power),
            "operatorCongruence" => Ok(Self::Congruence),
            _ => Err(format!("no operator named '{value}'")),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Combines the values of two generators. Undefined results fall back to the first operand.
#[derive(Debug, Clone)]
pub struct Operator {
    operation: Operation,
    a: GeneratorObject,
    b: GeneratorObject,
}

impl Operator {
    pub fn from_args(args: &Args) -> Result<Self> {
        let operation = Operation::try_from(args.name()).map_err(Error::ParameterObjectSyntax)?;
        Ok(Self {
            operation,
            a: args.generator(0)?,
            b: args.generator(1)?,
        })
    }
}

impl Generator for Operator {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let a = self.a.number(t, context);
        let b = self.b.number(t, context);
        let value = self.operation.apply(a, b).unwrap_or_else(|| {
            log::warn!("{:?}: undefined result for {a} and {b} at time {t}", self.operation);
            a
        });
        Value::Number(value)
    }

    fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
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
            .map(|i| generator.number(i as f64, &context))
            .collect())
    }

    #[test]
    fn operations() -> Result<()> {
        let b = "(bg, oc, (2, 0))";
        assert_eq!(numbers(&format!("oa, 5, {b}"), 2)?, vec![7.0, 5.0]);
        assert_eq!(numbers(&format!("os, 5, {b}"), 2)?, vec![3.0, 5.0]);
        assert_eq!(numbers(&format!("om, 5, {b}"), 2)?, vec![10.0, 0.0]);
        assert_eq!(numbers(&format!("od, 5, {b}"), 2)?, vec![2.5, 5.0]);
        assert_eq!(numbers(&format!("op, 5, {b}"), 2)?, vec![25.0, 1.0]);
        assert_eq!(numbers(&format!("oc, 5, {b}"), 2)?, vec![1.0, 5.0]);
        assert_eq!(numbers("oc, -1, 3", 1)?, vec![2.0]);
        Ok(())
    }

    #[test]
    fn nested() -> Result<()> {
        assert_eq!(
            numbers("oa, (om, 2, (cg, u, 0, 2, 1)), 1", 4)?,
            vec![1.0, 3.0, 5.0, 1.0]
        );
        Ok(())
    }
}
