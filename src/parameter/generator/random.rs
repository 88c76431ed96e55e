//! Random values from unit interval distributions, scaled within dynamic boundaries.

use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
    random, unit,
};

// -------------------------------------------------------------------------------------------------

/// Distribution and its fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Distribution {
    Uniform,
    Linear,
    InverseLinear,
    Triangular,
    InverseTriangular,
    Exponential(f64),
    InverseExponential(f64),
    BilateralExponential(f64),
    Gauss(f64, f64),
    Cauchy(f64, f64),
    Beta(f64, f64),
    Weibull(f64, f64),
}

impl Distribution {
    /// Read the distribution for the given generator name. Returns the distribution and the
    /// number of consumed arguments.
    fn from_args(args: &Args) -> Result<(Self, usize)> {
        let distribution = match args.name() {
            "randomUniform" => (Self::Uniform, 0),
            "randomLinear" => (Self::Linear, 0),
            "randomInverseLinear" => (Self::InverseLinear, 0),
            "randomTriangular" => (Self::Triangular, 0),
            "randomInverseTriangular" => (Self::InverseTriangular, 0),
            "randomExponential" => (Self::Exponential(args.number(0)?), 1),
            "randomInverseExponential" => (Self::InverseExponential(args.number(0)?), 1),
            "randomBilateralExponential" => (Self::BilateralExponential(args.number(0)?), 1),
            "randomGauss" => (Self::Gauss(args.number(0)?, args.number(1)?), 2),
            "randomCauchy" => (Self::Cauchy(args.number(0)?, args.number(1)?), 2),
            "randomBeta" => (Self::Beta(args.number(0)?, args.number(1)?), 2),
            "randomWeibull" => (Self::Weibull(args.number(0)?, args.number(1)?), 2),
            name => {
                return Err(Error::ParameterObjectSyntax(format!(
                    "no random distribution named '{name}'"
                )))
            }
        };
        Ok(distribution)
    }

    fn sample(&self, rand_gen: &mut Xoshiro256PlusPlus) -> f64 {
        match *self {
            Self::Uniform => random::uniform(rand_gen),
            Self::Linear => random::linear(rand_gen),
            Self::InverseLinear => random::inverse_linear(rand_gen),
            Self::Triangular => random::triangular(rand_gen),
            Self::InverseTriangular => random::inverse_triangular(rand_gen),
            Self::Exponential(lambda) => random::exponential(rand_gen, lambda),
            Self::InverseExponential(lambda) => random::inverse_exponential(rand_gen, lambda),
            Self::BilateralExponential(lambda) => {
                random::bilateral_exponential(rand_gen, lambda)
            }
            Self::Gauss(mu, sigma) => random::gauss(rand_gen, mu, sigma),
            Self::Cauchy(alpha, mu) => random::cauchy(rand_gen, alpha, mu),
            Self::Beta(alpha, beta) => random::beta(rand_gen, alpha, beta),
            Self::Weibull(alpha, beta) => random::weibull(rand_gen, alpha, beta),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Seeded random values of a distribution, scaled within min and max.
#[derive(Debug, Clone)]
pub struct Random {
    distribution: Distribution,
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl Random {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (distribution, first) = Distribution::from_args(args)?;
        let seed = args.seed();
        Ok(Self {
            distribution,
            seed,
            rand_gen: random::new_rand_gen(seed),
            min: args.generator(first)?,
            max: args.generator(first + 1)?,
        })
    }
}

impl Generator for Random {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let value = self.distribution.sample(&mut self.rand_gen);
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.rand_gen = random::new_rand_gen(self.seed);
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
    use pretty_assertions::assert_eq;

    fn numbers(generator: &mut GeneratorObject, count: usize) -> Vec<f64> {
        let context = RefDict::default();
        (0..count)
            .map(|i| generator.number(i as f64, &context))
            .collect()
    }

    #[test]
    fn ranges() -> Result<()> {
        for name in [
            "ru", "rl", "ril", "rt", "rit", "re", "rie", "rbe", "rg", "rc", "rb", "rw",
        ] {
            let mut generator = GeneratorObject::parse(name, 42)?;
            let values = numbers(&mut generator, 200);
            assert!(
                values.iter().all(|v| (0.0..=1.0).contains(v)),
                "{name} out of range"
            );
        }
        let mut generator = GeneratorObject::parse("ru, 10, (c, 20)", 42)?;
        assert!(numbers(&mut generator, 100)
            .iter()
            .all(|v| (10.0..=20.0).contains(v)));
        Ok(())
    }

    #[test]
    fn seeding() -> Result<()> {
        let mut a = GeneratorObject::parse("rg, .5, .2, 0, 1", 7)?;
        let mut b = GeneratorObject::parse("rg, .5, .2, 0, 1", 7)?;
        let mut c = GeneratorObject::parse("rg, .5, .2, 0, 1", 8)?;
        let values = numbers(&mut a, 20);
        assert_eq!(values, numbers(&mut b, 20));
        assert_ne!(values, numbers(&mut c, 20));
        a.reset();
        assert_eq!(values, numbers(&mut a, 20));
        Ok(())
    }

    #[test]
    fn distributions() -> Result<()> {
        // linear values favor the lower half, inverse linear values the upper half
        let mean = |input: &str| -> Result<f64> {
            let mut generator = GeneratorObject::parse(input, 3)?;
            Ok(numbers(&mut generator, 2000).iter().sum::<f64>() / 2000.0)
        };
        assert!(mean("rl, 0, 1")? < 0.45);
        assert!(mean("ril, 0, 1")? > 0.55);
        assert!((mean("rg, .5, .05, 0, 1")? - 0.5).abs() < 0.05);
        Ok(())
    }
}
