//! Validated, typed access to the arguments of a parameter object.

use crate::{
    error::{Error, Result},
    pulse::Pulse,
    random::derive_seed,
};

use super::{registry, Arg, FilterObject, GeneratorObject, RhythmObject};

// -------------------------------------------------------------------------------------------------

/// The complete arguments of a parameter object: supplied values, followed by defaults for all
/// missing trailing values.
#[derive(Debug, Clone)]
pub struct Args {
    name: &'static str,
    values: Vec<Arg>,
    seed: u64,
}

impl Args {
    /// Merge supplied arguments with defaults. More supplied than declared arguments is an
    /// error.
    pub fn new(name: &'static str, supplied: &[Arg], defaults: &[Arg], seed: u64) -> Result<Self> {
        if supplied.len() > defaults.len() {
            return Err(Error::ParameterObjectSyntax(format!(
                "{name}: too many arguments, expected at most {}, got {}",
                defaults.len(),
                supplied.len()
            )));
        }
        let values = supplied
            .iter()
            .cloned()
            .chain(defaults[supplied.len()..].iter().cloned())
            .collect();
        Ok(Self { name, values, seed })
    }

    /// Long name of the parameter object.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The complete argument tree, including the object name.
    pub fn to_arg(&self) -> Arg {
        let mut items = vec![Arg::String(self.name.to_string())];
        items.extend(self.values.iter().cloned());
        Arg::List(items)
    }

    /// Seed of the object itself.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for a nested object at the given argument position.
    pub fn seed_at(&self, index: usize) -> u64 {
        derive_seed(self.seed, index as u64 + 1)
    }

    fn error(&self, index: usize, message: impl std::fmt::Display) -> Error {
        Error::ParameterObjectSyntax(format!(
            "{} argument {}: {message}",
            self.name,
            index + 1
        ))
    }

    /// Raw argument at the given position.
    pub fn get(&self, index: usize) -> Result<&Arg> {
        self.values
            .get(index)
            .ok_or_else(|| self.error(index, "missing argument"))
    }

    pub fn number(&self, index: usize) -> Result<f64> {
        let arg = self.get(index)?;
        arg.as_f64()
            .ok_or_else(|| self.error(index, format!("expected a number, got '{arg}'")))
    }

    /// A number, rounded to the nearest integer.
    pub fn integer(&self, index: usize) -> Result<i64> {
        Ok(self.number(index)?.round() as i64)
    }

    /// A non negative integer.
    pub fn count(&self, index: usize) -> Result<usize> {
        let value = self.integer(index)?;
        if value < 0 {
            return Err(self.error(index, format!("expected a positive number, got {value}")));
        }
        Ok(value as usize)
    }

    pub fn string(&self, index: usize) -> Result<&str> {
        let arg = self.get(index)?;
        arg.as_str()
            .ok_or_else(|| self.error(index, format!("expected a string, got '{arg}'")))
    }

    /// A string option, matched by name or alias.
    pub fn option<T>(&self, index: usize) -> Result<T>
    where
        T: for<'a> TryFrom<&'a str, Error = String>,
    {
        let arg = self.get(index)?;
        let text = match arg {
            Arg::String(text) => text.clone(),
            Arg::Number(value) => value.to_string(),
            Arg::List(_) => return Err(self.error(index, format!("expected an option, got '{arg}'"))),
        };
        T::try_from(text.as_str()).map_err(|err| self.error(index, err))
    }

    /// `on` / `off` switches. Numbers are true when not zero.
    pub fn switch(&self, index: usize) -> Result<bool> {
        match self.get(index)? {
            Arg::Number(value) => Ok(*value != 0.0),
            Arg::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" | "1" => Ok(true),
                "off" | "false" | "no" | "0" => Ok(false),
                _ => Err(self.error(index, format!("expected on or off, got '{text}'"))),
            },
            arg => Err(self.error(index, format!("expected on or off, got '{arg}'"))),
        }
    }

    pub fn list(&self, index: usize) -> Result<&[Arg]> {
        let arg = self.get(index)?;
        arg.as_list()
            .ok_or_else(|| self.error(index, format!("expected a list, got '{arg}'")))
    }

    /// A list of numbers. A single number is a list with one value.
    pub fn numbers(&self, index: usize) -> Result<Vec<f64>> {
        match self.get(index)? {
            Arg::Number(value) => Ok(vec![*value]),
            arg => arg
                .as_list()
                .ok_or_else(|| self.error(index, format!("expected a list, got '{arg}'")))?
                .iter()
                .map(|item| {
                    item.as_f64().ok_or_else(|| {
                        self.error(index, format!("expected a number, got '{item}'"))
                    })
                })
                .collect(),
        }
    }

    /// A non empty list of numbers.
    pub fn values(&self, index: usize) -> Result<Vec<f64>> {
        let values = self.numbers(index)?;
        if values.is_empty() {
            return Err(self.error(index, "expected at least one value"));
        }
        Ok(values)
    }

    /// A list of (x, y) points.
    pub fn points(&self, index: usize) -> Result<Vec<(f64, f64)>> {
        self.list(index)?
            .iter()
            .map(|item| match item.as_list() {
                Some([x, y]) => match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => Ok((x, y)),
                    _ => Err(self.error(index, format!("invalid point '{item}'"))),
                },
                _ => Err(self.error(index, format!("expected an (x, y) point, got '{item}'"))),
            })
            .collect()
    }

    /// A generator. Numbers are wrapped into constants, bare names use defaults.
    pub fn generator(&self, index: usize) -> Result<GeneratorObject> {
        registry::load_generator(self.get(index)?, self.seed_at(index))
            .map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))
    }

    /// A generator, or a rhythm whose durations are used as values.
    pub fn generator_or_rhythm(&self, index: usize) -> Result<GeneratorObject> {
        let arg = self.get(index)?;
        let seed = self.seed_at(index);
        let is_rhythm = arg
            .object_name()
            .is_some_and(|name| registry::is_rhythm(name) && !registry::is_generator(name));
        let result = if is_rhythm {
            registry::load_rhythm(arg, seed).map(super::rhythm::RhythmDuration::wrap)
        } else {
            registry::load_generator(arg, seed)
        };
        result.map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))
    }

    /// A list of generators.
    pub fn generators(&self, index: usize) -> Result<Vec<GeneratorObject>> {
        let seed = self.seed_at(index);
        let generators = self
            .list(index)?
            .iter()
            .enumerate()
            .map(|(i, item)| registry::load_generator(item, derive_seed(seed, i as u64)))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))?;
        if generators.is_empty() {
            return Err(self.error(index, "expected at least one generator"));
        }
        Ok(generators)
    }

    pub fn rhythm(&self, index: usize) -> Result<RhythmObject> {
        registry::load_rhythm(self.get(index)?, self.seed_at(index))
            .map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))
    }

    pub fn rhythms(&self, index: usize) -> Result<Vec<RhythmObject>> {
        let seed = self.seed_at(index);
        let rhythms = self
            .list(index)?
            .iter()
            .enumerate()
            .map(|(i, item)| registry::load_rhythm(item, derive_seed(seed, i as u64)))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))?;
        if rhythms.is_empty() {
            return Err(self.error(index, "expected at least one rhythm"));
        }
        Ok(rhythms)
    }

    pub fn filters(&self, index: usize) -> Result<Vec<FilterObject>> {
        let seed = self.seed_at(index);
        self.list(index)?
            .iter()
            .enumerate()
            .map(|(i, item)| registry::load_filter(item, derive_seed(seed, i as u64)))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.with_context(&format!("{} argument {}", self.name, index + 1)))
    }

    /// A single pulse, given as list or string.
    pub fn pulse(&self, index: usize) -> Result<Pulse> {
        parse_pulse(self.get(index)?).map_err(|err| self.error(index, err))
    }

    /// A non empty list of pulses.
    pub fn pulses(&self, index: usize) -> Result<Vec<Pulse>> {
        let pulses = self
            .list(index)?
            .iter()
            .map(parse_pulse)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| self.error(index, err))?;
        if pulses.is_empty() {
            return Err(self.error(index, "expected at least one pulse"));
        }
        Ok(pulses)
    }
}

/// Parse a pulse from a list of numbers and dynamics, or from a duration string.
pub fn parse_pulse(arg: &Arg) -> Result<Pulse> {
    match arg {
        Arg::List(items) => {
            let text = items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            Pulse::try_from(text.as_str())
        }
        Arg::String(text) => Pulse::try_from(text.as_str()),
        Arg::Number(value) => Pulse::try_from(value.to_string().as_str()),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::selector::SelectorKind;

    fn args(supplied: &str, defaults: &str) -> Result<Args> {
        let list = |s: &str| -> Result<Vec<Arg>> {
            Ok(match Arg::parse(&format!("({s})"))? {
                Arg::List(items) => items,
                other => vec![other],
            })
        };
        Args::new("test", &list(supplied)?, &list(defaults)?, 1)
    }

    #[test]
    fn defaults() -> Result<()> {
        let args = args("rw", "rc, (1, 2), 3, on")?;
        assert_eq!(args.len(), 4);
        assert_eq!(args.option::<SelectorKind>(0)?, SelectorKind::RandomWalk);
        assert_eq!(args.numbers(1)?, vec![1.0, 2.0]);
        assert_eq!(args.count(2)?, 3);
        assert!(args.switch(3)?);
        assert!(args.string(1).is_err());
        assert!(args.option::<SelectorKind>(2).is_err());
        assert!(Args::new("test", &[Arg::Number(1.0), Arg::Number(2.0)], &[Arg::Number(0.0)], 1)
            .is_err());
        Ok(())
    }

    #[test]
    fn pulses() -> Result<()> {
        let args = args("((3, 1, 1), (4, 1, 0), q, (2, 1, mf))", "()")?;
        let pulses = args.pulses(0)?;
        assert_eq!(pulses.len(), 4);
        assert_eq!(pulses[1].accent(), 0.0);
        assert_eq!(pulses[2].divisor(), 1.0);
        Ok(())
    }
}
