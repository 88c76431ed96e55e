//! Generators driven by generative systems: Markov chains, L-systems, feedback systems and
//! cellular automata.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    automata::{Automaton, CaSpecification, TableFormat},
    error::{Error, Result},
    feedback::{FeedbackEnvironment, FeedbackModel},
    grammar::Grammar,
    markov::{Transition, MARKOV_HISTORY_LIMIT},
    parameter::{Args, Generator, GeneratorObject, OutputFormat, RefDict, Value},
    random::new_rand_gen,
    selector::{Selector, SelectorKind},
    unit,
};

// -------------------------------------------------------------------------------------------------

fn string_value(value: &str) -> Value {
    match value.trim().parse::<f64>() {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(value.to_string()),
    }
}

fn values_format(values: &[&str]) -> OutputFormat {
    if values.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
        OutputFormat::Number
    } else {
        OutputFormat::String
    }
}

/// A Markov chain walk with history, shared by Markov generators and rhythms.
#[derive(Debug, Clone)]
pub(crate) struct MarkovWalk {
    transition: Transition,
    history: Vec<String>,
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
}

impl MarkovWalk {
    pub fn new(transition: Transition, seed: u64) -> Self {
        Self {
            transition,
            history: Vec::new(),
            seed,
            rand_gen: new_rand_gen(seed),
        }
    }

    /// Select the next value with the given order. On errors, the last value is repeated.
    pub fn next(&mut self, order: f64, name: &str, t: f64) -> Option<String> {
        let order = order.round().max(0.0) as usize;
        let unit_value = self.rand_gen.random::<f64>();
        match self.transition.next(unit_value, &self.history, order) {
            Ok(value) => {
                let value = value.to_string();
                self.history.push(value.clone());
                if self.history.len() > MARKOV_HISTORY_LIMIT {
                    self.history.remove(0);
                }
                Some(value)
            }
            Err(err) => {
                log::warn!("{name}: {err} at time {t}, using last value");
                self.history.last().cloned()
            }
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.rand_gen = new_rand_gen(self.seed);
    }
}

// -------------------------------------------------------------------------------------------------

/// Values of a Markov chain with a dynamic order.
#[derive(Debug, Clone)]
pub struct MarkovValue {
    walk: MarkovWalk,
    order: GeneratorObject,
    format: OutputFormat,
}

impl MarkovValue {
    pub fn from_args(args: &Args) -> Result<Self> {
        let transition = Transition::try_from(args.string(0)?)
            .map_err(|err| err.with_context("markovValue"))?;
        let format = values_format(&transition.values());
        Ok(Self {
            walk: MarkovWalk::new(transition, args.seed()),
            order: args.generator(1)?,
            format,
        })
    }
}

impl Generator for MarkovValue {
    fn output_format(&self) -> OutputFormat {
        self.format
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let order = self.order.number(t, context);
        self.walk
            .next(order, "markovValue", t)
            .map_or(Value::default(), |value| string_value(&value))
    }

    fn reset(&mut self) {
        self.walk.reset();
        self.order.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Values of a Markov chain, created by analysing `count` values of a generator on first use.
#[derive(Debug, Clone)]
pub struct MarkovGeneratorAnalysis {
    source: GeneratorObject,
    count: usize,
    max_order: usize,
    order: GeneratorObject,
    seed: u64,
    walk: Option<MarkovWalk>,
}

impl MarkovGeneratorAnalysis {
    pub fn from_args(args: &Args) -> Result<Self> {
        let count = args.count(1)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(
                "markovGeneratorAnalysis: count must be above zero".to_string(),
            ));
        }
        Ok(Self {
            source: args.generator(0)?,
            count,
            max_order: args.count(2)?,
            order: args.generator(3)?,
            seed: args.seed(),
            walk: None,
        })
    }
}

impl Generator for MarkovGeneratorAnalysis {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.walk.is_none() {
            let values = (0..self.count)
                .map(|_| self.source.value(t, context).to_string())
                .collect::<Vec<_>>();
            match Transition::from_analysis(&values, self.max_order) {
                Ok(transition) => self.walk = Some(MarkovWalk::new(transition, self.seed)),
                Err(err) => {
                    log::warn!("markovGeneratorAnalysis: {err} at time {t}");
                    return Value::default();
                }
            }
        }
        let order = self.order.number(t, context);
        self.walk
            .as_mut()
            .and_then(|walk| walk.next(order, "markovGeneratorAnalysis", t))
            .map_or(Value::default(), |value| string_value(&value))
    }

    fn reset(&mut self) {
        self.source.reset();
        self.order.reset();
        self.walk = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses from the values of an L-system state, rewritten `steps` times.
#[derive(Debug, Clone)]
pub struct GrammarTerminus {
    selector: Selector<Value>,
    format: OutputFormat,
}

impl GrammarTerminus {
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut grammar = Grammar::try_from(args.string(0)?)
            .map_err(|err| err.with_context("grammarTerminus"))?;
        let steps = args.count(1)?;
        let mut rand_gen = new_rand_gen(args.seed());
        for _ in 0..steps {
            grammar.next(&mut rand_gen);
        }
        let state = grammar.state_values();
        let format = values_format(&state);
        let values = state.into_iter().map(string_value).collect::<Vec<_>>();
        let kind = args.option::<SelectorKind>(2)?;
        Ok(Self {
            selector: Selector::new(values, kind, args.seed())
                .map_err(|err| err.with_context("grammarTerminus"))?,
            format,
        })
    }
}

impl Generator for GrammarTerminus {
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

/// Particle counts of a feedback system, relative to its dynamic threshold and scaled within
/// min and max.
#[derive(Debug, Clone)]
pub struct FeedbackModelLibrary {
    environment: FeedbackEnvironment,
    age_step: GeneratorObject,
    threshold: GeneratorObject,
    min: GeneratorObject,
    max: GeneratorObject,
}

/// Particle threshold for a unit interval value.
fn feedback_threshold(value: f64) -> usize {
    ((unit::limit(value) * 100.0).round() as usize).max(1)
}

impl FeedbackModelLibrary {
    pub fn from_args(args: &Args) -> Result<Self> {
        let model = args.option::<FeedbackModel>(0)?;
        Ok(Self {
            environment: FeedbackEnvironment::new(model, 1),
            age_step: args.generator(1)?,
            threshold: args.generator(2)?,
            min: args.generator(3)?,
            max: args.generator(4)?,
        })
    }
}

impl Generator for FeedbackModelLibrary {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let threshold = feedback_threshold(self.threshold.number(t, context));
        self.environment.set_threshold(threshold);
        let age_step = self.age_step.number(t, context).abs();
        if let Err(err) = self.environment.advance(age_step) {
            log::warn!("feedbackModelLibrary: {err} at time {t}");
        }
        let count = self.environment.particle_count() as f64;
        let value = unit::limit(count / (threshold as f64 * 2.0));
        let min = self.min.number(t, context);
        let max = self.max.number(t, context);
        Value::Number(unit::denorm(value, min, max))
    }

    fn reset(&mut self) {
        self.environment.reset();
        self.age_step.reset();
        self.threshold.reset();
        self.min.reset();
        self.max.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Run an automaton over all generations of its specification, evaluating the rule and
/// mutation generators per generation.
fn run_automaton(args: &Args, normalize: bool) -> Result<Vec<f64>> {
    let spec = CaSpecification::try_from(args.string(0)?)
        .map_err(|err| err.with_context(args.name()))?;
    let mut rule = args.generator(1)?;
    let mut mutation = args.generator(2)?;
    let table = args.option::<TableFormat>(3)?;
    let context = RefDict::default();
    let steps = spec.total_steps();
    let mut automaton = Automaton::new(
        spec,
        rule.number(0.0, &context),
        mutation.number(0.0, &context),
        args.seed(),
    );
    for step in 1..=steps {
        let t = step as f64;
        let (r, m) = (rule.number(t, &context), mutation.number(t, &context));
        automaton.gen(1, Some(r), Some(m));
    }
    let values = automaton.extract(table, normalize);
    if values.is_empty() {
        return Err(Error::ParameterObjectSyntax(format!(
            "{}: the automaton table '{table}' has no values",
            args.name()
        )));
    }
    Ok(values)
}

/// Chooses from the normalized values of a cellular automaton, scaled within min and max.
#[derive(Debug, Clone)]
pub struct CaValue {
    selector: Selector<f64>,
    min: GeneratorObject,
    max: GeneratorObject,
}

impl CaValue {
    pub fn from_args(args: &Args) -> Result<Self> {
        let values = run_automaton(args, true)?;
        Ok(Self {
            selector: Selector::new(values, args.option(6)?, args.seed())?,
            min: args.generator(4)?,
            max: args.generator(5)?,
        })
    }
}

impl Generator for CaValue {
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

/// Chooses from the raw values of a cellular automaton.
#[derive(Debug, Clone)]
pub struct CaList {
    selector: Selector<f64>,
}

impl CaList {
    pub fn from_args(args: &Args) -> Result<Self> {
        let values = run_automaton(args, false)?;
        Ok(Self {
            selector: Selector::new(values, args.option(4)?, args.seed())?,
        })
    }
}

impl Generator for CaList {
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

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(input: &str, count: usize) -> Result<Vec<String>> {
        let mut generator = GeneratorObject::parse(input, 13)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| generator.value(i as f64, &context).to_string())
            .collect())
    }

    #[test]
    fn markov() -> Result<()> {
        // deterministic first order chain
        let chain = values("mv, a{1}b{2}:{a=1|b=1}a:{b=1}b:{a=1}, (c, 1)", 6)?;
        for pair in chain.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        // zero order with a single weighted symbol
        assert_eq!(
            values("mv, a{x}b{y}:{a=0|b=1}, 0", 3)?,
            vec!["y", "y", "y"]
        );
        assert!(GeneratorObject::parse("mv, a{1}:{c=1}, 0", 1).is_err());
        let mut generator = GeneratorObject::parse("mv, a{1}b{2}:{a=1|b=1}, 0", 1)?;
        let context = RefDict::default();
        let first = (0..10).map(|i| generator.number(i as f64, &context)).collect::<Vec<_>>();
        generator.reset();
        let second = (0..10).map(|i| generator.number(i as f64, &context)).collect::<Vec<_>>();
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn markov_analysis() -> Result<()> {
        // a strict alternation analysed at first order alternates
        let values = values("mga, (bg, oc, (3, 5)), 10, 1, (c, 1)", 6)?;
        for pair in values.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert!(values.iter().all(|v| v == "3" || v == "5"));
        Ok(())
    }

    #[test]
    fn grammar() -> Result<()> {
        assert_eq!(
            values("gt, a{1}b{2}@a{ab}b{b}@a, 2, oc", 4)?,
            vec!["1", "2", "2", "1"]
        );
        assert!(GeneratorObject::parse("gt, a{1}@a{c}@a, 2, oc", 1).is_err());
        Ok(())
    }

    #[test]
    fn feedback() -> Result<()> {
        let mut generator = GeneratorObject::parse("fml, cc, 1, .3, 0, 1", 1)?;
        let context = RefDict::default();
        let values = (0..50)
            .map(|i| generator.number(i as f64, &context))
            .collect::<Vec<_>>();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(values[20..].iter().any(|v| *v > 0.0));
        assert_eq!(feedback_threshold(0.0), 1);
        assert_eq!(feedback_threshold(0.9), 90);
        Ok(())
    }

    #[test]
    fn automata() -> Result<()> {
        let values = values("cv, f{s}x{11}y{5}, 90, 0, sr, 0, 1, oc", 5)?;
        assert_eq!(values.len(), 5);
        let mut generator = GeneratorObject::parse("cl, f{s}x{11}y{5}, 90, 0, f, oc", 1)?;
        let context = RefDict::default();
        let cells = (0..55)
            .map(|i| generator.number(i as f64, &context))
            .collect::<Vec<_>>();
        assert!(cells.iter().all(|c| *c == 0.0 || *c == 1.0));
        assert!(cells.contains(&1.0));
        assert!(GeneratorObject::parse("cv, f{s, 90, 0, sr, 0, 1, oc", 1).is_err());
        Ok(())
    }
}
