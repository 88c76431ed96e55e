//! Iterators over other generators: grouping, windowing, holding, crossing and sampling.

use std::cell::Cell;

use crate::{
    error::Result,
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
    selector::{Selector, SelectorKind},
    unit,
};

use super::basket::unit_index;

// -------------------------------------------------------------------------------------------------

/// Maximum number of consecutive skip groups before a value is forced.
const SKIP_LIMIT: usize = 100;

/// Group counts: positive counts use values, negative counts skip them.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupCounter {
    remaining: usize,
}

impl GroupCounter {
    /// True when a new group count needs to be drawn.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn start(&mut self, count: usize) {
        self.remaining = count;
    }

    pub fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

/// Draw group counts until a positive one is found, calling `skip` for negative counts.
/// Returns the positive count, or 1 when the skip limit is exceeded.
pub(crate) fn next_group(
    name: &str,
    t: f64,
    mut draw: impl FnMut() -> i64,
    mut skip: impl FnMut(usize),
) -> usize {
    for _ in 0..SKIP_LIMIT {
        let count = draw();
        if count > 0 {
            return count as usize;
        }
        skip(count.unsigned_abs() as usize);
    }
    log::warn!("{name}: no positive group count found at time {t}, using 1");
    1
}

// -------------------------------------------------------------------------------------------------

/// Repeats values of a generator for positive group counts, skips them for negative ones.
#[derive(Debug, Clone)]
pub struct IterateGroup {
    source: GeneratorObject,
    group: GeneratorObject,
    counter: GroupCounter,
    current: Value,
}

impl IterateGroup {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.generator(0)?,
            group: args.generator(1)?,
            counter: GroupCounter::default(),
            current: Value::default(),
        })
    }
}

impl Generator for IterateGroup {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.counter.is_exhausted() {
            let (source, group) = (&mut self.source, &mut self.group);
            let count = next_group(
                "iterateGroup",
                t,
                || group.number(t, context).round() as i64,
                |skip| {
                    for _ in 0..skip {
                        source.value(t, context);
                    }
                },
            );
            self.current = self.source.value(t, context);
            self.counter.start(count);
        }
        self.counter.advance();
        self.current.clone()
    }

    fn reset(&mut self) {
        self.source.reset();
        self.group.reset();
        self.counter.reset();
        self.current = Value::default();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses a generator with a selector, then takes values from it for positive group counts
/// or skips its values for negative ones.
#[derive(Debug, Clone)]
pub struct IterateWindow {
    sources: Vec<GeneratorObject>,
    group: GeneratorObject,
    selector: Selector<usize>,
    counter: GroupCounter,
    active: usize,
}

impl IterateWindow {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sources = args.generators(0)?;
        let kind = args.option::<SelectorKind>(2)?;
        let selector = Selector::new((0..sources.len()).collect(), kind, args.seed())?;
        Ok(Self {
            sources,
            group: args.generator(1)?,
            selector,
            counter: GroupCounter::default(),
            active: 0,
        })
    }
}

impl Generator for IterateWindow {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.counter.is_exhausted() {
            let active = Cell::new(self.active);
            let (sources, group, selector) =
                (&mut self.sources, &mut self.group, &mut self.selector);
            let count = next_group(
                "iterateWindow",
                t,
                || {
                    active.set(selector.next());
                    group.number(t, context).round() as i64
                },
                |skip| {
                    for _ in 0..skip {
                        sources[active.get()].value(t, context);
                    }
                },
            );
            self.active = active.get();
            self.counter.start(count);
        }
        self.counter.advance();
        self.sources[self.active].value(t, context)
    }

    fn reset(&mut self) {
        self.sources.iter_mut().for_each(GeneratorObject::reset);
        self.group.reset();
        self.selector.reset();
        self.counter.reset();
        self.active = 0;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// A list of generated values which is refilled after a generated number of evaluations.
#[derive(Debug, Clone)]
pub(crate) struct HoldBuffer<T> {
    values: Vec<T>,
    since_refresh: usize,
    refresh_at: usize,
}

impl<T> HoldBuffer<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            since_refresh: 0,
            refresh_at: 0,
        }
    }

    /// Refill the buffer with `source` when needed. Returns true when new values were collected.
    pub fn update(
        &mut self,
        t: f64,
        context: &RefDict,
        mut source: impl FnMut() -> T,
        fill: &mut GeneratorObject,
        refresh: &mut GeneratorObject,
    ) -> bool {
        let refilled = if self.values.is_empty() || self.since_refresh >= self.refresh_at {
            let count = fill.number(t, context).round().max(1.0) as usize;
            self.values = (0..count).map(|_| source()).collect();
            self.refresh_at = refresh.number(t, context).round().max(1.0) as usize;
            self.since_refresh = 0;
            true
        } else {
            false
        };
        self.since_refresh += 1;
        refilled
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Chooses with a selector from a periodically refilled list of generated values.
#[derive(Debug, Clone)]
pub struct IterateHold {
    source: GeneratorObject,
    fill: GeneratorObject,
    refresh: GeneratorObject,
    kind: SelectorKind,
    seed: u64,
    buffer: HoldBuffer<Value>,
    selector: Option<Selector<Value>>,
}

impl IterateHold {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.generator(0)?,
            fill: args.generator(1)?,
            refresh: args.generator(2)?,
            kind: args.option(3)?,
            seed: args.seed(),
            buffer: HoldBuffer::new(),
            selector: None,
        })
    }
}

impl Generator for IterateHold {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let source = &mut self.source;
        let refilled = self.buffer.update(
            t,
            context,
            || source.value(t, context),
            &mut self.fill,
            &mut self.refresh,
        );
        if refilled || self.selector.is_none() {
            let values = self.buffer.values().to_vec();
            match self.selector.as_mut() {
                Some(selector) => {
                    if let Err(err) = selector.update(values) {
                        log::warn!("iterateHold: {err} at time {t}");
                    }
                }
                None => self.selector = Selector::new(values, self.kind, self.seed).ok(),
            }
        }
        self.selector
            .as_mut()
            .map_or(Value::default(), Selector::next)
    }

    fn reset(&mut self) {
        self.source.reset();
        self.fill.reset();
        self.refresh.reset();
        self.buffer.reset();
        self.selector = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Interpolates between the values of two generators with a unit interval generator.
#[derive(Debug, Clone)]
pub struct IterateCross {
    a: GeneratorObject,
    b: GeneratorObject,
    interpolation: GeneratorObject,
}

impl IterateCross {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            a: args.generator(0)?,
            b: args.generator(1)?,
            interpolation: args.generator(2)?,
        })
    }
}

impl Generator for IterateCross {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let a = self.a.number(t, context);
        let b = self.b.number(t, context);
        let position = unit::limit(self.interpolation.number(t, context));
        Value::Number(a + (b - a) * position)
    }

    fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
        self.interpolation.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses with a unit interval generator from a periodically refilled list of values.
#[derive(Debug, Clone)]
pub struct IterateSelect {
    source: GeneratorObject,
    fill: GeneratorObject,
    refresh: GeneratorObject,
    unit: GeneratorObject,
    buffer: HoldBuffer<Value>,
}

impl IterateSelect {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.generator(0)?,
            fill: args.generator(1)?,
            refresh: args.generator(2)?,
            unit: args.generator(3)?,
            buffer: HoldBuffer::new(),
        })
    }
}

impl Generator for IterateSelect {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let source = &mut self.source;
        self.buffer.update(
            t,
            context,
            || source.value(t, context),
            &mut self.fill,
            &mut self.refresh,
        );
        let values = self.buffer.values();
        let index = unit_index(self.unit.number(t, context), values.len());
        values.get(index).cloned().unwrap_or_default()
    }

    fn reset(&mut self) {
        self.source.reset();
        self.fill.reset();
        self.refresh.reset();
        self.unit.reset();
        self.buffer.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Comparison of a trigger value with a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Equal => value == threshold,
            Self::GreaterThan => value > threshold,
            Self::GreaterThanOrEqual => value >= threshold,
            Self::LessThan => value < threshold,
            Self::LessThanOrEqual => value <= threshold,
        }
    }
}

impl TryFrom<&str> for Comparison {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equal" | "e" => Ok(Self::Equal),
            "greaterthan" | "gt" => Ok(Self::GreaterThan),
            "greaterthanorequal" | "gte" => Ok(Self::GreaterThanOrEqual),
            "lessthan" | "lt" => Ok(Self::LessThan),
            "lessthanorequal" | "lte" => Ok(Self::LessThanOrEqual),
            _ => Err(format!(
                "invalid comparison '{value}', expected one of 'e', 'gt', 'gte', 'lt', 'lte'"
            )),
        }
    }
}

/// Samples a continuously running generator when a trigger passes a threshold, and holds
/// the sampled value otherwise.
#[derive(Debug, Clone)]
pub struct SampleAndHold {
    comparison: Comparison,
    source: GeneratorObject,
    trigger: GeneratorObject,
    threshold: GeneratorObject,
    held: Option<Value>,
}

impl SampleAndHold {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            comparison: args.option(0)?,
            source: args.generator(1)?,
            trigger: args.generator(2)?,
            threshold: args.generator(3)?,
            held: None,
        })
    }
}

impl Generator for SampleAndHold {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let value = self.source.value(t, context);
        let trigger = self.trigger.number(t, context);
        let threshold = self.threshold.number(t, context);
        if self.held.is_none() || self.comparison.compare(trigger, threshold) {
            self.held = Some(value);
        }
        self.held.clone().unwrap_or_default()
    }

    fn reset(&mut self) {
        self.source.reset();
        self.trigger.reset();
        self.threshold.reset();
        self.held = None;
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
        let mut generator = GeneratorObject::parse(input, 17)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| generator.number(i as f64, &context))
            .collect())
    }

    const COUNTER: &str = "(cg, u, 0, 20, 1)";

    #[test]
    fn group() -> Result<()> {
        assert_eq!(
            numbers(&format!("ig, {COUNTER}, (bg, oc, (2, -1))"), 6)?,
            vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0]
        );
        // only skips still produce values
        assert_eq!(numbers(&format!("ig, {COUNTER}, -1"), 1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn window() -> Result<()> {
        assert_eq!(
            numbers(
                &format!("iw, ({COUNTER}, (bg, oc, (10, 11))), (bg, oc, (2, 1)), oc"),
                6
            )?,
            vec![0.0, 1.0, 10.0, 2.0, 3.0, 11.0]
        );
        Ok(())
    }

    #[test]
    fn hold_and_select() -> Result<()> {
        assert_eq!(
            numbers(&format!("ih, {COUNTER}, 2, 4, oc"), 6)?,
            vec![0.0, 1.0, 0.0, 1.0, 2.0, 3.0]
        );
        assert_eq!(
            numbers(&format!("is, {COUNTER}, 3, 2, (bg, oc, (0, 1))"), 4)?,
            vec![0.0, 2.0, 3.0, 5.0]
        );
        Ok(())
    }

    #[test]
    fn cross_and_sample() -> Result<()> {
        assert_eq!(numbers("ic, 0, 10, (bg, oc, (0, .5, 1, 2))", 4)?, vec![0.0, 5.0, 10.0, 10.0]);
        assert_eq!(
            numbers(&format!("sah, gt, {COUNTER}, (bg, oc, (0, 1, 0, 0, 1)), .5"), 5)?,
            vec![0.0, 1.0, 1.0, 1.0, 4.0]
        );
        assert!(GeneratorObject::parse("sah, x, 0, 0, 0", 1).is_err());
        Ok(())
    }
}
