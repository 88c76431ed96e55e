//! Iterators over other rhythms: grouping, windowing and holding.

use std::cell::Cell;

use crate::{
    error::Result,
    parameter::{
        generator::iterate::{next_group, GroupCounter, HoldBuffer},
        Args, GeneratorObject, RefDict, Rhythm, RhythmObject, RhythmValue,
    },
    selector::{Selector, SelectorKind},
};

use super::fallback_value;

// -------------------------------------------------------------------------------------------------

/// Repeats values of a rhythm for positive group counts, skips them for negative ones.
#[derive(Debug, Clone)]
pub struct IterateRhythmGroup {
    source: RhythmObject,
    group: GeneratorObject,
    counter: GroupCounter,
    current: Option<RhythmValue>,
}

impl IterateRhythmGroup {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.rhythm(0)?,
            group: args.generator(1)?,
            counter: GroupCounter::default(),
            current: None,
        })
    }
}

impl Rhythm for IterateRhythmGroup {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        if self.counter.is_exhausted() || self.current.is_none() {
            let (source, group) = (&mut self.source, &mut self.group);
            let count = next_group(
                "iterateRhythmGroup",
                t,
                || group.number(t, context).round() as i64,
                |skip| {
                    for _ in 0..skip {
                        source.value(t, context);
                    }
                },
            );
            self.current = Some(self.source.value(t, context));
            self.counter.start(count);
        }
        self.counter.advance();
        self.current
            .clone()
            .unwrap_or_else(|| fallback_value(context))
    }

    fn reset(&mut self) {
        self.source.reset();
        self.group.reset();
        self.counter.reset();
        self.current = None;
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses a rhythm with a selector, then takes values from it for positive group counts or
/// skips its values for negative ones.
#[derive(Debug, Clone)]
pub struct IterateRhythmWindow {
    sources: Vec<RhythmObject>,
    group: GeneratorObject,
    selector: Selector<usize>,
    counter: GroupCounter,
    active: usize,
}

impl IterateRhythmWindow {
    pub fn from_args(args: &Args) -> Result<Self> {
        let sources = args.rhythms(0)?;
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

impl Rhythm for IterateRhythmWindow {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        if self.counter.is_exhausted() {
            let active = Cell::new(self.active);
            let (sources, group, selector) =
                (&mut self.sources, &mut self.group, &mut self.selector);
            let count = next_group(
                "iterateRhythmWindow",
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
        self.sources.iter_mut().for_each(RhythmObject::reset);
        self.group.reset();
        self.selector.reset();
        self.counter.reset();
        self.active = 0;
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses with a selector from a periodically refilled list of rhythm values.
#[derive(Debug, Clone)]
pub struct IterateRhythmHold {
    source: RhythmObject,
    fill: GeneratorObject,
    refresh: GeneratorObject,
    kind: SelectorKind,
    seed: u64,
    buffer: HoldBuffer<RhythmValue>,
    selector: Option<Selector<RhythmValue>>,
}

impl IterateRhythmHold {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.rhythm(0)?,
            fill: args.generator(1)?,
            refresh: args.generator(2)?,
            kind: args.option(3)?,
            seed: args.seed(),
            buffer: HoldBuffer::new(),
            selector: None,
        })
    }
}

impl Rhythm for IterateRhythmHold {
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
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
                        log::warn!("iterateRhythmHold: {err} at time {t}");
                    }
                }
                None => self.selector = Selector::new(values, self.kind, self.seed).ok(),
            }
        }
        match self.selector.as_mut() {
            Some(selector) => selector.next(),
            None => fallback_value(context),
        }
    }

    fn reset(&mut self) {
        self.source.reset();
        self.fill.reset();
        self.refresh.reset();
        self.buffer.reset();
        self.selector = None;
    }

    fn duplicate(&self) -> Box<dyn Rhythm> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    // durations at 60 bpm, with one pulse per beat fraction
    fn durations(input: &str, count: usize) -> Result<Vec<f64>> {
        let mut rhythm = RhythmObject::parse(input, 11)?;
        let context = RefDict::with_bpm(60.0);
        Ok((0..count)
            .map(|i| rhythm.value(i as f64, &context).dur)
            .collect())
    }

    const SOURCE: &str = "(l, ((1, 1, 1), (2, 1, 1), (4, 1, 1), (8, 1, 1)), oc)";

    #[test]
    fn group() -> Result<()> {
        assert_eq!(
            durations(&format!("irg, {SOURCE}, (bg, oc, (2, -1))"), 6)?,
            vec![1.0, 1.0, 0.25, 0.25, 1.0, 1.0]
        );
        Ok(())
    }

    #[test]
    fn window() -> Result<()> {
        assert_eq!(
            durations(
                &format!("irw, ({SOURCE}, (cs, 3)), (bg, oc, (2, 1)), oc"),
                5
            )?,
            vec![1.0, 0.5, 3.0, 0.25, 0.125]
        );
        Ok(())
    }

    #[test]
    fn hold() -> Result<()> {
        assert_eq!(
            durations(&format!("irh, {SOURCE}, 2, 4, oc"), 6)?,
            vec![1.0, 0.5, 1.0, 0.5, 0.25, 0.125]
        );
        Ok(())
    }
}
