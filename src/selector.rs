//! Bounded, stateful choosers over a fixed collection of values.

use rand::{seq::SliceRandom, Rng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    random::new_rand_gen,
};

// -------------------------------------------------------------------------------------------------

/// Selection strategy of a [`Selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    RandomChoice,
    RandomWalk,
    RandomPermutate,
    OrderedCyclic,
    OrderedCyclicRetrograde,
    OrderedOscillate,
}

impl SelectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomChoice => "randomChoice",
            Self::RandomWalk => "randomWalk",
            Self::RandomPermutate => "randomPermutate",
            Self::OrderedCyclic => "orderedCyclic",
            Self::OrderedCyclicRetrograde => "orderedCyclicRetrograde",
            Self::OrderedOscillate => "orderedOscillate",
        }
    }
}

impl TryFrom<&str> for SelectorKind {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rc" | "randomchoice" => Ok(Self::RandomChoice),
            "rw" | "randomwalk" => Ok(Self::RandomWalk),
            "rp" | "randompermutate" => Ok(Self::RandomPermutate),
            "oc" | "orderedcyclic" => Ok(Self::OrderedCyclic),
            "ocr" | "orderedcyclicretrograde" => Ok(Self::OrderedCyclicRetrograde),
            "oo" | "orderedoscillate" => Ok(Self::OrderedOscillate),
            _ => Err(format!("invalid selector '{value}'")),
        }
    }
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses values from a list with one of the [`SelectorKind`] strategies.
///
/// Random strategies use their own seeded generator, so a reset selector repeats the exact
/// same selection sequence.
#[derive(Debug, Clone)]
pub struct Selector<T: Clone> {
    kind: SelectorKind,
    values: Vec<T>,
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
    index: Option<usize>,
    direction: i64,
    permutation: Vec<usize>,
}

impl<T: Clone> Selector<T> {
    /// Create a new selector. Values must not be empty.
    pub fn new(values: Vec<T>, kind: SelectorKind, seed: u64) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::ParameterObjectSyntax(format!(
                "{} selector requires at least one value",
                kind
            )));
        }
        Ok(Self {
            kind,
            values,
            seed,
            rand_gen: new_rand_gen(seed),
            index: None,
            direction: 1,
            permutation: Vec::new(),
        })
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rewind to the initial state.
    pub fn reset(&mut self) {
        self.rand_gen = new_rand_gen(self.seed);
        self.index = None;
        self.direction = 1;
        self.permutation.clear();
    }

    /// Replace the values. Selection state is only reset when the size changes.
    pub fn update(&mut self, values: Vec<T>) -> Result<()> {
        if values.is_empty() {
            return Err(Error::ParameterObjectSyntax(format!(
                "{} selector requires at least one value",
                self.kind
            )));
        }
        let size_changed = values.len() != self.values.len();
        self.values = values;
        if size_changed {
            self.index = None;
            self.direction = 1;
            self.permutation.clear();
        }
        Ok(())
    }

    /// Select the next index.
    pub fn next_index(&mut self) -> usize {
        let len = self.values.len();
        if len <= 1 {
            return 0;
        }
        let index = match self.kind {
            SelectorKind::RandomChoice => self.rand_gen.random_range(0..len),
            SelectorKind::RandomWalk => match self.index {
                None => self.rand_gen.random_range(0..len),
                Some(index) => {
                    let step = if self.rand_gen.random_bool(0.5) { 1 } else { -1 };
                    (index as i64 + step).rem_euclid(len as i64) as usize
                }
            },
            SelectorKind::RandomPermutate => {
                if self.permutation.is_empty() {
                    self.permutation = (0..len).collect();
                    self.permutation.shuffle(&mut self.rand_gen);
                }
                self.permutation.pop().unwrap_or(0)
            }
            SelectorKind::OrderedCyclic => match self.index {
                None => 0,
                Some(index) => (index + 1) % len,
            },
            SelectorKind::OrderedCyclicRetrograde => match self.index {
                None => len - 1,
                Some(index) => (index + len - 1) % len,
            },
            SelectorKind::OrderedOscillate => match self.index {
                None => 0,
                Some(index) => {
                    let next = index as i64 + self.direction;
                    if next >= len as i64 || next < 0 {
                        self.direction = -self.direction;
                    }
                    (index as i64 + self.direction) as usize
                }
            },
        };
        self.index = Some(index);
        index
    }

    /// Select the next value.
    pub fn next(&mut self) -> T {
        let index = self.next_index();
        self.values[index].clone()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn take<T: Clone>(selector: &mut Selector<T>, count: usize) -> Vec<T> {
        (0..count).map(|_| selector.next()).collect()
    }

    #[test]
    fn ordered() -> Result<()> {
        let mut cyclic = Selector::new(vec![1, 2, 3], SelectorKind::OrderedCyclic, 0)?;
        assert_eq!(take(&mut cyclic, 5), vec![1, 2, 3, 1, 2]);
        cyclic.reset();
        assert_eq!(cyclic.next(), 1);

        let mut retro = Selector::new(vec![1, 2, 3], SelectorKind::OrderedCyclicRetrograde, 0)?;
        assert_eq!(take(&mut retro, 4), vec![3, 2, 1, 3]);

        let mut oscillate = Selector::new(vec![1, 2, 3], SelectorKind::OrderedOscillate, 0)?;
        assert_eq!(take(&mut oscillate, 7), vec![1, 2, 3, 2, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn random() -> Result<()> {
        let mut permutate = Selector::new(vec![1, 2, 3, 4], SelectorKind::RandomPermutate, 3)?;
        for _ in 0..3 {
            let mut cycle = take(&mut permutate, 4);
            cycle.sort();
            assert_eq!(cycle, vec![1, 2, 3, 4]);
        }

        let mut walk = Selector::new(vec![0i32, 1, 2, 3, 4], SelectorKind::RandomWalk, 3)?;
        let steps = take(&mut walk, 20);
        for pair in steps.windows(2) {
            let diff = (pair[1] - pair[0]).rem_euclid(5);
            assert!(diff == 1 || diff == 4);
        }

        let mut choice = Selector::new(vec![1, 2, 3], SelectorKind::RandomChoice, 9)?;
        let first = take(&mut choice, 10);
        choice.reset();
        assert_eq!(take(&mut choice, 10), first);
        Ok(())
    }

    #[test]
    fn edge_cases() -> Result<()> {
        assert!(Selector::<i32>::new(vec![], SelectorKind::RandomChoice, 0).is_err());
        let mut single = Selector::new(vec![7], SelectorKind::RandomWalk, 0)?;
        assert_eq!(take(&mut single, 3), vec![7, 7, 7]);

        let mut cyclic = Selector::new(vec![1, 2, 3], SelectorKind::OrderedCyclic, 0)?;
        cyclic.next();
        cyclic.update(vec![4, 5, 6])?;
        assert_eq!(cyclic.next(), 5);
        cyclic.update(vec![7, 8])?;
        assert_eq!(cyclic.next(), 7);
        assert!(cyclic.update(vec![]).is_err());
        assert_eq!(
            SelectorKind::try_from("OO"),
            Ok(SelectorKind::OrderedOscillate)
        );
        Ok(())
    }
}
