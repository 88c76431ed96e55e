//! Paths: named, ordered sequences of multisets which textures read their pitches from.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    multiset::Multiset,
};

// -------------------------------------------------------------------------------------------------

/// An ordered sequence of [`Multiset`]s with an active field transposition and octave.
///
/// Each multiset carries a duration weight: when scoring, a texture's time range is split
/// into per-set ranges proportional to these weights (see [`Path::time_ranges`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    name: String,
    multisets: Vec<Multiset>,
    field: f64,
    octave: f64,
}

impl Path {
    /// Create a new empty path.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            multisets: Vec::new(),
            field: 0.0,
            octave: 0.0,
        }
    }

    /// Create a new path from the given multisets.
    pub fn from_multisets<S: Into<String>>(name: S, multisets: Vec<Multiset>) -> Self {
        Self {
            multisets,
            ..Self::new(name)
        }
    }

    /// Create a new path from multiset strings, see [`Multiset::try_from`].
    pub fn from_strings<S: Into<String>>(name: S, sets: &[&str]) -> Result<Self> {
        let multisets = sets
            .iter()
            .map(|s| Multiset::try_from(*s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_multisets(name, multisets))
    }

    /// Return a copy with the given name.
    pub fn copy_as<S: Into<String>>(&self, name: S) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.multisets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multisets.is_empty()
    }

    pub fn multisets(&self) -> &[Multiset] {
        &self.multisets
    }

    pub fn get(&self, index: usize) -> Option<&Multiset> {
        self.multisets.get(index)
    }

    pub fn push(&mut self, multiset: Multiset) {
        self.multisets.push(multiset);
    }

    pub fn insert(&mut self, index: usize, multiset: Multiset) -> Result<()> {
        if index > self.len() {
            return Err(Error::Path(format!(
                "insert position {index} out of range in path '{}'",
                self.name
            )));
        }
        self.multisets.insert(index, multiset);
        Ok(())
    }

    pub fn replace(&mut self, index: usize, multiset: Multiset) -> Result<()> {
        let slot = self.multisets.get_mut(index).ok_or_else(|| {
            Error::Path(format!("position {index} out of range in path '{}'", self.name))
        })?;
        *slot = multiset;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Multiset> {
        if index >= self.len() {
            return Err(Error::Path(format!(
                "position {index} out of range in path '{}'",
                self.name
            )));
        }
        Ok(self.multisets.remove(index))
    }

    // ---------------------------------------------------------------------------------------------

    /// Active field transposition in semitones.
    pub fn field(&self) -> f64 {
        self.field
    }

    pub fn set_field(&mut self, field: f64) {
        self.field = field;
    }

    /// Active octave shift.
    pub fn octave(&self) -> f64 {
        self.octave
    }

    pub fn set_octave(&mut self, octave: f64) {
        self.octave = octave;
    }

    /// Raw duration weights of all multisets.
    pub fn duration_fractions(&self) -> Vec<f64> {
        self.multisets.iter().map(|m| m.duration()).collect()
    }

    /// Set duration weights for all multisets. Weights must be positive and match the
    /// path's length.
    pub fn set_duration_fractions(&mut self, fractions: &[f64]) -> Result<()> {
        if fractions.len() != self.len() {
            return Err(Error::Path(format!(
                "expected {} duration fractions, got {}",
                self.len(),
                fractions.len()
            )));
        }
        if fractions.iter().any(|f| *f <= 0.0) {
            return Err(Error::Path(
                "duration fractions must be positive".to_string(),
            ));
        }
        for (multiset, fraction) in self.multisets.iter_mut().zip(fractions) {
            multiset.set_duration(*fraction);
        }
        Ok(())
    }

    /// Duration weights normalized to sum to 1.
    pub fn duration_percents(&self) -> Vec<f64> {
        let sum = self.multisets.iter().map(|m| m.duration()).sum::<f64>();
        if sum <= 0.0 {
            return vec![1.0 / self.len().max(1) as f64; self.len()];
        }
        self.multisets.iter().map(|m| m.duration() / sum).collect()
    }

    /// Split `[t_start, t_end)` into consecutive per-multiset ranges, either weighted by the
    /// duration percents or equally sized.
    pub fn time_ranges(&self, t_start: f64, t_end: f64, weighted: bool) -> Vec<(f64, f64)> {
        let percents = if weighted {
            self.duration_percents()
        } else {
            vec![1.0 / self.len().max(1) as f64; self.len()]
        };
        let span = t_end - t_start;
        let mut ranges = Vec::with_capacity(percents.len());
        let mut accumulated = 0.0;
        for (i, percent) in percents.iter().enumerate() {
            let start = t_start + accumulated * span;
            accumulated += percent;
            let end = if i == percents.len() - 1 {
                t_end
            } else {
                t_start + accumulated * span
            };
            ranges.push((start, end));
        }
        ranges
    }

    // ---------------------------------------------------------------------------------------------

    /// Transpose all multisets, or a single one.
    pub fn transpose(&mut self, value: f64, index: Option<usize>) -> Result<()> {
        match index {
            None => self.multisets.iter_mut().for_each(|m| m.transpose(value)),
            Some(index) => self
                .multisets
                .get_mut(index)
                .ok_or_else(|| Error::Path(format!("position {index} out of range")))?
                .transpose(value),
        }
        Ok(())
    }

    /// Invert all multisets, or a single one, around their first pitch.
    pub fn invert(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            None => self
                .multisets
                .iter_mut()
                .try_for_each(|m| m.invert(None)),
            Some(index) => self
                .multisets
                .get_mut(index)
                .ok_or_else(|| Error::Path(format!("position {index} out of range")))?
                .invert(None),
        }
    }

    pub fn retrograde(&mut self) {
        self.multisets.reverse();
    }

    /// Rotate so that the multiset at `new_zero` (1 to len - 1) comes first.
    pub fn rotate(&mut self, new_zero: usize) -> Result<()> {
        if new_zero < 1 || new_zero >= self.len() {
            return Err(Error::Path(format!(
                "rotation {new_zero} out of range for a path of length {}",
                self.len()
            )));
        }
        self.multisets.rotate_left(new_zero);
        Ok(())
    }

    /// Keep only the multisets in `start..end`.
    pub fn slice(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end || end > self.len() {
            return Err(Error::Path(format!(
                "invalid slice {start}..{end} for a path of length {}",
                self.len()
            )));
        }
        self.multisets = self.multisets[start..end].to_vec();
        Ok(())
    }

    /// Pitch space values of all multisets.
    pub fn pitch_space(&self) -> Vec<Vec<f64>> {
        self.multisets.iter().map(|m| m.pitches().to_vec()).collect()
    }
}

// -------------------------------------------------------------------------------------------------
