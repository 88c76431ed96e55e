//! Pitch multisets and Forte set-class identification.

use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    pitch, sieve,
};

// -------------------------------------------------------------------------------------------------

// Forte prime form representatives for cardinalities 1 to 6. Cardinalities 7 to 11 are derived
// from the complements of the sets with the same index.
const FORTE_1_TO_6: [&[&[u8]]; 6] = [
    &[&[0]],
    &[&[0, 1], &[0, 2], &[0, 3], &[0, 4], &[0, 5], &[0, 6]],
    &[
        &[0, 1, 2],
        &[0, 1, 3],
        &[0, 1, 4],
        &[0, 1, 5],
        &[0, 1, 6],
        &[0, 2, 4],
        &[0, 2, 5],
        &[0, 2, 6],
        &[0, 2, 7],
        &[0, 3, 6],
        &[0, 3, 7],
        &[0, 4, 8],
    ],
    &[
        &[0, 1, 2, 3],
        &[0, 1, 2, 4],
        &[0, 1, 3, 4],
        &[0, 1, 2, 5],
        &[0, 1, 2, 6],
        &[0, 1, 2, 7],
        &[0, 1, 4, 5],
        &[0, 1, 5, 6],
        &[0, 1, 6, 7],
        &[0, 2, 3, 5],
        &[0, 1, 3, 5],
        &[0, 2, 3, 6],
        &[0, 1, 3, 6],
        &[0, 2, 3, 7],
        &[0, 1, 4, 6],
        &[0, 1, 5, 7],
        &[0, 3, 4, 7],
        &[0, 1, 4, 7],
        &[0, 1, 4, 8],
        &[0, 1, 5, 8],
        &[0, 2, 4, 6],
        &[0, 2, 4, 7],
        &[0, 2, 5, 7],
        &[0, 2, 4, 8],
        &[0, 2, 6, 8],
        &[0, 3, 5, 8],
        &[0, 2, 5, 8],
        &[0, 3, 6, 9],
        &[0, 1, 3, 7],
    ],
    &[
        &[0, 1, 2, 3, 4],
        &[0, 1, 2, 3, 5],
        &[0, 1, 2, 4, 5],
        &[0, 1, 2, 3, 6],
        &[0, 1, 2, 3, 7],
        &[0, 1, 2, 5, 6],
        &[0, 1, 2, 6, 7],
        &[0, 2, 3, 4, 6],
        &[0, 1, 2, 4, 6],
        &[0, 1, 3, 4, 6],
        &[0, 2, 3, 4, 7],
        &[0, 1, 3, 5, 6],
        &[0, 1, 2, 4, 8],
        &[0, 1, 2, 5, 7],
        &[0, 1, 2, 6, 8],
        &[0, 1, 3, 4, 7],
        &[0, 1, 3, 4, 8],
        &[0, 1, 4, 5, 7],
        &[0, 1, 3, 6, 7],
        &[0, 1, 3, 7, 8],
        &[0, 1, 4, 5, 8],
        &[0, 1, 4, 7, 8],
        &[0, 2, 3, 5, 7],
        &[0, 1, 3, 5, 7],
        &[0, 2, 3, 5, 8],
        &[0, 2, 4, 5, 8],
        &[0, 1, 3, 5, 8],
        &[0, 2, 3, 6, 8],
        &[0, 1, 3, 6, 8],
        &[0, 1, 4, 6, 8],
        &[0, 1, 3, 6, 9],
        &[0, 1, 4, 6, 9],
        &[0, 2, 4, 6, 8],
        &[0, 2, 4, 6, 9],
        &[0, 2, 4, 7, 9],
        &[0, 1, 2, 4, 7],
        &[0, 3, 4, 5, 8],
        &[0, 1, 2, 5, 8],
    ],
    &[
        &[0, 1, 2, 3, 4, 5],
        &[0, 1, 2, 3, 4, 6],
        &[0, 1, 2, 3, 5, 6],
        &[0, 1, 2, 4, 5, 6],
        &[0, 1, 2, 3, 6, 7],
        &[0, 1, 2, 5, 6, 7],
        &[0, 1, 2, 6, 7, 8],
        &[0, 2, 3, 4, 5, 7],
        &[0, 1, 2, 3, 5, 7],
        &[0, 1, 3, 4, 5, 7],
        &[0, 1, 2, 4, 5, 7],
        &[0, 1, 2, 4, 6, 7],
        &[0, 1, 3, 4, 6, 7],
        &[0, 1, 3, 4, 5, 8],
        &[0, 1, 2, 4, 5, 8],
        &[0, 1, 4, 5, 6, 8],
        &[0, 1, 2, 4, 7, 8],
        &[0, 1, 2, 5, 7, 8],
        &[0, 1, 3, 4, 7, 8],
        &[0, 1, 4, 5, 8, 9],
        &[0, 2, 3, 4, 6, 8],
        &[0, 1, 2, 4, 6, 8],
        &[0, 2, 3, 5, 6, 8],
        &[0, 1, 3, 4, 6, 8],
        &[0, 1, 3, 5, 6, 8],
        &[0, 1, 3, 5, 7, 8],
        &[0, 1, 3, 4, 6, 9],
        &[0, 1, 3, 5, 6, 9],
        &[0, 1, 3, 6, 8, 9],
        &[0, 1, 3, 6, 7, 9],
        &[0, 1, 3, 5, 8, 9],
        &[0, 2, 4, 5, 7, 9],
        &[0, 2, 3, 5, 7, 9],
        &[0, 1, 3, 5, 7, 9],
        &[0, 2, 4, 6, 8, 10],
        &[0, 1, 2, 3, 4, 7],
        &[0, 1, 2, 3, 4, 8],
        &[0, 1, 2, 3, 7, 8],
        &[0, 2, 3, 4, 5, 8],
        &[0, 1, 2, 3, 5, 8],
        &[0, 1, 2, 3, 6, 8],
        &[0, 1, 2, 3, 6, 9],
        &[0, 1, 2, 5, 6, 8],
        &[0, 1, 2, 5, 6, 9],
        &[0, 2, 3, 4, 6, 9],
        &[0, 1, 2, 4, 6, 9],
        &[0, 1, 2, 4, 7, 9],
        &[0, 1, 2, 5, 7, 9],
        &[0, 1, 3, 4, 7, 9],
        &[0, 1, 4, 6, 7, 9],
    ],
];

/// A Forte table entry: the prime form and whether the inversion is a distinct set.
#[derive(Debug, Clone)]
struct SetClassEntry {
    prime: Vec<u8>,
    symmetric: bool,
}

lazy_static! {
    // indexed by cardinality (0 is empty), then by Forte index - 1
    static ref FORTE_TABLE: Vec<Vec<SetClassEntry>> = {
        let mut table = vec![Vec::new(); 13];
        for (card_index, sets) in FORTE_1_TO_6.iter().enumerate() {
            table[card_index + 1] = sets
                .iter()
                .map(|pcs| SetClassEntry::from_pcs(pcs))
                .collect();
        }
        for card in 7..12 {
            table[card] = table[12 - card]
                .iter()
                .map(|entry| {
                    let complement = (0..12u8)
                        .filter(|pc| !entry.prime.contains(pc))
                        .collect::<Vec<_>>();
                    SetClassEntry::from_pcs(&complement)
                })
                .collect();
        }
        table[12] = vec![SetClassEntry::from_pcs(&(0..12).collect::<Vec<_>>())];
        table
    };
    // prime form to (card, index) lookup
    static ref FORTE_LOOKUP: HashMap<Vec<u8>, (usize, usize)> = {
        let mut lookup = HashMap::new();
        for (card, entries) in FORTE_TABLE.iter().enumerate() {
            for (index, entry) in entries.iter().enumerate() {
                lookup.insert(entry.prime.clone(), (card, index + 1));
            }
        }
        lookup
    };
}

impl SetClassEntry {
    fn from_pcs(pcs: &[u8]) -> Self {
        let prime = prime_form(pcs);
        let symmetric = normal_form(&invert_pcs(&prime)) == prime;
        Self { prime, symmetric }
    }
}

// -------------------------------------------------------------------------------------------------

fn unique_sorted_pcs(pcs: &[u8]) -> Vec<u8> {
    let mut pcs = pcs.iter().map(|pc| pc % 12).collect::<Vec<_>>();
    pcs.sort_unstable();
    pcs.dedup();
    pcs
}

fn invert_pcs(pcs: &[u8]) -> Vec<u8> {
    pcs.iter().map(|pc| (12 - pc % 12) % 12).collect()
}

// rotations transposed to 0, compared by span first and then packed from the left
fn normal_form_with_transposition(pcs: &[u8]) -> (Vec<u8>, u8) {
    let pcs = unique_sorted_pcs(pcs);
    if pcs.is_empty() {
        return (pcs, 0);
    }
    let card = pcs.len();
    let mut best: Option<(Vec<u8>, u8)> = None;
    for rot in 0..card {
        let start = pcs[rot];
        let rotated = (0..card)
            .map(|i| (pcs[(rot + i) % card] + 12 - start) % 12)
            .collect::<Vec<_>>();
        let is_better = match &best {
            None => true,
            Some((current, _)) => packing_key(&rotated) < packing_key(current),
        };
        if is_better {
            best = Some((rotated, start));
        }
    }
    best.unwrap_or_default()
}

fn packing_key(form: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(form.len());
    if let Some(last) = form.last() {
        key.push(*last);
    }
    key.extend(form.iter().skip(1).take(form.len().saturating_sub(2)));
    key
}

/// Normal form of a pitch class collection, transposed to start on 0.
pub fn normal_form(pcs: &[u8]) -> Vec<u8> {
    normal_form_with_transposition(pcs).0
}

/// Prime form of a pitch class collection: the better packed of its normal form and the
/// normal form of its inversion.
pub fn prime_form(pcs: &[u8]) -> Vec<u8> {
    let normal = normal_form(pcs);
    let inverted = normal_form(&invert_pcs(pcs));
    if packing_key(&inverted) < packing_key(&normal) {
        inverted
    } else {
        normal
    }
}

/// Bit field of all distinct pitch classes, modulo 4095.
pub fn mason(pcs: &[u8]) -> u32 {
    unique_sorted_pcs(pcs)
        .iter()
        .fold(0u32, |sum, pc| sum + (1u32 << pc))
        % 4095
}

/// Interval class vector of a pitch class collection.
pub fn interval_class_vector(pcs: &[u8]) -> [u8; 6] {
    let pcs = unique_sorted_pcs(pcs);
    let mut icv = [0u8; 6];
    for (i, a) in pcs.iter().enumerate() {
        for b in pcs.iter().skip(i + 1) {
            let interval = (*b as i32 - *a as i32).rem_euclid(12);
            let ic = interval.min(12 - interval);
            if ic > 0 {
                icv[ic as usize - 1] += 1;
            }
        }
    }
    icv
}

// -------------------------------------------------------------------------------------------------

/// A Forte set-class triple: cardinality, index and inversion (1 for A, -1 for B, 0 when the
/// set is inversionally symmetric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetClass {
    pub card: usize,
    pub index: usize,
    pub inversion: i8,
}

impl SetClass {
    /// Create a set class, checking the index and resolving the inversion. Any inversion value
    /// other than -1 requests the A form.
    pub fn new(card: usize, index: usize, inversion: i8) -> Result<Self> {
        let entry = FORTE_TABLE
            .get(card)
            .and_then(|entries| entries.get(index.wrapping_sub(1)))
            .ok_or_else(|| Error::Multiset(format!("no such set class {card}-{index}")))?;
        let inversion = if entry.symmetric {
            0
        } else if inversion == -1 {
            -1
        } else {
            1
        };
        Ok(Self {
            card,
            index,
            inversion,
        })
    }

    /// Find the set class of a pitch space collection and the transposition of its first
    /// matching rotation.
    pub fn find(ps: &[f64]) -> Result<(Self, f64)> {
        if ps.is_empty() {
            return Err(Error::Multiset("can not classify an empty set".to_string()));
        }
        let pcs = ps
            .iter()
            .map(|p| (p.round() as i64).rem_euclid(12) as u8)
            .collect::<Vec<_>>();
        let unique = unique_sorted_pcs(&pcs);
        if unique.len() == 1 {
            return Ok((
                Self {
                    card: 1,
                    index: 1,
                    inversion: 0,
                },
                unique[0] as f64,
            ));
        }
        let prime = prime_form(&unique);
        let (card, index) = FORTE_LOOKUP
            .get(&prime)
            .copied()
            .ok_or_else(|| Error::Multiset(format!("set {ps:?} has no set class")))?;
        let (normal, transposition) = normal_form_with_transposition(&unique);
        let inversion = if normal == prime { 1 } else { -1 };
        Ok((Self::new(card, index, inversion)?, transposition as f64))
    }

    /// Prime form (A) or inverted form (B) pitch classes of the set class.
    pub fn pitch_classes(&self) -> Vec<u8> {
        let Some(entry) = FORTE_TABLE
            .get(self.card)
            .and_then(|entries| entries.get(self.index.wrapping_sub(1)))
        else {
            return Vec::new();
        };
        if self.inversion == -1 {
            normal_form(&invert_pcs(&entry.prime))
        } else {
            entry.prime.clone()
        }
    }

    /// String representation like `4-3` or `3-11B`. With `tni` set inversions are not marked.
    pub fn repr(&self, tni: bool) -> String {
        let inversion = match (tni, self.inversion) {
            (false, 1) => "A",
            (false, -1) => "B",
            _ => "",
        };
        format!("{}-{}{}", self.card, self.index, inversion)
    }
}

impl Display for SetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr(false))
    }
}

impl TryFrom<&str> for SetClass {
    type Error = Error;

    /// Parse Forte names such as `3-4`, `4-z15`, `3-11b` or `5-20A`.
    fn try_from(value: &str) -> Result<Self> {
        let lower = value.trim().to_ascii_lowercase();
        let inversion = if lower.ends_with('b') { -1 } else { 1 };
        let cleaned = lower
            .trim_end_matches(['a', 'b'])
            .replace('z', "");
        let (card, index) = cleaned
            .split_once('-')
            .ok_or_else(|| Error::Multiset(format!("invalid set class '{value}'")))?;
        let card = card
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Multiset(format!("invalid set class '{value}'")))?;
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::Multiset(format!("invalid set class '{value}'")))?;
        Self::new(card, index, inversion)
    }
}

// -------------------------------------------------------------------------------------------------

/// An ordered pitch collection together with its set class, transposition and a durational
/// weight used by paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Multiset {
    pitches: Vec<f64>,
    set_class: SetClass,
    transposition: f64,
    duration: f64,
}

impl Multiset {
    /// Create a multiset from pitch space values.
    pub fn from_pitches(pitches: Vec<f64>) -> Result<Self> {
        let (set_class, transposition) = SetClass::find(&pitches)?;
        Ok(Self {
            pitches,
            set_class,
            transposition,
            duration: 1.0,
        })
    }

    /// Create a multiset from the canonical pitches of a set class.
    pub fn from_set_class(set_class: SetClass) -> Self {
        let pitches = set_class
            .pitch_classes()
            .into_iter()
            .map(|pc| pc as f64)
            .collect();
        Self {
            pitches,
            set_class,
            transposition: 0.0,
            duration: 1.0,
        }
    }

    /// Build with a duration weight.
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Pitch space values, with transposition and inversion applied.
    pub fn pitches(&self) -> &[f64] {
        &self.pitches
    }

    pub fn set_class(&self) -> SetClass {
        self.set_class
    }

    pub fn transposition(&self) -> f64 {
        self.transposition
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Integer pitch classes.
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.pitches
            .iter()
            .map(|p| (p.round() as i64).rem_euclid(12) as u8)
            .collect()
    }

    pub fn midi(&self) -> Vec<u8> {
        self.pitches.iter().map(|p| pitch::ps_to_midi(*p)).collect()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.pitches.iter().map(|p| pitch::ps_to_fq(*p)).collect()
    }

    pub fn pch(&self) -> Vec<f64> {
        self.pitches.iter().map(|p| pitch::ps_to_pch(*p)).collect()
    }

    pub fn note_names(&self) -> Vec<String> {
        self.pitches
            .iter()
            .map(|p| pitch::ps_to_note_name(*p))
            .collect()
    }

    pub fn mason(&self) -> u32 {
        mason(&self.pitch_classes())
    }

    pub fn interval_class_vector(&self) -> [u8; 6] {
        interval_class_vector(&self.pitch_classes())
    }

    /// Transpose in pitch space.
    pub fn transpose(&mut self, value: f64) {
        self.pitches.iter_mut().for_each(|p| *p += value);
        self.transposition += value;
    }

    /// Invert around the given axis, or around the first pitch.
    pub fn invert(&mut self, axis: Option<f64>) -> Result<()> {
        let Some(axis) = axis.or_else(|| self.pitches.first().copied()) else {
            return Ok(());
        };
        self.pitches.iter_mut().for_each(|p| *p = 2.0 * axis - *p);
        let (set_class, transposition) = SetClass::find(&self.pitches)?;
        self.set_class = set_class;
        self.transposition = transposition;
        Ok(())
    }

    pub fn retrograde(&mut self) {
        self.pitches.reverse();
    }

    /// Rotate the pitch order so that the pitch at `new_zero` comes first.
    pub fn rotate(&mut self, new_zero: i64) {
        if self.pitches.is_empty() {
            return;
        }
        let shift = new_zero.rem_euclid(self.pitches.len() as i64) as usize;
        self.pitches.rotate_left(shift);
    }

    /// Space pitches apart by adding `shift` octaves per position.
    pub fn space_octave(&mut self, shift: i64) {
        for (i, p) in self.pitches.iter_mut().enumerate() {
            *p += (12 * shift * i as i64) as f64;
        }
    }

    /// Representation of the pitches in the given path format.
    pub fn repr(&self, format: &str, tni: bool) -> String {
        let join = |values: Vec<String>| format!("({})", values.join(","));
        match format {
            "forte" | "sc" => self.set_class.repr(tni),
            "mason" => self.mason().to_string(),
            "midi" => join(self.midi().iter().map(|v| v.to_string()).collect()),
            "fq" => join(
                self.frequencies()
                    .iter()
                    .map(|v| format!("{v:.2}"))
                    .collect(),
            ),
            "pch" => join(self.pch().iter().map(|v| format!("{v:.2}")).collect()),
            "name" => join(self.note_names()),
            _ => join(self.pitches.iter().map(|v| format_number(*v)).collect()),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl Display for Multiset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr("ps", false))
    }
}

impl TryFrom<&str> for Multiset {
    type Error = Error;

    /// Parse a user entered set: a Forte name (`3-4`), a sieve (`3|4@2`), MIDI note numbers
    /// (`m60,64,67`), frequencies (`fq440,880` or `440hz`), pitch names (`c4,e4,g#4`) or plain
    /// pitch space numbers (`0,4,7`).
    fn try_from(value: &str) -> Result<Self> {
        let lower = value.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return Err(Error::Multiset("empty set".to_string()));
        }
        let numbers = |s: &str| -> Vec<f64> {
            s.split([',', ' '])
                .filter_map(|e| {
                    e.trim()
                        .trim_matches(|c: char| c.is_ascii_alphabetic() || c == '(' || c == ')')
                        .parse::<f64>()
                        .ok()
                })
                .collect()
        };
        let pitches = if lower.contains(['@', '&', '|']) {
            sieve::SievePitch::try_from(lower.as_str())
                .map_err(|err| Error::Multiset(err.to_string()))?
                .pitches()
        } else if lower.contains('m') {
            numbers(&lower).into_iter().map(pitch::midi_to_ps).collect()
        } else if lower.contains("hz") || lower.contains("fq") {
            numbers(&lower).into_iter().map(pitch::fq_to_ps).collect()
        } else if lower.starts_with(|c: char| c.is_ascii_digit())
            && lower.contains('-')
            && !lower.contains([',', '.'])
        {
            return Ok(Self::from_set_class(SetClass::try_from(lower.as_str())?));
        } else if lower.contains(['a', 'b', 'c', 'd', 'e', 'f', 'g']) {
            lower
                .split([',', ' '])
                .map(|e| e.trim_matches(|c| c == '(' || c == ')').trim())
                .filter(|e| !e.is_empty())
                .map(pitch::ps_name_to_ps)
                .collect::<Result<Vec<_>>>()
                .map_err(|err| Error::Multiset(err.to_string()))?
        } else {
            numbers(&lower)
        };
        if pitches.is_empty() {
            return Err(Error::Multiset(format!("no pitches found in '{value}'")));
        }
        Self::from_pitches(pitches)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn forte_table() {
        assert_eq!(FORTE_TABLE[3].len(), 12);
        assert_eq!(FORTE_TABLE[4].len(), 29);
        assert_eq!(FORTE_TABLE[6].len(), 50);
        assert_eq!(FORTE_TABLE[7].len(), 38);
        assert_eq!(FORTE_TABLE[11].len(), 1);
        assert_eq!(FORTE_TABLE[12][0].prime.len(), 12);
        assert!(FORTE_TABLE[3][11].symmetric);
        assert!(!FORTE_TABLE[3][3].symmetric);
    }

    #[test]
    fn prime_forms() {
        assert_eq!(prime_form(&[0, 4, 7]), vec![0, 3, 7]);
        assert_eq!(prime_form(&[5, 6, 8]), vec![0, 1, 3]);
        assert_eq!(normal_form(&[7, 0, 4]), vec![0, 4, 7]);
        assert_eq!(mason(&[0, 4, 7]), 1 + 16 + 128);
        assert_eq!(interval_class_vector(&[0, 4, 7]), [0, 0, 1, 1, 1, 0]);
    }

    #[test]
    fn set_classes() -> Result<()> {
        let sc = SetClass::try_from("3-4")?;
        assert_eq!(sc.inversion, 1);
        assert_eq!(sc.pitch_classes(), vec![0, 1, 5]);
        let sc = SetClass::try_from("3-11b")?;
        assert_eq!(sc.pitch_classes(), vec![0, 4, 7]);
        assert_eq!(sc.repr(false), "3-11B");
        assert_eq!(sc.repr(true), "3-11");
        assert_eq!(SetClass::try_from("3-12")?.inversion, 0);
        assert_eq!(SetClass::try_from("4-z15")?.index, 15);
        assert!(SetClass::try_from("3-13").is_err());
        assert!(SetClass::try_from("foo").is_err());

        let (sc, t) = SetClass::find(&[3.0, 4.0, 5.0])?;
        assert_eq!((sc.card, sc.index, sc.inversion, t), (3, 1, 0, 3.0));
        let (sc, t) = SetClass::find(&[2.0, 6.0, 9.0])?;
        assert_eq!((sc.card, sc.index, sc.inversion, t), (3, 11, -1, 2.0));
        let (sc, _) = SetClass::find(&[0.0, 3.0, 7.0])?;
        assert_eq!(sc.inversion, 1);
        Ok(())
    }

    #[test]
    fn multisets() -> Result<()> {
        let set = Multiset::try_from("3-4")?;
        assert_eq!(set.pitches(), &[0.0, 1.0, 5.0]);
        assert_eq!(set.midi(), vec![60, 61, 65]);
        let mut set = Multiset::try_from("c4,e4,g4")?;
        assert_eq!(set.set_class().repr(false), "3-11B");
        set.transpose(2.0);
        assert_eq!(set.pitches(), &[2.0, 6.0, 9.0]);
        set.invert(None)?;
        assert_eq!(set.pitches(), &[2.0, -2.0, -5.0]);
        assert_eq!(set.set_class().repr(false), "3-11A");
        set.rotate(1);
        assert_eq!(set.pitches(), &[-2.0, -5.0, 2.0]);
        assert_eq!(Multiset::try_from("m60,64")?.pitches(), &[0.0, 4.0]);
        assert_eq!(Multiset::try_from("0,4,7.5")?.len(), 3);
        assert!(Multiset::try_from("").is_err());
        Ok(())
    }
}
