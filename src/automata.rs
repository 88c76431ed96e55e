//! One dimensional cellular automata and value extraction from their state tables.
//!
//! Automata are configured with specification strings of flags such as
//! `f{s}k{2}r{1}i{center}x{91}y{135}w{0}c{0}s{0}`: format (`s`tandard, `t`otalistic,
//! `c`ontinuous or `f`loat), colors, radius, initial state, size, steps, extraction width,
//! extraction center offset and skipped steps. Missing flags use defaults.

use rand::{seq::IndexedRandom, Rng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    random::new_rand_gen,
    unit,
};

// -------------------------------------------------------------------------------------------------

const X_MAX: i64 = 1000;
const Y_MAX: i64 = 10000;

/// Automaton cell rule and value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaFormat {
    Standard,
    Totalistic,
    Continuous,
    Float,
}

impl CaFormat {
    fn flag(&self) -> char {
        match self {
            Self::Standard => 's',
            Self::Totalistic => 't',
            Self::Continuous => 'c',
            Self::Float => 'f',
        }
    }

    /// True for automata with continuous cell values in the unit interval.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous | Self::Float)
    }
}

impl TryFrom<&str> for CaFormat {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" | "standard" => Ok(Self::Standard),
            "t" | "tot" | "totalistic" => Ok(Self::Totalistic),
            "c" | "continuous" => Ok(Self::Continuous),
            "f" | "float" => Ok(Self::Float),
            _ => Err(format!("invalid automata format '{value}'")),
        }
    }
}

/// Initial automaton state.
#[derive(Debug, Clone, PartialEq)]
pub enum CaInit {
    /// A single active cell in the center.
    Center,
    /// Randomly chosen cell values.
    Random,
    /// Digits repeated across all cells.
    Digits(Vec<u8>),
    /// A constant cell value.
    Value(f64),
}

impl TryFrom<&str> for CaInit {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        let value = value.trim().to_ascii_lowercase();
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::Digits(value.bytes().map(|b| b - b'0').collect()));
        }
        if let Ok(number) = value.parse::<f64>() {
            return Ok(Self::Value(number));
        }
        match value.as_str() {
            "c" | "center" => Ok(Self::Center),
            "r" | "random" => Ok(Self::Random),
            _ => Err(format!("invalid automata init '{value}'")),
        }
    }
}

impl std::fmt::Display for CaInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Center => f.write_str("center"),
            Self::Random => f.write_str("random"),
            Self::Digits(digits) => {
                for d in digits {
                    write!(f, "{d}")?;
                }
                Ok(())
            }
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A parsed automata specification.
#[derive(Debug, Clone, PartialEq)]
pub struct CaSpecification {
    pub format: CaFormat,
    /// Number of cell values (colors). Always 0 for continuous automata.
    pub k: usize,
    /// Neighborhood radius, in steps of 0.5.
    pub r: f64,
    pub init: CaInit,
    /// Number of cells.
    pub x: usize,
    /// Number of generations after skipped ones.
    pub y: usize,
    /// Extraction width.
    pub w: usize,
    /// Extraction center offset.
    pub c: i64,
    /// Number of initial generations to skip.
    pub s: usize,
}

impl Default for CaSpecification {
    fn default() -> Self {
        Self {
            format: CaFormat::Standard,
            k: 2,
            r: 1.0,
            init: CaInit::Center,
            x: 91,
            y: 135,
            w: 91,
            c: 0,
            s: 0,
        }
    }
}

impl CaSpecification {
    /// Total number of generations, including skipped ones.
    pub fn total_steps(&self) -> usize {
        self.y + self.s
    }

    /// Number of cells compared when applying a rule.
    pub fn span(&self) -> usize {
        (self.r * 2.0 + 1.0) as usize
    }
}

fn spec_key(key: &str) -> Option<char> {
    match key.trim().to_ascii_lowercase().as_str() {
        "f" | "format" | "form" | "type" => Some('f'),
        "k" | "colors" => Some('k'),
        "r" | "radius" => Some('r'),
        "i" | "init" | "initial" => Some('i'),
        "x" | "size" => Some('x'),
        "y" | "steps" | "gen" => Some('y'),
        "w" | "width" => Some('w'),
        "c" | "center" => Some('c'),
        "s" | "skip" => Some('s'),
        _ => None,
    }
}

fn spec_int(value: &str, min: i64, max: i64) -> Option<i64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .map(|v| v.round() as i64)
        .filter(|v| (min..=max).contains(v))
}

impl TryFrom<&str> for CaSpecification {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        if input.matches('{').count() != input.matches('}').count() {
            return Err(Error::AutomataSpecification(
                "all braces not paired".to_string(),
            ));
        }
        let mut spec = Self::default();
        let mut width = 0;
        for group in input.split('}') {
            let Some((key, value)) = group.split_once('{') else {
                continue;
            };
            if value.contains('{') {
                return Err(Error::AutomataSpecification(
                    "badly placed delimiters".to_string(),
                ));
            }
            // unknown keys and invalid values fall back to defaults
            match spec_key(key) {
                Some('f') => {
                    if let Ok(format) = CaFormat::try_from(value) {
                        spec.format = format;
                    }
                }
                Some('k') => spec.k = spec_int(value, 0, 36).unwrap_or(2) as usize,
                Some('r') => {
                    spec.r = value
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|r| (0.5..=10.0).contains(r))
                        .map(|r| (r * 2.0).round() / 2.0)
                        .unwrap_or(1.0)
                }
                Some('i') => {
                    if let Ok(init) = CaInit::try_from(value) {
                        spec.init = init;
                    }
                }
                Some('x') => spec.x = spec_int(value, 1, X_MAX).unwrap_or(91) as usize,
                Some('y') => spec.y = spec_int(value, 1, Y_MAX).unwrap_or(135) as usize,
                Some('w') => width = spec_int(value, 0, Y_MAX).unwrap_or(0) as usize,
                Some('c') => spec.c = spec_int(value, -X_MAX, X_MAX).unwrap_or(0),
                Some('s') => spec.s = spec_int(value, 0, Y_MAX).unwrap_or(0) as usize,
                _ => (),
            }
        }
        if spec.k == 0 {
            spec.format = CaFormat::Float;
        }
        spec.w = if width == 0 { spec.x } else { width };
        if spec.format.is_continuous() {
            spec.k = 0;
        }
        if spec.format == CaFormat::Totalistic && (spec.k <= 1 || spec.r < 1.0) {
            return Err(Error::AutomataSpecification(format!(
                "totalistic automata need k > 1 and r >= 1, got k{{{}}} r{{{}}}",
                spec.k, spec.r
            )));
        }
        Ok(spec)
    }
}

impl std::fmt::Display for CaSpecification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "f{{{}}}k{{{}}}r{{{}}}i{{{}}}x{{{}}}y{{{}}}w{{{}}}c{{{}}}s{{{}}}",
            self.format.flag(),
            self.k,
            self.r,
            self.init,
            self.x,
            self.y,
            self.w,
            self.c,
            self.s
        )
    }
}

// -------------------------------------------------------------------------------------------------

/// A one dimensional cellular automaton with its full step history.
#[derive(Debug, Clone)]
pub struct Automaton {
    spec: CaSpecification,
    rule: f64,
    rule_max: Option<u128>,
    mutation: f64,
    history: Vec<Vec<f64>>,
    rand_gen: Xoshiro256PlusPlus,
}

impl Automaton {
    /// Create a new automaton with the initial generation as only step.
    pub fn new(spec: CaSpecification, rule: f64, mutation: f64, seed: u64) -> Self {
        let rule_max = Self::rule_count(&spec);
        let mut automaton = Self {
            spec,
            rule: 0.0,
            rule_max,
            mutation,
            history: Vec::new(),
            rand_gen: new_rand_gen(seed),
        };
        automaton.rule = automaton.filter_rule(rule);
        automaton.clear();
        automaton
    }

    pub fn spec(&self) -> &CaSpecification {
        &self.spec
    }

    pub fn rule(&self) -> f64 {
        self.rule
    }

    /// All generations, including the initial one.
    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    // number of possible rules, None when too large to represent
    fn rule_count(spec: &CaSpecification) -> Option<u128> {
        let k = spec.k as u128;
        match spec.format {
            CaFormat::Standard => {
                let patterns = (spec.k as u32).checked_pow(spec.span() as u32)?;
                k.checked_pow(patterns)
            }
            CaFormat::Totalistic => {
                let sums = ((spec.k - 1) * spec.span() + 1) as u32;
                k.checked_pow(sums)
            }
            CaFormat::Continuous | CaFormat::Float => None,
        }
    }

    fn filter_rule(&mut self, rule: f64) -> f64 {
        if self.spec.format.is_continuous() {
            return rule.rem_euclid(1.0);
        }
        let value = unit_rounded(&mut self.rand_gen, rule.abs());
        match self.rule_max {
            Some(max) if max > 0 => (value % max) as f64,
            _ => value as f64,
        }
    }

    /// Reset history to the initial generation.
    pub fn clear(&mut self) {
        let size = self.spec.x;
        let k = self.spec.k;
        let continuous = self.spec.format.is_continuous();
        let max_value = if continuous { 1.0 } else { (k.max(1) - 1) as f64 };
        let mut step = vec![0.0; size];
        match &self.spec.init {
            CaInit::Center => {
                step[size / 2] = match self.spec.format {
                    CaFormat::Totalistic => 1.0,
                    _ => max_value,
                };
            }
            CaInit::Random => {
                for cell in step.iter_mut() {
                    *cell = if continuous {
                        self.rand_gen.random::<f64>()
                    } else {
                        self.rand_gen.random_range(0..k.max(1)) as f64
                    };
                }
            }
            CaInit::Digits(digits) => {
                for (i, cell) in step.iter_mut().enumerate() {
                    *cell = (digits[i % digits.len()] as f64).clamp(0.0, max_value);
                }
            }
            CaInit::Value(value) => step.fill(value.clamp(0.0, max_value)),
        }
        self.history = vec![step];
    }

    fn neighborhood<'a>(&self, pos: usize, last: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
        let span = self.spec.span() as i64;
        let shift = -(span / 2);
        let len = last.len() as i64;
        (0..span).map(move |q| last[(pos as i64 + shift + q).rem_euclid(len) as usize])
    }

    fn rule_digit(&self, index: u32) -> f64 {
        let k = self.spec.k as u128;
        match k.checked_pow(index) {
            Some(place) => ((self.rule as u128 / place) % k) as f64,
            None => 0.0,
        }
    }

    /// Generate `steps` new generations, optionally with a new rule and mutation rate.
    pub fn gen(&mut self, steps: usize, rule: Option<f64>, mutation: Option<f64>) {
        if let Some(rule) = rule {
            self.rule = self.filter_rule(rule);
        }
        if let Some(mutation) = mutation {
            self.mutation = mutation;
        }
        for _ in 0..steps {
            self.apply_rule();
        }
    }

    fn apply_rule(&mut self) {
        let Some(last) = self.history.last().cloned() else {
            return;
        };
        let k = self.spec.k;
        let mut next = vec![0.0; last.len()];
        for (pos, cell) in next.iter_mut().enumerate() {
            let mutate = self.rand_gen.random::<f64>() < self.mutation;
            *cell = match self.spec.format {
                CaFormat::Continuous | CaFormat::Float => {
                    if mutate {
                        self.rand_gen.random::<f64>()
                    } else {
                        let cells = self.neighborhood(pos, &last).collect::<Vec<_>>();
                        let average = cells.iter().sum::<f64>() / cells.len() as f64;
                        (average + self.rule).rem_euclid(1.0)
                    }
                }
                CaFormat::Standard | CaFormat::Totalistic => {
                    let index = if self.spec.format == CaFormat::Standard {
                        self.neighborhood(pos, &last)
                            .fold(0u64, |acc, v| acc * k as u64 + v as u64)
                    } else {
                        self.neighborhood(pos, &last).sum::<f64>() as u64
                    };
                    let value = self.rule_digit(index.min(u32::MAX as u64) as u32);
                    if mutate && k > 1 {
                        let options = (0..k)
                            .map(|v| v as f64)
                            .filter(|v| *v != value)
                            .collect::<Vec<_>>();
                        options.choose(&mut self.rand_gen).copied().unwrap_or(value)
                    } else {
                        value
                    }
                }
            };
        }
        self.history.push(next);
    }

    /// Extract values from the generations after the skipped ones, using the
    /// specification's width and center offset.
    pub fn extract(&self, format: TableFormat, normalize: bool) -> Vec<f64> {
        Table::new(&self.history).extract(
            format,
            normalize,
            self.spec.s,
            self.spec.total_steps(),
            self.spec.c,
            self.spec.w,
        )
    }
}

// probabilistic rounding into an unsigned integer
fn unit_rounded<R: Rng>(rand_gen: &mut R, value: f64) -> u128 {
    crate::random::float_to_int_weight(rand_gen, value).max(0) as u128
}

// -------------------------------------------------------------------------------------------------

/// How rows of a table are reduced into values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableReduction {
    Flat,
    Sum,
    Average,
    Product,
}

/// Which cells of a row are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSelection {
    All,
    Active,
    Passive,
}

/// A table extraction format, such as `flatRowReflectIndexActive` (`frria`) or
/// `sumColumn` (`sc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub reduction: TableReduction,
    pub column: bool,
    pub reflect: bool,
    pub index: bool,
    pub selection: CellSelection,
}

impl TableFormat {
    pub fn name(&self) -> String {
        let mut name = match self.reduction {
            TableReduction::Flat => "flat",
            TableReduction::Sum => "sum",
            TableReduction::Average => "average",
            TableReduction::Product => "product",
        }
        .to_string();
        name.push_str(if self.column { "Column" } else { "Row" });
        if self.reflect {
            name.push_str("Reflect");
        }
        if self.index {
            name.push_str("Index");
        }
        name.push_str(match self.selection {
            CellSelection::All => "",
            CellSelection::Active => "Active",
            CellSelection::Passive => "Passive",
        });
        name
    }

    fn parse_long(value: &str) -> Option<Self> {
        let (reduction, mut rest) = [
            ("flat", TableReduction::Flat),
            ("sum", TableReduction::Sum),
            ("average", TableReduction::Average),
            ("product", TableReduction::Product),
        ]
        .iter()
        .find_map(|(name, r)| value.strip_prefix(name).map(|rest| (*r, rest)))?;
        let column = if let Some(r) = rest.strip_prefix("row") {
            rest = r;
            false
        } else {
            rest = rest.strip_prefix("column")?;
            true
        };
        let mut take = |word: &str| match rest.strip_prefix(word) {
            Some(r) => {
                rest = r;
                true
            }
            None => false,
        };
        let reflect = reduction == TableReduction::Flat && take("reflect");
        let index = take("index");
        let selection = if take("active") {
            CellSelection::Active
        } else if take("passive") {
            CellSelection::Passive
        } else {
            CellSelection::All
        };
        rest.is_empty().then_some(Self {
            reduction,
            column,
            reflect,
            index,
            selection,
        })
    }

    fn parse_short(value: &str) -> Option<Self> {
        let mut chars = value.chars().peekable();
        let reduction = match chars.next()? {
            'f' => TableReduction::Flat,
            's' => TableReduction::Sum,
            'a' => TableReduction::Average,
            'p' => TableReduction::Product,
            _ => return None,
        };
        let column = match chars.next()? {
            'r' => false,
            'c' => true,
            _ => return None,
        };
        let reflect = reduction == TableReduction::Flat && chars.next_if_eq(&'r').is_some();
        let index = chars.next_if_eq(&'i').is_some();
        let selection = match chars.next() {
            None => CellSelection::All,
            Some('a') => CellSelection::Active,
            Some('p') => CellSelection::Passive,
            Some(_) => return None,
        };
        chars.next().is_none().then_some(Self {
            reduction,
            column,
            reflect,
            index,
            selection,
        })
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            reduction: TableReduction::Flat,
            column: false,
            reflect: false,
            index: false,
            selection: CellSelection::All,
        }
    }
}

impl TryFrom<&str> for TableFormat {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        let lower = value.trim().to_ascii_lowercase();
        let reduction = match lower.as_str() {
            "f" | "flat" => Some(TableReduction::Flat),
            "s" | "sum" => Some(TableReduction::Sum),
            "a" | "average" => Some(TableReduction::Average),
            "p" | "product" => Some(TableReduction::Product),
            _ => None,
        };
        if let Some(reduction) = reduction {
            return Ok(Self {
                reduction,
                ..Self::default()
            });
        }
        Self::parse_long(&lower)
            .or_else(|| Self::parse_short(&lower))
            .ok_or_else(|| format!("invalid table format '{value}'"))
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// A read only view on rows of cell values.
pub struct Table<'a> {
    rows: &'a [Vec<f64>],
}

impl<'a> Table<'a> {
    pub fn new(rows: &'a [Vec<f64>]) -> Self {
        Self { rows }
    }

    fn slice_row(row: &[f64], start: i64, end: i64, format: TableFormat) -> Vec<f64> {
        let len = row.len() as i64;
        if len == 0 {
            return vec![];
        }
        (start..end)
            .filter_map(|i| {
                let q = i.rem_euclid(len) as usize;
                let value = row[q];
                let selected = match format.selection {
                    CellSelection::All => true,
                    CellSelection::Active => value > 0.0,
                    CellSelection::Passive => value == 0.0,
                };
                selected.then_some(if format.index { q as f64 } else { value })
            })
            .collect()
    }

    fn rotate(rows: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
        let spread = rows.iter().map(Vec::len).max().unwrap_or(0);
        (0..spread)
            .map(|i| rows.iter().filter_map(|row| row.get(i).copied()).collect())
            .collect()
    }

    /// Extract rows `row_start..row_end` within a window of `width` cells around the center
    /// (shifted by `center_offset`), then reduce them with the given format.
    pub fn extract(
        &self,
        format: TableFormat,
        normalize: bool,
        row_start: usize,
        row_end: usize,
        center_offset: i64,
        width: usize,
    ) -> Vec<f64> {
        let row_count = self.rows.len();
        if row_count == 0 {
            return vec![];
        }
        let col_count = self.rows[0].len();
        let width = width.max(1) as i64;
        let row_start = row_start % row_count;
        let row_end = (row_end % (row_count + 1)).max(row_start);
        let center = (col_count / 2) as i64 + center_offset;
        let (left, right) = (width / 2, width - width / 2);
        let mut rows = self.rows[row_start..row_end]
            .iter()
            .map(|row| Self::slice_row(row, center - left, center + right, format))
            .collect::<Vec<_>>();
        if format.column {
            rows = Self::rotate(rows);
        }
        let values = match format.reduction {
            TableReduction::Flat => rows
                .into_iter()
                .flat_map(|mut row| {
                    if format.reflect {
                        row.reverse();
                    }
                    row
                })
                .collect::<Vec<_>>(),
            TableReduction::Sum => rows.iter().map(|row| row.iter().sum()).collect(),
            TableReduction::Average => rows
                .iter()
                .map(|row| {
                    if row.is_empty() {
                        0.0
                    } else {
                        row.iter().sum::<f64>() / row.len() as f64
                    }
                })
                .collect(),
            TableReduction::Product => rows.iter().map(|row| row.iter().product()).collect(),
        };
        if normalize {
            unit::norm_range(&values, None)
        } else {
            values
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(automaton: &Automaton) -> Vec<String> {
        automaton
            .history()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| if *v > 0.0 { '+' } else { ' ' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn specification() -> Result<()> {
        let spec = CaSpecification::try_from("f{t}k{3}x{20}")?;
        assert_eq!(spec.format, CaFormat::Totalistic);
        assert_eq!(spec.k, 3);
        assert_eq!(spec.w, 20);
        let spec = CaSpecification::try_from("f{c} k{3} r{1.3} y{2000000} foo{1}")?;
        assert_eq!(spec.k, 0);
        assert_eq!(spec.r, 1.5);
        assert_eq!(spec.y, 135);
        assert_eq!(
            CaSpecification::default().to_string(),
            "f{s}k{2}r{1}i{center}x{91}y{135}w{91}c{0}s{0}"
        );
        assert!(CaSpecification::try_from("f{s}k{2").is_err());
        assert!(CaSpecification::try_from("f{t}r{.5}").is_err());
        Ok(())
    }

    #[test]
    fn standard() -> Result<()> {
        let spec = CaSpecification::try_from("f{s}x{9}y{4}")?;
        let mut automaton = Automaton::new(spec, 90.0, 0.0, 0);
        automaton.gen(3, None, None);
        assert_eq!(
            render(&automaton),
            vec!["    +    ", "   + +   ", "  +   +  ", " + + + + "]
        );
        // rules wrap around the maximum rule count
        let spec = CaSpecification::try_from("f{s}x{9}")?;
        assert_eq!(Automaton::new(spec, 256.0 + 30.0, 0.0, 0).rule(), 30.0);
        Ok(())
    }

    #[test]
    fn totalistic_and_continuous() -> Result<()> {
        let spec = CaSpecification::try_from("f{t}k{3}x{7}")?;
        let mut automaton = Automaton::new(spec, 2049.0, 0.0, 0);
        automaton.gen(2, None, None);
        assert_eq!(automaton.history().len(), 3);
        assert!(automaton.history().iter().flatten().all(|v| (0.0..3.0).contains(v)));

        let spec = CaSpecification::try_from("f{c}x{7}")?;
        let mut automaton = Automaton::new(spec, 0.25, 0.0, 0);
        automaton.gen(1, None, None);
        let expected = [0.25, 0.25 + 1.0 / 3.0, 0.25 + 1.0 / 3.0];
        for (value, expected) in automaton.history()[1][1..4].iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn table_formats() {
        assert_eq!(
            TableFormat::try_from("frria").map(|f| f.name()),
            Ok("flatRowReflectIndexActive".to_string())
        );
        assert_eq!(
            TableFormat::try_from("sumColumn").map(|f| f.name()),
            Ok("sumColumn".to_string())
        );
        assert_eq!(
            TableFormat::try_from("pcip").map(|f| f.name()),
            Ok("productColumnIndexPassive".to_string())
        );
        assert_eq!(TableFormat::try_from("a").map(|f| f.name()), Ok("averageRow".to_string()));
        assert!(TableFormat::try_from("srr").is_err());
        assert!(TableFormat::try_from("xyz").is_err());
    }

    #[test]
    fn extraction() -> Result<()> {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let table = Table::new(&rows);
        let flat = TableFormat::try_from("fr").map_err(Error::Argument)?;
        assert_eq!(
            table.extract(flat, false, 0, 2, 0, 3),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(table.extract(flat, true, 0, 1, 2, 3), vec![1.0, 0.0, 0.5]);
        let sum_column = TableFormat::try_from("sc").map_err(Error::Argument)?;
        assert_eq!(
            table.extract(sum_column, false, 0, 2, 0, 3),
            vec![5.0, 7.0, 9.0]
        );
        let reflect = TableFormat::try_from("frr").map_err(Error::Argument)?;
        assert_eq!(
            table.extract(reflect, false, 1, 2, 0, 3),
            vec![6.0, 5.0, 4.0]
        );
        let index_active = TableFormat::try_from("fria").map_err(Error::Argument)?;
        let rows = vec![vec![0.0, 1.0, 0.0, 1.0]];
        assert_eq!(
            Table::new(&rows).extract(index_active, false, 0, 1, 0, 4),
            vec![1.0, 3.0]
        );
        Ok(())
    }
}
