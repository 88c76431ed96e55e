//! Xenakis residual class sieves and prime number segments.
//!
//! A sieve is a logical combination of residual classes such as `3@2|4&5@1`, where `M@N` is
//! the class of all integers `i` with `i % M == N`. Classes are combined with `&`
//! (intersection), `|` (union), `^` (symmetric difference) and `-` (complement within the
//! current integer range `z`), and can be grouped with parentheses.
//!
//! Segments of a sieve can be rendered in several formats, see [`SieveFormat`].

use std::collections::BTreeSet;

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use crate::{
    error::{Error, Result},
    pitch, unit,
};

// -------------------------------------------------------------------------------------------------

/// Output format of a sieve segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SieveFormat {
    /// The integers within the segment.
    Integer,
    /// 1 for each integer in `z` which is part of the segment, else 0.
    Binary,
    /// Segment integers normalized within the range of `z`.
    Unit,
    /// Differences between adjacent segment integers.
    Width,
}

impl TryFrom<&str> for SieveFormat {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(Self::Integer),
            "bin" | "binary" => Ok(Self::Binary),
            "unit" => Ok(Self::Unit),
            "wid" | "width" => Ok(Self::Width),
            _ => Err(format!("invalid sieve format '{value}'")),
        }
    }
}

impl std::fmt::Display for SieveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Binary => "binary",
            Self::Unit => "unit",
            Self::Width => "width",
        };
        f.write_str(name)
    }
}

// convert an integer segment into the given format, using z as reference range
fn format_segment(segment: &[i64], z: &[i64], format: SieveFormat) -> Vec<f64> {
    let z_range = match (z.first(), z.last()) {
        (Some(first), Some(last)) => Some((*first, *last)),
        _ => None,
    };
    match format {
        SieveFormat::Integer => segment.iter().map(|v| *v as f64).collect(),
        SieveFormat::Binary => unit::discrete_binary_pad(segment, z_range)
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        SieveFormat::Unit => {
            let values = segment.iter().map(|v| *v as f64).collect::<Vec<_>>();
            unit::norm_range(&values, z_range.map(|(a, b)| (a as f64, b as f64)))
        }
        SieveFormat::Width => segment
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect(),
    }
}

// -------------------------------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "sieve.pest"]
struct SieveParser {}

#[derive(Debug, Clone, PartialEq)]
enum SieveNode {
    Residual { modulus: i64, shift: i64 },
    Complement(Box<SieveNode>),
    Intersection(Vec<SieveNode>),
    SymmetricDifference(Vec<SieveNode>),
    Union(Vec<SieveNode>),
}

impl SieveNode {
    // errors here should be unreachable unless there is a bug in the pest grammar
    fn parse(pair: Pair<Rule>) -> Result<SieveNode> {
        match pair.as_rule() {
            Rule::residual => {
                let mut inner = pair.into_inner();
                let modulus = inner
                    .next()
                    .and_then(|p| p.as_str().parse::<i64>().ok())
                    .ok_or_else(|| Error::SieveSyntax("missing modulus".to_string()))?;
                let shift = match inner.next() {
                    Some(p) => p.as_str().parse::<i64>().map_err(|err| {
                        Error::SieveSyntax(format!("invalid shift '{}': {err}", p.as_str()))
                    })?,
                    None => 0,
                };
                let shift = if modulus == 0 {
                    shift
                } else {
                    shift.rem_euclid(modulus)
                };
                Ok(SieveNode::Residual { modulus, shift })
            }
            Rule::complement => {
                let inner = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::SieveSyntax("empty complement".to_string()))?;
                Ok(SieveNode::Complement(Box::new(Self::parse(inner)?)))
            }
            Rule::group => {
                let inner = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::SieveSyntax("empty group".to_string()))?;
                Self::parse(inner)
            }
            Rule::intersection | Rule::difference | Rule::union => {
                let rule = pair.as_rule();
                let mut nodes = pair
                    .into_inner()
                    .map(Self::parse)
                    .collect::<Result<Vec<_>>>()?;
                if nodes.len() == 1 {
                    return nodes
                        .pop()
                        .ok_or_else(|| Error::SieveSyntax("empty expression".to_string()));
                }
                Ok(match rule {
                    Rule::intersection => SieveNode::Intersection(nodes),
                    Rule::difference => SieveNode::SymmetricDifference(nodes),
                    _ => SieveNode::Union(nodes),
                })
            }
            rule => Err(Error::SieveSyntax(format!(
                "unexpected sieve element {rule:?}"
            ))),
        }
    }

    fn evaluate(&self, n: i64, z: &[i64]) -> BTreeSet<i64> {
        match self {
            SieveNode::Residual { modulus, shift } => {
                if *modulus == 0 {
                    return BTreeSet::new();
                }
                let target = (n + shift).rem_euclid(*modulus);
                z.iter()
                    .copied()
                    .filter(|v| v.rem_euclid(*modulus) == target)
                    .collect()
            }
            SieveNode::Complement(node) => {
                let set = node.evaluate(n, z);
                z.iter().copied().filter(|v| !set.contains(v)).collect()
            }
            SieveNode::Intersection(nodes) => Self::fold(nodes, n, z, |a, b| &a & &b),
            SieveNode::SymmetricDifference(nodes) => Self::fold(nodes, n, z, |a, b| &a ^ &b),
            SieveNode::Union(nodes) => Self::fold(nodes, n, z, |a, b| &a | &b),
        }
    }

    fn fold<F>(nodes: &[SieveNode], n: i64, z: &[i64], op: F) -> BTreeSet<i64>
    where
        F: Fn(BTreeSet<i64>, BTreeSet<i64>) -> BTreeSet<i64>,
    {
        let mut iter = nodes.iter();
        let first = iter.next().map(|node| node.evaluate(n, z)).unwrap_or_default();
        iter.fold(first, |set, node| op(set, node.evaluate(n, z)))
    }

    fn moduli(&self, moduli: &mut Vec<i64>) {
        match self {
            SieveNode::Residual { modulus, .. } => moduli.push(*modulus),
            SieveNode::Complement(node) => node.moduli(moduli),
            SieveNode::Intersection(nodes)
            | SieveNode::SymmetricDifference(nodes)
            | SieveNode::Union(nodes) => nodes.iter().for_each(|node| node.moduli(moduli)),
        }
    }

    fn repr(&self) -> String {
        let join = |nodes: &[SieveNode], op: &str| {
            nodes
                .iter()
                .map(|node| match node {
                    SieveNode::Residual { .. } | SieveNode::Complement(_) => node.repr(),
                    _ => format!("({})", node.repr()),
                })
                .collect::<Vec<_>>()
                .join(op)
        };
        match self {
            SieveNode::Residual { modulus, shift } => format!("{modulus}@{shift}"),
            SieveNode::Complement(node) => match node.as_ref() {
                SieveNode::Residual { .. } => format!("-{}", node.repr()),
                _ => format!("-({})", node.repr()),
            },
            SieveNode::Intersection(nodes) => join(nodes, "&"),
            SieveNode::SymmetricDifference(nodes) => join(nodes, "^"),
            SieveNode::Union(nodes) => join(nodes, "|"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        0
    } else {
        (a / gcd(a, b) * b).abs()
    }
}

// aliases: and, *, or, +, xor, not and any kind of brackets
fn normalize_logic(input: &str) -> String {
    input
        .to_ascii_lowercase()
        .replace("xor", "^")
        .replace("and", "&")
        .replace('*', "&")
        .replace("or", "|")
        .replace('+', "|")
        .replace("not", "-")
        .replace("sub", "@")
        .replace(['[', '{'], "(")
        .replace([']', '}'], ")")
        .replace(' ', "")
}

/// A parsed sieve, evaluated within a default integer range of `0..100`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sieve {
    root: SieveNode,
    z: Vec<i64>,
}

impl Sieve {
    /// Build with a new default integer range `min..=max`.
    #[must_use]
    pub fn with_z_range(mut self, min: i64, max: i64) -> Self {
        self.z = (min..=max).collect();
        self
    }

    /// The default integer range.
    pub fn z(&self) -> &[i64] {
        &self.z
    }

    /// Least common multiple of all residual moduli.
    pub fn period(&self) -> i64 {
        let mut moduli = Vec::new();
        self.root.moduli(&mut moduli);
        moduli.into_iter().fold(1, lcm)
    }

    /// Integer segment with origin shift `n` within `z`, or within the default range.
    pub fn segment_int(&self, n: i64, z: Option<&[i64]>) -> Vec<i64> {
        let z = z.unwrap_or(&self.z);
        self.root.evaluate(n, z).into_iter().collect()
    }

    /// Segment with origin shift `n` within `z`, or the default range, in the given format.
    pub fn segment(&self, n: i64, z: Option<&[i64]>, format: SieveFormat) -> Vec<f64> {
        let z = z.unwrap_or(&self.z);
        format_segment(&self.segment_int(n, Some(z)), z, format)
    }

    /// Collect a segment of exactly `length` values, starting the search at `z_min` and
    /// extending the integer range in steps of `z_step` as needed.
    pub fn collect(
        &self,
        n: i64,
        z_min: i64,
        length: usize,
        format: SieveFormat,
        z_step: i64,
    ) -> Result<Vec<f64>> {
        const MAX_EXTENSIONS: usize = 10000;
        let z_step = z_step.max(1);
        let mut found = Vec::new();
        let mut start = z_min;
        for _ in 0..MAX_EXTENSIONS {
            if found.len() > length {
                break;
            }
            let z = (start..start + z_step).collect::<Vec<_>>();
            found.extend(self.segment_int(n, Some(&z)));
            start += z_step;
            if found.len() > length {
                break;
            }
        }
        // widths need one more value than requested
        let required = if format == SieveFormat::Width {
            length + 1
        } else {
            length
        };
        if found.len() < required {
            return Err(Error::SieveSyntax(format!(
                "a sieve segment of length {length} can not be found for '{self}'"
            )));
        }
        found.truncate(required);
        let z = match (found.first(), found.last()) {
            (Some(first), Some(last)) => (*first..=*last).collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        Ok(format_segment(&found, &z, format))
    }
}

impl TryFrom<&str> for Sieve {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        let normalized = normalize_logic(input);
        let mut pairs = SieveParser::parse(Rule::sieve, &normalized)
            .map_err(|err| Error::SieveSyntax(format!("invalid sieve '{input}': {err}")))?;
        let root = pairs
            .next()
            .and_then(|sieve| sieve.into_inner().next())
            .ok_or_else(|| Error::SieveSyntax(format!("empty sieve '{input}'")))?;
        Ok(Self {
            root: SieveNode::parse(root)?,
            z: (0..100).collect(),
        })
    }
}

impl std::fmt::Display for Sieve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.root.repr())
    }
}

// -------------------------------------------------------------------------------------------------

/// A sieve mapped onto pitch space: `logic[, lower[, upper[, origin[, step]]]]`, where pitch
/// boundaries are pitch names or pitch space numbers and step is a micro tonal grid width.
#[derive(Debug, Clone)]
pub struct SievePitch {
    sieve: Sieve,
    lower: f64,
    upper: f64,
    origin: f64,
    step: f64,
}

fn parse_pitch_arg(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(ps) => Ok(ps),
        Err(_) => pitch::ps_name_to_ps(value),
    }
}

impl TryFrom<&str> for SievePitch {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        let parts = input.split(',').map(str::trim).collect::<Vec<_>>();
        let logic = parts
            .first()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::SieveSyntax("missing sieve string".to_string()))?;
        let sieve = Sieve::try_from(*logic)?;
        let lower = match parts.get(1).filter(|s| !s.is_empty()) {
            Some(s) => parse_pitch_arg(s)?,
            None => -12.0,
        };
        let upper = match parts.get(2).filter(|s| !s.is_empty()) {
            Some(s) => parse_pitch_arg(s)?,
            None => 12.0,
        };
        let origin = match parts.get(3).filter(|s| !s.is_empty()) {
            Some(s) => parse_pitch_arg(s)?,
            None => lower,
        };
        let step = parts
            .get(4)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|s| (0.00001..=100.0).contains(s))
            .unwrap_or(1.0);
        Ok(Self {
            sieve,
            lower,
            upper,
            origin,
            step,
        })
    }
}

impl SievePitch {
    /// Pitch space values of the sieve within the pitch range.
    pub fn pitches(&self) -> Vec<f64> {
        let n = self.origin.round() as i64;
        if self.step == 1.0 {
            let z = (self.lower as i64..=self.upper as i64).collect::<Vec<_>>();
            return self
                .sieve
                .segment_int(n, Some(&z))
                .into_iter()
                .map(|v| v as f64)
                .collect();
        }
        let mut grid = Vec::new();
        let mut value = self.lower;
        while value <= self.upper + 1e-9 {
            grid.push(value);
            value += self.step;
        }
        let n = ((self.origin - self.lower) / self.step).round() as i64;
        let z = (0..grid.len() as i64).collect::<Vec<_>>();
        self.sieve
            .segment_int(n, Some(&z))
            .into_iter()
            .filter_map(|i| grid.get(i as usize).copied())
            .collect()
    }
}

// -------------------------------------------------------------------------------------------------

fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// A segment of consecutive prime numbers of a given length starting at a given value.
/// Negative starts collect negated primes downwards to zero, then continue upwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimeSegment {
    segment: Vec<i64>,
}

impl PrimeSegment {
    pub fn new(start: i64, length: usize) -> Self {
        let mut segment = Vec::with_capacity(length);
        if start < 0 {
            let mut n = start.abs();
            while n >= 0 && segment.len() < length {
                if is_prime(n) {
                    segment.push(-n);
                }
                n -= 1;
            }
        }
        let mut n = start.max(0);
        while segment.len() < length {
            if is_prime(n) {
                segment.push(n);
            }
            n += 1;
        }
        Self { segment }
    }

    /// The segment in the given format, using the first and last prime as range.
    pub fn values(&self, format: SieveFormat) -> Vec<f64> {
        let z = match (self.segment.first(), self.segment.last()) {
            (Some(first), Some(last)) => (*first..=*last).collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        format_segment(&self.segment, &z, format)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse() {
        assert!(Sieve::try_from("3@2").is_ok());
        assert!(Sieve::try_from("(5|2)&4&8").is_ok());
        assert!(Sieve::try_from("[5 or 2] and -4@1").is_ok());
        assert!(Sieve::try_from("3@").is_err());
        assert!(Sieve::try_from("3@2|").is_err());
        assert!(Sieve::try_from("").is_err());
        assert_eq!(
            Sieve::try_from("3@11|-(4&5@1)").map(|s| s.to_string()).ok(),
            Some("3@2|-(4@0&5@1)".to_string())
        );
    }

    #[test]
    fn segments() -> Result<()> {
        let sieve = Sieve::try_from("3@11")?;
        assert_eq!(sieve.period(), 3);
        assert_eq!(
            sieve.segment_int(0, Some(&(3..15).collect::<Vec<_>>())),
            vec![5, 8, 11, 14]
        );
        let sieve = Sieve::try_from("2&4&8|5")?;
        assert_eq!(sieve.period(), 40);
        let sieve = Sieve::try_from("(5|2)&4&8")?;
        assert_eq!(sieve.segment(0, None, SieveFormat::Width), vec![8.0; 12]);
        let sieve = Sieve::try_from("-3@0")?.with_z_range(0, 6);
        assert_eq!(sieve.segment_int(0, None), vec![1, 2, 4, 5]);
        let sieve = Sieve::try_from("2@0^3@0")?.with_z_range(0, 12);
        assert_eq!(sieve.segment_int(0, None), vec![2, 3, 4, 8, 9, 10]);
        let sieve = Sieve::try_from("3")?.with_z_range(0, 6);
        assert_eq!(
            sieve.segment(0, None, SieveFormat::Binary),
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            sieve.segment(0, None, SieveFormat::Unit),
            vec![0.0, 0.5, 1.0]
        );
        Ok(())
    }

    #[test]
    fn collect() -> Result<()> {
        let sieve = Sieve::try_from("3@11")?;
        assert_eq!(
            sieve.collect(10, 100, 10, SieveFormat::Integer, 100)?,
            vec![102.0, 105.0, 108.0, 111.0, 114.0, 117.0, 120.0, 123.0, 126.0, 129.0]
        );
        assert_eq!(
            sieve.collect(0, 0, 3, SieveFormat::Width, 100)?,
            vec![3.0, 3.0, 3.0]
        );
        Ok(())
    }

    #[test]
    fn pitches() -> Result<()> {
        assert_eq!(SievePitch::try_from("4@7&5@4")?.pitches(), vec![7.0]);
        assert_eq!(
            SievePitch::try_from("3@0, c4, c5, c4, .5")?.pitches(),
            vec![0.0, 1.5, 3.0, 4.5, 6.0, 7.5, 9.0, 10.5, 12.0]
        );
        assert_eq!(
            SievePitch::try_from("3@0, c4, c5, c#4, .5")?.pitches(),
            vec![0.5, 2.0, 3.5, 5.0, 6.5, 8.0, 9.5, 11.0]
        );
        Ok(())
    }

    #[test]
    fn primes() {
        let primes = PrimeSegment::new(3, 5);
        assert_eq!(
            primes.values(SieveFormat::Integer),
            vec![3.0, 5.0, 7.0, 11.0, 13.0]
        );
        assert_eq!(
            primes.values(SieveFormat::Width),
            vec![2.0, 2.0, 4.0, 2.0]
        );
        let primes = PrimeSegment::new(-5, 4);
        assert_eq!(
            primes.values(SieveFormat::Integer),
            vec![-5.0, -3.0, -2.0, 2.0]
        );
    }
}
