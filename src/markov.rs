//! Markov transition tables of arbitrary order, either parsed from transition strings or
//! derived from an analysis of existing sequences.
//!
//! Transition strings define symbols with their values, followed by weighted transitions:
//! `a{.2}b{.5}:{a=5|b=4}a:{b=1}b:{a=2|b=1}`. The key `:` defines zero order weights, `a:`
//! first order weights after `a`, `a:b:` second order weights, and so on. Key segments may
//! use expressions: `*` matches any symbol, `-a` any symbol but `a` and `a|b` either `a` or `b`.

use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    unit,
};

// -------------------------------------------------------------------------------------------------

/// Maximum number of previously generated values that generators keep as Markov history.
pub const MARKOV_HISTORY_LIMIT: usize = 10;

const OPEN: char = '{';
const CLOSE: char = '}';
const ASSIGN: char = '=';
const ASSIGN_DELIMITER: char = '|';
const STEP: char = ':';

// -------------------------------------------------------------------------------------------------

/// A single segment of a transition key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeySegment {
    Symbol(String),
    Any,
    Not(String),
    Or(Vec<String>),
}

impl KeySegment {
    fn matches(&self, symbol: &str) -> bool {
        match self {
            KeySegment::Symbol(s) => s == symbol,
            KeySegment::Any => true,
            KeySegment::Not(s) => s != symbol,
            KeySegment::Or(symbols) => symbols.iter().any(|s| s == symbol),
        }
    }

    fn repr(&self) -> String {
        match self {
            KeySegment::Symbol(s) => s.clone(),
            KeySegment::Any => "*".to_string(),
            KeySegment::Not(s) => format!("-{s}"),
            KeySegment::Or(symbols) => symbols.join("|"),
        }
    }

    fn symbols(&self) -> Vec<&str> {
        match self {
            KeySegment::Symbol(s) | KeySegment::Not(s) => vec![s.as_str()],
            KeySegment::Any => vec![],
            KeySegment::Or(symbols) => symbols.iter().map(String::as_str).collect(),
        }
    }
}

type TransitionKey = Vec<KeySegment>;
type WeightList = Vec<(String, f64)>;

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn parse_key(key: &str) -> Result<TransitionKey> {
    let mut segments = Vec::new();
    for segment in key.split(STEP).map(str::trim).filter(|s| !s.is_empty()) {
        if !segment
            .chars()
            .all(|c| is_symbol_char(c) || matches!(c, '*' | '-' | '|'))
        {
            return Err(Error::TransitionSyntax(format!(
                "transition key uses illegal characters: '{key}'"
            )));
        }
        let operators = ['*', '-', '|']
            .iter()
            .filter(|op| segment.contains(**op))
            .count();
        let segment = match operators {
            0 => KeySegment::Symbol(segment.to_string()),
            1 if segment.contains('|') => KeySegment::Or(
                segment
                    .split('|')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            1 if segment.contains('*') => KeySegment::Any,
            1 => KeySegment::Not(segment.replace('-', "")),
            _ => {
                return Err(Error::TransitionSyntax(
                    "only one operator may be used per transition key segment".to_string(),
                ))
            }
        };
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_weights(value: &str) -> Result<WeightList> {
    let mut weights = Vec::new();
    for assign in value.split(ASSIGN_DELIMITER) {
        if !assign.contains(ASSIGN) {
            continue;
        }
        let (symbol, weight) = assign
            .split_once(ASSIGN)
            .filter(|(_, w)| !w.contains(ASSIGN))
            .ok_or_else(|| {
                Error::TransitionSyntax(format!("incorrect weight specification: '{assign}'"))
            })?;
        let weight = weight
            .parse::<f64>()
            .ok()
            .filter(|w| *w > 0.0)
            .ok_or_else(|| {
                Error::TransitionSyntax(format!("bad weight value given: '{assign}'"))
            })?;
        weights.push((symbol.to_string(), weight));
    }
    Ok(weights)
}

/// Generate alphabetic labels `a`..`z`, `aa`, `ab`, ... for symbols of analysed sequences.
fn alpha_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push((b'a' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.iter().rev().collect()
}

// -------------------------------------------------------------------------------------------------

/// A Markov transition table.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    symbols: Vec<(String, String)>,
    weights: BTreeMap<TransitionKey, WeightList>,
    orders: Vec<usize>,
}

impl Transition {
    /// Analyse the given sequence of values for all orders from 0 up to `order`.
    pub fn from_analysis<S: AsRef<str>>(data: &[S], order: usize) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::TransitionSyntax(
                "cannot analyse an empty sequence".to_string(),
            ));
        }
        let data = data.iter().map(|s| s.as_ref().to_string()).collect::<Vec<_>>();
        let order = order.min(data.len() - 1);
        let mut symbols: Vec<(String, String)> = Vec::new();
        for value in &data {
            if !symbols.iter().any(|(_, v)| v == value) {
                symbols.push((alpha_label(symbols.len()), value.clone()));
            }
        }
        let mut transition = Self {
            symbols,
            weights: BTreeMap::new(),
            orders: Vec::new(),
        };
        let labels = data
            .iter()
            .map(|value| transition.value_to_symbol(value).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        // zero order: plain symbol counts
        let zero = transition
            .symbols
            .iter()
            .map(|(s, _)| {
                let count = labels.iter().filter(|l| *l == s).count();
                (s.clone(), count as f64)
            })
            .collect::<Vec<_>>();
        transition.weights.insert(vec![], zero);
        // nth order: wrap the sequence around so that every value has a successor
        for n in 1..=order {
            let mut wrapped = labels.clone();
            wrapped.extend_from_slice(&labels[..n]);
            for window in wrapped.windows(n + 1) {
                let key = window[..n]
                    .iter()
                    .map(|s| KeySegment::Symbol(s.clone()))
                    .collect::<Vec<_>>();
                let destination = &window[n];
                let list = transition.weights.entry(key).or_default();
                match list.iter_mut().find(|(s, _)| s == destination) {
                    Some((_, w)) => *w += 1.0,
                    None => list.push((destination.clone(), 1.0)),
                }
            }
        }
        transition.update_orders()?;
        Ok(transition)
    }

    /// Analyse a space delimited string of values.
    pub fn from_string_analysis(data: &str, order: usize) -> Result<Self> {
        let values = data
            .split(|c: char| c.is_whitespace() || matches!(c, '-' | OPEN | CLOSE))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        Self::from_analysis(&values, order)
    }

    fn update_orders(&mut self) -> Result<()> {
        let mut orders = Vec::new();
        for (key, weights) in &self.weights {
            if !orders.contains(&key.len()) {
                orders.push(key.len());
            }
            for symbol in key.iter().flat_map(KeySegment::symbols) {
                if !self.symbols.iter().any(|(s, _)| s == symbol) {
                    return Err(Error::TransitionSyntax(format!(
                        "transition key uses undefined symbol '{symbol}'"
                    )));
                }
            }
            for (symbol, _) in weights {
                if !self.symbols.iter().any(|(s, _)| s == symbol) {
                    return Err(Error::TransitionSyntax(format!(
                        "weight specified for undefined symbol '{symbol}'"
                    )));
                }
            }
        }
        orders.sort();
        self.orders = orders;
        Ok(())
    }

    /// All symbol values, in definition order.
    pub fn values(&self) -> Vec<&str> {
        self.symbols.iter().map(|(_, v)| v.as_str()).collect()
    }

    /// Highest defined transition order.
    pub fn max_order(&self) -> usize {
        self.orders.last().copied().unwrap_or(0)
    }

    fn value_to_symbol(&self, value: &str) -> Result<&str> {
        self.symbols
            .iter()
            .find(|(_, v)| v == value)
            .map(|(s, _)| s.as_str())
            .ok_or_else(|| {
                Error::TransitionSyntax(format!("value '{value}' is not a transition symbol"))
            })
    }

    fn find_weights(&self, source: &[&str]) -> Option<&WeightList> {
        let direct = source
            .iter()
            .map(|s| KeySegment::Symbol(s.to_string()))
            .collect::<Vec<_>>();
        if let Some(weights) = self.weights.get(&direct) {
            return Some(weights);
        }
        self.weights
            .iter()
            .filter(|(key, _)| key.len() == source.len())
            .find(|(key, _)| key.iter().zip(source).all(|(seg, s)| seg.matches(s)))
            .map(|(_, weights)| weights)
    }

    /// Select the next value with the unit interval value `unit_value`, given previously
    /// generated values and the desired order. With too few previous values, the longest
    /// possible order is used. Unknown orders fall back to the highest defined order, and
    /// missing transitions to an equal distribution over all symbols.
    pub fn next<S: AsRef<str>>(&self, unit_value: f64, previous: &[S], order: usize) -> Result<&str> {
        let order = if order > self.max_order() {
            self.max_order()
        } else {
            order
        };
        let source = if previous.len() <= order {
            previous
        } else if order == 0 {
            &previous[..0]
        } else {
            &previous[previous.len() - order..]
        };
        let source = source
            .iter()
            .map(|v| self.value_to_symbol(v.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let (weights, symbols): (Vec<f64>, Vec<&str>) = match self.find_weights(&source) {
            Some(list) => list.iter().map(|(s, w)| (*w, s.as_str())).unzip(),
            None => self.symbols.iter().map(|(s, _)| (1.0, s.as_str())).unzip(),
        };
        // analysed zero order weights may contain zeros
        let (weights, symbols): (Vec<f64>, Vec<&str>) = weights
            .into_iter()
            .zip(symbols)
            .filter(|(w, _)| *w > 0.0)
            .unzip();
        if symbols.is_empty() {
            return Err(Error::TransitionSyntax("no weighted transitions".to_string()));
        }
        let bounds = unit::boundary_proportion(&weights)
            .map_err(|err| Error::TransitionSyntax(err.to_string()))?;
        let symbol = symbols[unit::boundary_position(unit_value, &bounds)];
        self.symbols
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| Error::TransitionSyntax(format!("undefined symbol '{symbol}'")))
    }
}

impl TryFrom<&str> for Transition {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        if input.matches(OPEN).count() != input.matches(CLOSE).count() {
            return Err(Error::TransitionSyntax("all braces not paired".to_string()));
        }
        let input = input.replace(['"', '\''], "");
        let mut symbols = Vec::new();
        let mut weights = BTreeMap::new();
        for group in input.split(CLOSE) {
            if !group.contains(OPEN) {
                continue;
            }
            let (key, value) = group
                .split_once(OPEN)
                .filter(|(_, value)| !value.contains(OPEN))
                .ok_or_else(|| Error::TransitionSyntax("badly placed delimiters".to_string()))?;
            let key = key.replace(' ', "").to_ascii_lowercase();
            if key.contains(STEP) || value.contains(ASSIGN) {
                let value = value.replace(' ', "").to_ascii_lowercase();
                weights.insert(parse_key(&key)?, parse_weights(&value)?);
            } else {
                if key.is_empty() || !key.chars().all(is_symbol_char) {
                    return Err(Error::TransitionSyntax(format!(
                        "symbol definition uses illegal characters: '{key}'"
                    )));
                }
                symbols.push((key, value.replace(' ', "")));
            }
        }
        if symbols.is_empty() {
            return Err(Error::TransitionSyntax("no symbols defined".to_string()));
        }
        if weights.is_empty() {
            return Err(Error::TransitionSyntax("no weights defined".to_string()));
        }
        let mut transition = Self {
            symbols,
            weights,
            orders: Vec::new(),
        };
        transition.update_orders()?;
        Ok(transition)
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut symbols = self.symbols.iter().collect::<Vec<_>>();
        symbols.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then(a.0.cmp(&b.0)));
        for (s, v) in symbols {
            write!(f, "{s}{OPEN}{v}{CLOSE}")?;
        }
        let mut keys = self.weights.keys().collect::<Vec<_>>();
        keys.sort_by_key(|key| key.len());
        for key in keys {
            let label = key.iter().map(KeySegment::repr).collect::<Vec<_>>().join(":");
            let weights = self.weights[key]
                .iter()
                .filter(|(_, w)| *w != 0.0)
                .map(|(s, w)| format!("{s}{ASSIGN}{w}"))
                .collect::<Vec<_>>()
                .join("|");
            write!(f, "{label}{STEP}{OPEN}{weights}{CLOSE}")?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse() -> Result<()> {
        let transition = Transition::try_from("a{234} b{12} :{a=3|b=3}")?;
        assert_eq!(transition.values(), vec!["234", "12"]);
        assert_eq!(transition.max_order(), 0);

        let transition = Transition::try_from("a{.2}b{.5}:{a=5|b=4}a:{b=1}b:a:{a=2}")?;
        assert_eq!(transition.max_order(), 2);

        assert!(Transition::try_from("a{1}b{2}:{a=1").is_err());
        assert!(Transition::try_from("a{1}:{a=0}").is_err());
        assert!(Transition::try_from("a{1}:{c=1}").is_err());
        assert!(Transition::try_from("A!{1}:{a=1}").is_err());
        assert!(Transition::try_from(":{a=1}").is_err());
        assert!(Transition::try_from("a{1}").is_err());
        assert!(Transition::try_from("a{1}b{2}:{a=1}*:-a|b:{a=1}").is_err());
        Ok(())
    }

    #[test]
    fn next() -> Result<()> {
        let transition = Transition::try_from("a{x}b{y}c{z}:{a=1}a:{b=1}b:{c=1}-b:a:{a=1}")?;
        assert_eq!(transition.next(0.5, &[] as &[&str], 0)?, "x");
        assert_eq!(transition.next(0.5, &["x"], 1)?, "y");
        assert_eq!(transition.next(0.5, &["y"], 1)?, "z");
        // too few previous values use their length as order
        assert_eq!(transition.next(0.5, &["x"], 2)?, "y");
        // expression keys
        assert_eq!(transition.next(0.5, &["z", "x"], 2)?, "x");
        // no defined transition: equal distribution
        assert_eq!(transition.next(0.0, &["z"], 1)?, "x");
        assert_eq!(transition.next(0.99, &["z"], 1)?, "z");
        assert!(transition.next(0.5, &["w"], 1).is_err());
        Ok(())
    }

    #[test]
    fn analysis() -> Result<()> {
        let transition = Transition::from_string_analysis("a b a a a c c d a a c a c a", 2)?;
        assert_eq!(transition.values(), vec!["a", "b", "c", "d"]);
        assert_eq!(transition.max_order(), 2);
        // d is always followed by a
        assert_eq!(transition.next(0.7, &["d"], 1)?, "a");
        let transition = Transition::from_analysis(&["1", "2", "1", "2"], 1)?;
        assert_eq!(transition.next(0.3, &["1"], 1)?, "2");
        assert_eq!(transition.to_string(), "a{1}b{2}:{a=2|b=2}a:{b=2}b:{a=2}");
        assert_eq!(alpha_label(27), "ab");
        assert!(Transition::from_analysis(&[] as &[&str], 1).is_err());
        Ok(())
    }
}
