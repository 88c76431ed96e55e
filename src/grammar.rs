//! Weighted Lindenmayer system rewriting with symbol to value maps.
//!
//! Grammar strings consist of symbol definitions, production rules and an optional axiom,
//! separated by `@`: `a{3}b{4} @ a{bab}b{a=3|b} @ ab`. Rule sources may contain `*` to match
//! any symbol. Rules with several weighted outputs choose one of them randomly.

use rand::Rng;

use crate::{
    error::{Error, Result},
    unit,
};

// -------------------------------------------------------------------------------------------------

const OPEN: char = '{';
const CLOSE: char = '}';
const SPLIT: char = '@';
const ASSIGN: char = '=';
const ASSIGN_DELIMITER: char = '|';
const ANY: char = '*';

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    source: Vec<char>,
    outputs: Vec<(String, f64)>,
}

impl Rule {
    fn matches(&self, state: &[char]) -> bool {
        self.source.len() <= state.len()
            && self
                .source
                .iter()
                .zip(state)
                .all(|(s, c)| *s == ANY || s == c)
    }

    fn wildcards(&self) -> usize {
        self.source.iter().filter(|c| **c == ANY).count()
    }
}

fn parse_rule_outputs(value: &str) -> Result<Vec<(String, f64)>> {
    let options = value.split(ASSIGN_DELIMITER).collect::<Vec<_>>();
    if options.len() == 1 {
        // a single weight is not significant
        let output = options[0].split(ASSIGN).next().unwrap_or_default();
        return Ok(vec![(output.to_string(), 1.0)]);
    }
    options
        .into_iter()
        .map(|option| match option.split_once(ASSIGN) {
            None => Ok((option.to_string(), 1.0)),
            Some((output, weight)) => weight
                .parse::<f64>()
                .ok()
                .filter(|w| *w > 0.0)
                .map(|w| (output.to_string(), w))
                .ok_or_else(|| {
                    Error::TransitionSyntax(format!("bad weight value given: '{option}'"))
                }),
        })
        .collect()
}

fn parse_groups(input: &str) -> Result<Vec<(String, String)>> {
    let mut groups = Vec::new();
    for group in input.split(CLOSE) {
        if !group.contains(OPEN) {
            continue;
        }
        let (key, value) = group
            .split_once(OPEN)
            .filter(|(_, value)| !value.contains(OPEN))
            .ok_or_else(|| Error::TransitionSyntax("badly placed delimiters".to_string()))?;
        groups.push((key.replace(' ', "").to_ascii_lowercase(), value.replace(' ', "")));
    }
    Ok(groups)
}

// -------------------------------------------------------------------------------------------------

/// A parsed grammar and its current rewriting state.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    symbols: Vec<(char, String)>,
    rules: Vec<Rule>,
    axiom: String,
    state: String,
}

impl Grammar {
    /// The defined symbols and their values.
    pub fn symbols(&self) -> impl Iterator<Item = (char, &str)> {
        self.symbols.iter().map(|(s, v)| (*s, v.as_str()))
    }

    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    /// Set a new axiom and reset the state to it.
    pub fn set_axiom(&mut self, axiom: &str) -> Result<()> {
        let axiom = axiom.trim().to_ascii_lowercase();
        if let Some(c) = axiom.chars().find(|c| !self.is_symbol(*c)) {
            return Err(Error::TransitionSyntax(format!(
                "bad axiom value given: '{c}'"
            )));
        }
        self.axiom = axiom;
        self.state = self.axiom.clone();
        Ok(())
    }

    /// The current state as symbol string.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The current state as symbol values.
    pub fn state_values(&self) -> Vec<&str> {
        self.state
            .chars()
            .filter_map(|c| {
                self.symbols
                    .iter()
                    .find(|(s, _)| *s == c)
                    .map(|(_, v)| v.as_str())
            })
            .collect()
    }

    /// Rewind the state to the axiom.
    pub fn reset(&mut self) {
        self.state = self.axiom.clone();
    }

    fn is_symbol(&self, c: char) -> bool {
        self.symbols.iter().any(|(s, _)| *s == c)
    }

    /// Apply all rules once to the current state. Rules are matched from left to right,
    /// preferring longer and more specific sources. Symbols without a rule are kept.
    pub fn next<R: Rng>(&mut self, rand_gen: &mut R) {
        if self.state.is_empty() {
            self.state = self.axiom.clone();
        }
        let state = self.state.chars().collect::<Vec<_>>();
        let mut rules = self.rules.iter().collect::<Vec<_>>();
        rules.sort_by(|a, b| {
            b.source
                .len()
                .cmp(&a.source.len())
                .then(a.wildcards().cmp(&b.wildcards()))
        });
        let mut result = String::new();
        let mut index = 0;
        while index < state.len() {
            match rules.iter().find(|rule| rule.matches(&state[index..])) {
                Some(rule) => {
                    result.push_str(&Self::choose_output(rule, rand_gen));
                    index += rule.source.len().max(1);
                }
                None => {
                    result.push(state[index]);
                    index += 1;
                }
            }
        }
        self.state = result;
    }

    fn choose_output<R: Rng>(rule: &Rule, rand_gen: &mut R) -> String {
        if rule.outputs.len() == 1 {
            return rule.outputs[0].0.clone();
        }
        let weights = rule.outputs.iter().map(|(_, w)| *w).collect::<Vec<_>>();
        match unit::boundary_proportion(&weights) {
            Ok(bounds) => {
                let index = unit::boundary_position(rand_gen.random::<f64>(), &bounds);
                rule.outputs[index].0.clone()
            }
            Err(_) => rule.outputs[0].0.clone(),
        }
    }
}

impl TryFrom<&str> for Grammar {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        if input.matches(OPEN).count() != input.matches(CLOSE).count() {
            return Err(Error::TransitionSyntax("all braces not paired".to_string()));
        }
        let input = input.replace(['"', '\''], "");
        let parts = input.split(SPLIT).collect::<Vec<_>>();
        if !(2..=3).contains(&parts.len()) {
            return Err(Error::TransitionSyntax(format!(
                "must include one or two split delimiters ({SPLIT})"
            )));
        }
        let mut symbols = Vec::new();
        for (key, value) in parse_groups(parts[0])? {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
                    symbols.push((c, value))
                }
                _ => {
                    return Err(Error::TransitionSyntax(format!(
                        "symbol definitions must be single lower case letters or digits: '{key}'"
                    )))
                }
            }
        }
        if symbols.is_empty() {
            return Err(Error::TransitionSyntax("no symbols defined".to_string()));
        }
        let known = |c: char| symbols.iter().any(|(s, _)| *s == c);
        let mut rules = Vec::new();
        for (key, value) in parse_groups(parts[1])? {
            if key.is_empty() || !key.chars().all(|c| c == ANY || known(c)) {
                return Err(Error::TransitionSyntax(format!(
                    "source rule component '{key}' references an undefined symbol"
                )));
            }
            let outputs = parse_rule_outputs(&value.to_ascii_lowercase())?;
            if outputs
                .iter()
                .any(|(output, _)| !output.chars().all(known))
            {
                return Err(Error::TransitionSyntax(format!(
                    "destination rule component '{value}' references an undefined symbol"
                )));
            }
            rules.push(Rule {
                source: key.chars().collect(),
                outputs,
            });
        }
        if rules.is_empty() {
            return Err(Error::TransitionSyntax("no rules defined".to_string()));
        }
        let axiom = symbols
            .first()
            .map(|(s, _)| s.to_string())
            .unwrap_or_default();
        let mut grammar = Self {
            symbols,
            rules,
            axiom: axiom.clone(),
            state: axiom,
        };
        if let Some(axiom) = parts.get(2) {
            grammar.set_axiom(axiom)?;
        }
        Ok(grammar)
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut symbols = self.symbols.clone();
        symbols.sort();
        for (s, v) in symbols {
            write!(f, "{s}{OPEN}{v}{CLOSE}")?;
        }
        write!(f, "{SPLIT}")?;
        for rule in &self.rules {
            let source = rule.source.iter().collect::<String>();
            let outputs = if rule.outputs.len() == 1 {
                rule.outputs[0].0.clone()
            } else {
                rule.outputs
                    .iter()
                    .map(|(o, w)| format!("{o}{ASSIGN}{w}"))
                    .collect::<Vec<_>>()
                    .join("|")
            };
            write!(f, "{source}{OPEN}{outputs}{CLOSE}")?;
        }
        write!(f, "{SPLIT}{}", self.axiom)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::new_rand_gen;
    use pretty_assertions::assert_eq;

    fn states(grammar: &mut Grammar, count: usize) -> Vec<String> {
        let mut rand_gen = new_rand_gen(0);
        (0..count)
            .map(|_| {
                grammar.next(&mut rand_gen);
                grammar.state().to_string()
            })
            .collect()
    }

    #[test]
    fn parse() -> Result<()> {
        assert!(Grammar::try_from("a{3}b{4} @ a{b}b{a|b}").is_ok());
        assert!(Grammar::try_from("a{3}b{4} @ a{b}b{a|b|c}").is_err());
        assert!(Grammar::try_from("a{3}b{4}c{3} @ a{b}d{a|b|c}").is_err());
        assert!(Grammar::try_from("a{3}b{4} @ a{b}b{a|b} @ baac").is_err());
        assert!(Grammar::try_from("a{3}b{4} @ a{*} @ b").is_err());
        assert!(Grammar::try_from("a{3}b{4} @ a{b=3|a=0}").is_err());
        assert!(Grammar::try_from("a{3}b{4} a{b}").is_err());
        let grammar = Grammar::try_from("a{3}b{4} @ a{b}b{a|b} @ a")?;
        assert_eq!(grammar.to_string(), "a{3}b{4}@a{b}b{a=1|b=1}@a");
        Ok(())
    }

    #[test]
    fn rewrite() -> Result<()> {
        let mut grammar = Grammar::try_from("a{3}b{4} @ a{bab}b{aab} @ abaa")?;
        assert_eq!(
            states(&mut grammar, 2),
            vec![
                "babaabbabbab".to_string(),
                "aabbabaabbabbabaabaabbabaabaabbabaab".to_string()
            ]
        );
        assert_eq!(grammar.state_values()[..4], ["3", "3", "4", "4"]);
        grammar.reset();
        assert_eq!(grammar.state(), "abaa");

        let mut grammar = Grammar::try_from("a{a}b{b} @ a{ab}b{a} @ b")?;
        assert_eq!(states(&mut grammar, 4), vec!["a", "ab", "aba", "abaab"]);

        let mut grammar = Grammar::try_from("a{3}b{4} @ aa{bb}bb{aaaa} @ bb")?;
        assert_eq!(states(&mut grammar, 3), vec!["aaaa", "bbbb", "aaaaaaaa"]);

        let mut grammar = Grammar::try_from("a{3}b{4} @ aaa{aba}aba{bbb}bbb{aaa} @ bbbbbb")?;
        assert_eq!(states(&mut grammar, 3), vec!["aaaaaa", "abaaba", "bbbbbb"]);

        let mut grammar = Grammar::try_from("a{3}b{4} @ a{bab}b{} @ bbabbabb")?;
        assert_eq!(states(&mut grammar, 2), vec!["babbab", "babbab"]);

        let mut grammar = Grammar::try_from("a{1}b{5}c{10} @ *{ab} @ c")?;
        assert_eq!(states(&mut grammar, 2), vec!["ab", "abab"]);
        Ok(())
    }

    #[test]
    fn weighted() -> Result<()> {
        let mut grammar = Grammar::try_from("a{3}b{4} @ a{b=5|a} b{a|b=5} @ a")?;
        let post = states(&mut grammar, 100);
        assert!(post.iter().filter(|s| *s == "b").count() > 70);
        Ok(())
    }
}
