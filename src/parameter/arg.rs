//! Argument trees of parameter objects, as parsed from strings or deserialized from projects.

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// -------------------------------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "parameter/arg.pest"]
struct ArgParser {}

// -------------------------------------------------------------------------------------------------

/// A parameter object argument: a number, a string or a nested list of arguments.
///
/// A list whose first item is a string names a parameter object, e.g. `(ru, 0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Number(f64),
    String(String),
    List(Vec<Arg>),
}

impl Arg {
    /// Parse an argument string such as `"ru, 0, (c, 1)"` or `"(ws, e, 30, 0, 0, 1)"`.
    ///
    /// A top level sequence of more than one item, or a single list, becomes a list. A single
    /// number or string stays a scalar.
    pub fn parse(input: &str) -> Result<Self> {
        let pairs = ArgParser::parse(Rule::args, input).map_err(|err| {
            Error::ParameterObjectSyntax(format!("invalid argument string '{input}': {err}"))
        })?;
        let mut items = pairs
            .flat_map(|pair| pair.into_inner())
            .filter(|pair| pair.as_rule() != Rule::EOI)
            .map(Self::from_pair)
            .collect::<Result<Vec<_>>>()?;
        match items.len() {
            0 => Err(Error::ParameterObjectSyntax(format!(
                "empty argument string '{input}'"
            ))),
            1 => Ok(items.remove(0)),
            _ => Ok(Self::List(items)),
        }
    }

    fn from_pair(pair: Pair<Rule>) -> Result<Self> {
        match pair.as_rule() {
            Rule::number => pair.as_str().parse::<f64>().map(Self::Number).map_err(|err| {
                Error::ParameterObjectSyntax(format!("invalid number '{}': {err}", pair.as_str()))
            }),
            Rule::word => Ok(Self::String(pair.as_str().to_string())),
            Rule::quoted => Ok(Self::String(
                pair.into_inner()
                    .next()
                    .map(|inner| inner.as_str().to_string())
                    .unwrap_or_default(),
            )),
            Rule::list => Ok(Self::List(
                pair.into_inner()
                    .map(Self::from_pair)
                    .collect::<Result<Vec<_>>>()?,
            )),
            rule => Err(Error::ParameterObjectSyntax(format!(
                "unexpected argument element {rule:?}"
            ))),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::String(value) => value.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Arg]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the parameter object this argument describes, if any.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::List(items) => items.first().and_then(Arg::as_str),
            Self::String(name) => Some(name),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => {
                let braced = value.contains('{') && value.contains('}');
                let needs_quotes =
                    value.is_empty() || (value.contains([',', '(', ')', '[', ']', ' ']) && !braced);
                if needs_quotes {
                    write!(f, "\"{value}\"")
                } else {
                    f.write_str(value)
                }
            }
            Self::List(items) => {
                f.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse() -> Result<()> {
        assert_eq!(
            Arg::parse("ru, 0, .25")?,
            Arg::List(vec!["ru".into(), 0.0.into(), 0.25.into()])
        );
        assert_eq!(Arg::parse("(ru, 0, 1)")?, Arg::parse("ru,0,1")?);
        assert_eq!(Arg::parse("-3")?, Arg::Number(-3.0));
        assert_eq!(
            Arg::parse("bg, rc, [1, 3, -4.5]")?,
            Arg::List(vec![
                "bg".into(),
                "rc".into(),
                Arg::List(vec![1.0.into(), 3.0.into(), (-4.5).into()])
            ])
        );
        assert_eq!(
            Arg::parse("mv, a{3,1,1}b{2,1,1}:{a=1|b=2}, (c, 0)")?,
            Arg::List(vec![
                "mv".into(),
                "a{3,1,1}b{2,1,1}:{a=1|b=2}".into(),
                Arg::List(vec!["c".into(), 0.0.into()])
            ])
        );
        assert_eq!(
            Arg::parse("vs, \"3&19|4&13@11\", 360")?,
            Arg::List(vec!["vs".into(), "3&19|4&13@11".into(), 360.0.into()])
        );
        assert_eq!(
            Arg::parse("sl, 3|4, -12, 12")?,
            Arg::List(vec!["sl".into(), "3|4".into(), (-12.0).into(), 12.0.into()])
        );
        assert_eq!(Arg::parse("pml, (), 0")?.as_list().map(|l| l.len()), Some(3));
        assert_eq!(Arg::parse("3e")?, Arg::String("3e".into()));
        assert!(Arg::parse("(ru, 0").is_err());
        assert!(Arg::parse("").is_err());
        Ok(())
    }

    #[test]
    fn display() -> Result<()> {
        let arg = Arg::parse("ws,e,30,0,(c,.5),1")?;
        assert_eq!(arg.to_string(), "(ws, e, 30, 0, (c, 0.5), 1)");
        assert_eq!(Arg::parse(&arg.to_string())?, arg);
        let arg = Arg::parse("cv, f{s}k{2}, 110")?;
        assert_eq!(Arg::parse(&arg.to_string())?, arg);
        let json = serde_json::to_string(&arg)?;
        assert_eq!(json, r#"["cv","f{s}k{2}",110.0]"#);
        assert_eq!(serde_json::from_str::<Arg>(&json)?, arg);
        Ok(())
    }
}
