//! Constants, cycles, formatting and reference readers.

use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    orchestra::OrchestraKind,
    parameter::{Arg, Args, Generator, GeneratorObject, OutputFormat, RefDict, Value},
    selector::{Selector, SelectorKind},
};

// -------------------------------------------------------------------------------------------------

/// Always returns the same value.
#[derive(Debug, Clone)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let value = match args.get(0)? {
            Arg::Number(value) => Value::Number(*value),
            Arg::String(value) => Value::String(value.clone()),
            arg => {
                return Err(Error::ParameterObjectSyntax(format!(
                    "constant: expected a number or string, got '{arg}'"
                )))
            }
        };
        Ok(Self::new(value))
    }
}

impl Generator for Constant {
    fn output_format(&self) -> OutputFormat {
        match self.value {
            Value::Number(_) => OutputFormat::Number,
            Value::String(_) => OutputFormat::String,
        }
    }

    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        self.value.clone()
    }

    fn reset(&mut self) {
        // nothing to do
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// An instrument number, validated against an orchestra.
#[derive(Debug, Clone)]
pub struct StaticInst {
    instrument: usize,
    orchestra: OrchestraKind,
}

impl StaticInst {
    pub fn from_args(args: &Args) -> Result<Self> {
        let instrument = args.count(0)?;
        let orchestra = args.option::<OrchestraKind>(1)?;
        if !orchestra.orchestra().has_instrument(instrument) {
            return Err(Error::ParameterObjectSyntax(format!(
                "staticInst: orchestra {orchestra} has no instrument {instrument}"
            )));
        }
        Ok(Self {
            instrument,
            orchestra,
        })
    }

    pub fn orchestra(&self) -> OrchestraKind {
        self.orchestra
    }

    pub fn instrument(&self) -> usize {
        self.instrument
    }
}

impl Generator for StaticInst {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::Integer
    }

    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        Value::Number(self.instrument as f64)
    }

    fn reset(&mut self) {
        // nothing to do
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// A fixed time range. Evaluates to the range start.
#[derive(Debug, Clone)]
pub struct StaticRange {
    start: f64,
    end: f64,
}

impl StaticRange {
    pub fn from_args(args: &Args) -> Result<Self> {
        let values = args.values(0)?;
        let [start, end] = values[..] else {
            return Err(Error::ParameterObjectSyntax(format!(
                "staticRange: expected a (start, end) pair, got {} values",
                values.len()
            )));
        };
        if end < start || start < 0.0 {
            return Err(Error::ParameterObjectSyntax(format!(
                "staticRange: invalid range ({start}, {end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.start, self.end)
    }
}

impl Generator for StaticRange {
    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        Value::Number(self.start)
    }

    fn reset(&mut self) {
        // nothing to do
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Direction of a [`CyclicGen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    UpDown,
    DownUp,
    Up,
    Down,
}

impl TryFrom<&str> for CycleDirection {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "updown" | "ud" => Ok(Self::UpDown),
            "downup" | "du" => Ok(Self::DownUp),
            "up" | "u" => Ok(Self::Up),
            "down" | "d" => Ok(Self::Down),
            _ => Err(format!(
                "invalid direction '{value}', expected one of 'ud', 'du', 'u', 'd'"
            )),
        }
    }
}

/// Cycles between min and max by a fixed increment, either wrapping or bouncing.
#[derive(Debug, Clone)]
pub struct CyclicGen {
    direction: CycleDirection,
    min: f64,
    max: f64,
    increment: f64,
    current: f64,
    sign: f64,
}

impl CyclicGen {
    pub fn from_args(args: &Args) -> Result<Self> {
        let direction = args.option::<CycleDirection>(0)?;
        let (a, b) = (args.number(1)?, args.number(2)?);
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let increment = args.number(3)?.abs();
        if increment == 0.0 || increment > max - min {
            return Err(Error::ParameterObjectSyntax(format!(
                "cyclicGen: increment {increment} must be above zero and within ({min}, {max})"
            )));
        }
        let mut cycle = Self {
            direction,
            min,
            max,
            increment,
            current: 0.0,
            sign: 1.0,
        };
        cycle.reset();
        Ok(cycle)
    }
}

impl Generator for CyclicGen {
    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        const EPSILON: f64 = 1e-9;
        let value = self.current;
        let mut next = self.current + self.increment * self.sign;
        match self.direction {
            CycleDirection::Up | CycleDirection::Down => {
                if next > self.max + EPSILON {
                    next = self.min;
                } else if next < self.min - EPSILON {
                    next = self.max;
                }
            }
            CycleDirection::UpDown | CycleDirection::DownUp => {
                if next > self.max + EPSILON || next < self.min - EPSILON {
                    self.sign = -self.sign;
                    next = self.current + self.increment * self.sign;
                }
            }
        }
        self.current = next;
        Value::Number(value)
    }

    fn reset(&mut self) {
        match self.direction {
            CycleDirection::Up | CycleDirection::UpDown => {
                self.current = self.min;
                self.sign = 1.0;
            }
            CycleDirection::Down | CycleDirection::DownUp => {
                self.current = self.max;
                self.sign = -1.0;
            }
        }
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Always returns the same file path.
#[derive(Debug, Clone)]
pub struct ConstantFile {
    path: String,
}

impl ConstantFile {
    pub fn from_args(args: &Args) -> Result<Self> {
        let path = match args.get(0)? {
            Arg::Number(value) => value.to_string(),
            arg => args
                .string(0)
                .map_err(|_| {
                    Error::ParameterObjectSyntax(format!("constantFile: invalid path '{arg}'"))
                })?
                .to_string(),
        };
        Ok(Self { path })
    }
}

impl Generator for ConstantFile {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::String
    }

    fn value(&mut self, _t: f64, _context: &RefDict) -> Value {
        Value::String(self.path.clone())
    }

    fn reset(&mut self) {
        // nothing to do
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// String formats of [`TypeFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    String,
    StringQuote,
}

impl TryFrom<&str> for StringFormat {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" | "s" => Ok(Self::String),
            "stringquote" | "sq" => Ok(Self::StringQuote),
            _ => Err(format!(
                "invalid string format '{value}', expected 'string' or 'stringQuote'"
            )),
        }
    }
}

/// Formats the values of a generator as strings.
#[derive(Debug, Clone)]
pub struct TypeFormat {
    format: StringFormat,
    source: GeneratorObject,
}

impl TypeFormat {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            format: args.option(0)?,
            source: args.generator(1)?,
        })
    }
}

impl Generator for TypeFormat {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::String
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let value = self.source.value(t, context).to_string();
        match self.format {
            StringFormat::String => Value::String(value),
            StringFormat::StringQuote => Value::String(format!("\"{value}\"")),
        }
    }

    fn reset(&mut self) {
        self.source.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// The reciprocal of a generator's values.
#[derive(Debug, Clone)]
pub struct OneOver {
    source: GeneratorObject,
    last: f64,
}

impl OneOver {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            source: args.generator(0)?,
            last: 0.0,
        })
    }
}

impl Generator for OneOver {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let value = self.source.number(t, context);
        if value == 0.0 {
            log::warn!("oneOver: division by zero at time {t}, using last value");
        } else {
            self.last = 1.0 / value;
        }
        Value::Number(self.last)
    }

    fn reset(&mut self) {
        self.source.reset();
        self.last = 0.0;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

const PATH_FORMATS: [&str; 8] = ["forte", "sc", "mason", "fq", "ps", "midi", "pch", "name"];

/// Reads the current multiset of the texture's path in a representation format.
#[derive(Debug, Clone)]
pub struct PathRead {
    format: &'static str,
}

impl PathRead {
    pub fn from_args(args: &Args) -> Result<Self> {
        let name = args.string(0)?.to_ascii_lowercase();
        let format = PATH_FORMATS
            .iter()
            .find(|f| **f == name)
            .ok_or_else(|| {
                Error::ParameterObjectSyntax(format!(
                    "pathRead: invalid format '{name}', expected one of {}",
                    PATH_FORMATS.join(", ")
                ))
            })?;
        Ok(Self { format })
    }
}

impl Generator for PathRead {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::String
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        match &context.multiset {
            Some(multiset) => Value::String(multiset.repr(self.format, false)),
            None => {
                log::warn!("pathRead: no multiset available at time {t}");
                Value::String(String::new())
            }
        }
    }

    fn reset(&mut self) {
        // nothing to do
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Chooses files with an extension from a directory, searched within the audio directories of
/// the reference context. Files are collected on the first evaluation.
#[derive(Debug, Clone)]
pub struct DirectorySelect {
    directory: String,
    extension: String,
    kind: SelectorKind,
    seed: u64,
    selector: Option<Selector<PathBuf>>,
}

impl DirectorySelect {
    pub fn from_args(args: &Args) -> Result<Self> {
        let directory = args.string(0)?.to_string();
        let extension = args
            .string(1)?
            .trim_start_matches('.')
            .to_ascii_lowercase();
        Ok(Self {
            directory,
            extension,
            kind: args.option(2)?,
            seed: args.seed(),
            selector: None,
        })
    }

    fn collect_files(&self, context: &RefDict) -> Vec<PathBuf> {
        let directory = Path::new(&self.directory);
        let candidates = if directory.is_absolute() || context.audio_dirs.is_empty() {
            vec![directory.to_path_buf()]
        } else {
            context
                .audio_dirs
                .iter()
                .map(|dir| dir.join(directory))
                .collect()
        };
        let mut files = Vec::new();
        for candidate in candidates {
            let Ok(entries) = std::fs::read_dir(&candidate) else {
                continue;
            };
            files.extend(entries.flatten().map(|entry| entry.path()).filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.to_string_lossy().to_ascii_lowercase() == self.extension)
            }));
        }
        files.sort();
        files
    }
}

impl Generator for DirectorySelect {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::String
    }

    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        if self.selector.is_none() {
            let files = self.collect_files(context);
            match Selector::new(files, self.kind, self.seed) {
                Ok(selector) => self.selector = Some(selector),
                Err(_) => {
                    log::warn!(
                        "directorySelect: no '{}' files found in '{}' at time {t}",
                        self.extension,
                        self.directory
                    );
                    return Value::String(String::new());
                }
            }
        }
        match self.selector.as_mut() {
            Some(selector) => Value::String(selector.next().to_string_lossy().to_string()),
            None => Value::String(String::new()),
        }
    }

    fn reset(&mut self) {
        self.selector = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{multiset::Multiset, parameter::GeneratorObject};

    fn values(input: &str, count: usize) -> Result<Vec<String>> {
        let mut generator = GeneratorObject::parse(input, 1)?;
        let context = RefDict::default();
        Ok((0..count)
            .map(|i| generator.value(i as f64, &context).to_string())
            .collect())
    }

    #[test]
    fn constants() -> Result<()> {
        assert_eq!(values("c, 3", 2)?, vec!["3", "3"]);
        assert_eq!(values("c, abc", 1)?, vec!["abc"]);
        assert_eq!(values("si, 3, csoundNative", 1)?, vec!["3"]);
        assert!(GeneratorObject::parse("si, 999, csoundNative", 1).is_err());
        assert_eq!(values("sr, (2, 10)", 1)?, vec!["2"]);
        assert!(GeneratorObject::parse("sr, (10, 2)", 1).is_err());
        assert_eq!(values("cf, /tmp/a.aif", 1)?, vec!["/tmp/a.aif"]);
        Ok(())
    }

    #[test]
    fn cycles() -> Result<()> {
        assert_eq!(
            values("cg, ud, 0, 3, 1", 8)?,
            vec!["0", "1", "2", "3", "2", "1", "0", "1"]
        );
        assert_eq!(values("cg, u, 0, 2, 1", 5)?, vec!["0", "1", "2", "0", "1"]);
        assert_eq!(values("cg, d, 0, 2, 1", 4)?, vec!["2", "1", "0", "2"]);
        assert_eq!(values("cg, du, 0, 2, 1", 5)?, vec!["2", "1", "0", "1", "2"]);
        assert!(GeneratorObject::parse("cg, ud, 0, 1, 2", 1).is_err());
        Ok(())
    }

    #[test]
    fn formats() -> Result<()> {
        assert_eq!(values("tf, sq, (bg, oc, (0, 1))", 2)?, vec!["\"0\"", "\"1\""]);
        assert_eq!(values("tf, s, (c, 2.5)", 1)?, vec!["2.5"]);
        assert_eq!(values("oo, (c, 4)", 1)?, vec!["0.25"]);
        assert_eq!(values("oo, (bg, oc, (2, 0))", 2)?, vec!["0.5", "0.5"]);
        Ok(())
    }

    #[test]
    fn path_read() -> Result<()> {
        let mut generator = GeneratorObject::parse("pr, forte", 1)?;
        let context = RefDict {
            multiset: Some(Multiset::from_pitches(vec![0.0, 4.0, 7.0])?),
            ..RefDict::default()
        };
        assert_eq!(generator.value(0.0, &context).to_string(), "3-11B");
        assert_eq!(generator.output_format(), OutputFormat::String);
        assert!(GeneratorObject::parse("pr, nope", 1).is_err());
        Ok(())
    }

    #[test]
    fn directory_select() -> Result<()> {
        let dir = std::env::temp_dir().join("athenacl_directory_select");
        std::fs::create_dir_all(&dir)?;
        for name in ["b.aif", "a.aif", "c.wav"] {
            std::fs::write(dir.join(name), [])?;
        }
        let mut generator =
            GeneratorObject::parse(&format!("ds, \"{}\", aif, oc", dir.display()), 1)?;
        let context = RefDict::default();
        let first = generator.value(0.0, &context).to_string();
        let second = generator.value(1.0, &context).to_string();
        assert!(first.ends_with("a.aif"));
        assert!(second.ends_with("b.aif"));
        Ok(())
    }
}
