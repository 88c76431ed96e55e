//! Parameter objects: lazily evaluated, composable value producers which drive textures and
//! clones.
//!
//! There are four kinds of parameter objects:
//! - [`Generator`]s produce a value for a given time and reference context.
//! - [`Rhythm`]s produce a duration, sustain and accent triple.
//! - [`Filter`]s transform arrays of event values and are used by clones.
//! - Statics are fixed, typed options of textures ([`TextureStatic`]) and clones
//!   ([`CloneStatic`]).
//!
//! All of them are created from an argument tree ([`Arg`]) via the [`registry`], which maps
//! long names and short aliases to constructors, validates the arguments and fills in defaults.

use std::{fmt::Debug, path::PathBuf};

use crate::{error::Result, multiset::Multiset, pulse::Pulse};

pub mod arg;
pub mod args;
pub mod filter;
pub mod generator;
pub mod registry;
pub mod rhythm;
pub mod statics;

pub use arg::Arg;
pub use args::Args;
pub use statics::{
    CloneStatic, Level, RetrogradeMethod, TextureStatic, TextureStatics, TimeReference,
};

// -------------------------------------------------------------------------------------------------

/// Declared output format of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Number,
    Integer,
    String,
}

/// A generated value. Most generators produce numbers, some produce strings such as file
/// paths or formatted values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
}

impl Value {
    /// Numeric representation. Strings which can't be parsed as numbers are 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::String(value) => value.trim().trim_matches('"').parse().unwrap_or(0.0),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Reference context of a parameter object evaluation: the state of the texture at the time
/// of the current event.
#[derive(Debug, Clone, PartialEq)]
pub struct RefDict {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// The current multiset of the texture's path.
    pub multiset: Option<Multiset>,
    /// Pitch space values of the current chord.
    pub chord: Vec<f64>,
    /// The current, untransposed pitch space value.
    pub ps_raw: Option<f64>,
    /// Current field transposition.
    pub field: f64,
    /// Current octave transposition.
    pub octave: f64,
    /// Directories searched for audio files.
    pub audio_dirs: Vec<PathBuf>,
}

impl Default for RefDict {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            multiset: None,
            chord: Vec::new(),
            ps_raw: None,
            field: 0.0,
            octave: 0.0,
            audio_dirs: Vec::new(),
        }
    }
}

impl RefDict {
    /// Create a context with the given tempo only.
    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A value generator, evaluated at a time with a reference context.
pub trait Generator: Debug {
    /// Declared output format of the generated values.
    fn output_format(&self) -> OutputFormat {
        OutputFormat::Number
    }

    /// Generate the next value at time `t`.
    fn value(&mut self, t: f64, context: &RefDict) -> Value;

    /// Rewind the generator's state, so it produces the same values as if it was freshly
    /// created.
    fn reset(&mut self);

    /// Create a new cloned instance of this generator, including its current state.
    fn duplicate(&self) -> Box<dyn Generator>;
}

/// Duration, sustain and accent of a rhythm event, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RhythmValue {
    pub dur: f64,
    pub sus: f64,
    /// 0 for rests. Values above 1 scale the event amplitude.
    pub acc: f64,
    /// The pulse this value was created from, if any.
    pub pulse: Option<Pulse>,
}

impl RhythmValue {
    pub fn new(dur: f64, sus: f64, acc: f64) -> Self {
        Self {
            dur,
            sus,
            acc,
            pulse: None,
        }
    }

    /// Evaluate a pulse at the given tempo.
    pub fn from_pulse(pulse: &Pulse, bpm: f64) -> Self {
        let (dur, sus, acc) = pulse.seconds(bpm);
        Self {
            dur,
            sus,
            acc,
            pulse: Some(pulse.clone()),
        }
    }
}

/// A rhythm generator, evaluated at a time with a reference context.
pub trait Rhythm: Debug {
    /// Generate the next rhythm value at time `t`.
    fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue;

    /// Rewind the rhythm's state.
    fn reset(&mut self);

    /// Create a new cloned instance of this rhythm, including its current state.
    fn duplicate(&self) -> Box<dyn Rhythm>;
}

/// An array transformer, used by clones to transform all values of an event axis at once.
pub trait Filter: Debug {
    /// Transform `values`. `times` and `contexts` are aligned with `values`.
    fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64>;

    /// Rewind the filter's state.
    fn reset(&mut self);

    /// Create a new cloned instance of this filter.
    fn duplicate(&self) -> Box<dyn Filter>;
}

// -------------------------------------------------------------------------------------------------

/// A loaded generator together with its complete argument tree.
#[derive(Debug)]
pub struct GeneratorObject {
    name: &'static str,
    arg: Arg,
    generator: Box<dyn Generator>,
}

impl GeneratorObject {
    pub(crate) fn from_parts(name: &'static str, arg: Arg, generator: Box<dyn Generator>) -> Self {
        Self {
            name,
            arg,
            generator,
        }
    }

    /// Load a generator from an argument tree. Plain numbers become constants.
    pub fn new(arg: &Arg, seed: u64) -> Result<Self> {
        registry::load_generator(arg, seed)
    }

    /// Load a generator from an argument string such as `"ru, 0, 1"`.
    pub fn parse(input: &str, seed: u64) -> Result<Self> {
        Self::new(&Arg::parse(input)?, seed)
    }

    /// A constant generator.
    pub fn constant(value: f64) -> Self {
        Self::from_parts(
            "constant",
            Arg::List(vec!["constant".into(), value.into()]),
            Box::new(generator::basic::Constant::new(value.into())),
        )
    }

    /// Long name of the generator.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Complete argument tree, with the long name and all defaults.
    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    pub fn output_format(&self) -> OutputFormat {
        self.generator.output_format()
    }

    pub fn value(&mut self, t: f64, context: &RefDict) -> Value {
        self.generator.value(t, context)
    }

    /// Generate the next value as number.
    pub fn number(&mut self, t: f64, context: &RefDict) -> f64 {
        self.generator.value(t, context).as_f64()
    }

    pub fn reset(&mut self) {
        self.generator.reset();
    }
}

impl Clone for GeneratorObject {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            arg: self.arg.clone(),
            generator: self.generator.duplicate(),
        }
    }
}

impl std::fmt::Display for GeneratorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arg)
    }
}

// -------------------------------------------------------------------------------------------------

/// A loaded rhythm together with its complete argument tree.
#[derive(Debug)]
pub struct RhythmObject {
    name: &'static str,
    arg: Arg,
    rhythm: Box<dyn Rhythm>,
}

impl RhythmObject {
    pub(crate) fn from_parts(name: &'static str, arg: Arg, rhythm: Box<dyn Rhythm>) -> Self {
        Self { name, arg, rhythm }
    }

    pub fn new(arg: &Arg, seed: u64) -> Result<Self> {
        registry::load_rhythm(arg, seed)
    }

    pub fn parse(input: &str, seed: u64) -> Result<Self> {
        Self::new(&Arg::parse(input)?, seed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    pub fn value(&mut self, t: f64, context: &RefDict) -> RhythmValue {
        self.rhythm.value(t, context)
    }

    pub fn reset(&mut self) {
        self.rhythm.reset();
    }
}

impl Clone for RhythmObject {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            arg: self.arg.clone(),
            rhythm: self.rhythm.duplicate(),
        }
    }
}

impl std::fmt::Display for RhythmObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arg)
    }
}

// -------------------------------------------------------------------------------------------------

/// A loaded filter together with its complete argument tree.
#[derive(Debug)]
pub struct FilterObject {
    name: &'static str,
    arg: Arg,
    filter: Box<dyn Filter>,
}

impl FilterObject {
    pub(crate) fn from_parts(name: &'static str, arg: Arg, filter: Box<dyn Filter>) -> Self {
        Self { name, arg, filter }
    }

    pub fn new(arg: &Arg, seed: u64) -> Result<Self> {
        registry::load_filter(arg, seed)
    }

    pub fn parse(input: &str, seed: u64) -> Result<Self> {
        Self::new(&Arg::parse(input)?, seed)
    }

    /// The identity filter.
    pub fn bypass() -> Self {
        Self::from_parts(
            "bypass",
            Arg::List(vec!["bypass".into()]),
            Box::new(filter::Bypass),
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    /// True for the identity filter.
    pub fn is_bypass(&self) -> bool {
        self.name == "bypass"
    }

    pub fn filter(&mut self, values: &[f64], times: &[f64], contexts: &[RefDict]) -> Vec<f64> {
        self.filter.filter(values, times, contexts)
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

impl Clone for FilterObject {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            arg: self.arg.clone(),
            filter: self.filter.duplicate(),
        }
    }
}

impl std::fmt::Display for FilterObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arg)
    }
}
