//! The athenacl prelude.
//!
//! The purpose of this module is to alleviate imports of common athenacl types:
//!
//! ```
//! # #![allow(unused_imports)]
//! use athenacl::prelude::*;
//! ```

pub use super::{
    // composition
    athena::{AthenaObject, PathEdit},
    clone::TextureClone,
    multiset::{Multiset, SetClass},
    path::Path,
    texture::{ModuleKind, Texture},
    // parameter objects
    parameter::{arg::Arg, FilterObject, GeneratorObject, RhythmObject, Value},
    // events and output
    engine::{EventMode, FileFormat, RenderSettings},
    environment::{AudioConversion, AudioFormat, Environment},
    event::{Event, EventField, EventSequence},
    orchestra::OrchestraKind,
    performer::Performer,
    // errors
    Error,
    Result,
};
