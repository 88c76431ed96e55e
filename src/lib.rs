//! Algorithmic composition with parameter objects, textures and clones.
//!
//! Compositions are built from [`Path`]s of pitch multisets, [`Texture`]s which generate event
//! sequences from a path and a set of parameter objects, and [`TextureClone`]s which derive
//! transformed copies of a texture's events. An [`AthenaObject`] owns all of them and renders
//! the performed events into score files: Csound scores and orchestras, MIDI files, Max/MSP
//! coll files, AC Toolbox Lisp, plain text tables or audio files.
//!
//! ```no_run
//! use athenacl::prelude::*;
//!
//! # fn main() -> athenacl::Result<()> {
//! let mut ao = AthenaObject::new(42);
//! ao.set_event_mode(EventMode::Midi);
//! ao.path_new("a", &["3-4", "c4,e4,g4"])?;
//! ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
//! ao.texture_edit("t1", "ampQ", "ru, .5, 1")?;
//! ao.clone_new("t1", "c1")?;
//! ao.clone_edit("t1", "c1", "time", "fa, (c, 4)")?;
//!
//! let environment = Environment::new().with_file_stem("demo");
//! let written = ao.render(&environment, &[FileFormat::TextTab]);
//! # Ok(())
//! # }
//! ```

// -------------------------------------------------------------------------------------------------

pub mod error;
pub use error::{Error, Result};

pub mod unit;
pub mod random;
pub mod pitch;
pub mod temperament;
pub mod multiset;
pub mod path;
pub use path::Path;

pub mod pulse;
pub mod selector;
pub mod breakpoint;
pub mod sieve;
pub mod markov;
pub mod grammar;
pub mod automata;
pub mod chaos;
pub mod noise;
pub mod feedback;
pub mod envelope;
pub mod genetic;
pub mod ornament;
pub mod quantize;

pub mod parameter;

pub mod event;
pub use event::{Event, EventSequence};

pub mod orchestra;
pub use orchestra::OrchestraKind;

pub mod texture;
pub use texture::{ModuleKind, Texture};
pub mod clone;
pub use clone::TextureClone;

pub mod performer;
pub use performer::Performer;
pub mod environment;
pub use environment::Environment;
pub mod engine;
pub use engine::{EventMode, FileFormat};

pub mod athena;
pub use athena::AthenaObject;

pub mod prelude;
