//! Error kinds raised while constructing, scoring and writing.

// -------------------------------------------------------------------------------------------------

/// All errors of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parameter object syntax error: {0}")]
    ParameterObjectSyntax(String),
    #[error("pitch syntax error: {0}")]
    PitchSyntax(String),
    #[error("multiset error: {0}")]
    Multiset(String),
    #[error("pulse syntax error: {0}")]
    PulseSyntax(String),
    #[error("transition syntax error: {0}")]
    TransitionSyntax(String),
    #[error("automata specification error: {0}")]
    AutomataSpecification(String),
    #[error("sieve syntax error: {0}")]
    SieveSyntax(String),
    #[error("clone error: {0}")]
    Clone(String),
    #[error("texture error: {0}")]
    Texture(String),
    #[error("path error: {0}")]
    Path(String),
    #[error("argument error: {0}")]
    Argument(String),
    #[error("midi error: {0}")]
    Midi(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Prefix the message of a syntax error with the name of the failing argument.
    pub fn with_context(self, context: &str) -> Self {
        match self {
            Self::ParameterObjectSyntax(msg) => {
                Self::ParameterObjectSyntax(format!("{context}: {msg}"))
            }
            Self::PulseSyntax(msg) => Self::ParameterObjectSyntax(format!("{context}: {msg}")),
            Self::TransitionSyntax(msg) => {
                Self::ParameterObjectSyntax(format!("{context}: {msg}"))
            }
            Self::AutomataSpecification(msg) => {
                Self::ParameterObjectSyntax(format!("{context}: {msg}"))
            }
            Self::SieveSyntax(msg) => Self::ParameterObjectSyntax(format!("{context}: {msg}")),
            other => other,
        }
    }
}

/// Result alias using the crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;
