use std::fmt;

use crate::Strategy;

/// Errors that can occur in the safe-markup crate.
///
/// Only programming errors surface here. Malformed text handed to the
/// escaping primitives is not an error: it degrades to an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The library was called in a way that can never succeed
    Misuse(Misuse),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Misuse(m) => write!(f, "Programming error: {}", m),
        }
    }
}

impl std::error::Error for Error {}

impl From<Misuse> for Error {
    fn from(m: Misuse) -> Self {
        Error::Misuse(m)
    }
}

/// A misuse of the API with details about what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misuse {
    /// The kind of misuse that occurred
    pub kind: MisuseKind,
    /// Human-readable message explaining the misuse
    pub message: String,
}

impl Misuse {
    /// Creates a new misuse report.
    pub fn new(kind: MisuseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A template referenced a token the argument map does not supply.
    pub(crate) fn missing_argument(token: &str) -> Self {
        Self::new(
            MisuseKind::MissingArgument {
                token: token.to_string(),
            },
            format!("template references '{}' but no argument was supplied", token),
        )
    }

    /// A safety mark was given with a value other than `true`.
    pub(crate) fn falsy_mark(strategy: Strategy) -> Self {
        Self::new(
            MisuseKind::FalsyMark { strategy },
            format!(
                "safety marks are additive only; '{}' must be marked true",
                strategy
            ),
        )
    }
}

impl fmt::Display for Misuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Misuse {}

/// The kind of misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MisuseKind {
    /// A template token has no matching argument
    MissingArgument {
        /// The full token text, sigil included
        token: String,
    },
    /// A registry mark was not the literal `true`
    FalsyMark {
        /// The strategy the rejected mark was recorded under
        strategy: Strategy,
    },
}

impl fmt::Display for MisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MisuseKind::MissingArgument { token } => write!(f, "Missing argument '{}'", token),
            MisuseKind::FalsyMark { strategy } => write!(f, "Falsy mark for '{}'", strategy),
        }
    }
}
