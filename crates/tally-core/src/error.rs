//! Error types for scoring construction and observer registration.
//!
//! I/O failures during checkpointing live in `tally-checkpoint`; the
//! errors here are all setup-time and fatal to the run.

use std::error::Error;
use std::fmt;

/// Errors from constructing or combining scoring arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoringError {
    /// A scoring array was requested with zero slots.
    ZeroSlots,
    /// Two arrays with different slot counts were combined.
    SlotCountMismatch {
        /// Slot count of the receiving array.
        expected: usize,
        /// Slot count of the array being folded in.
        found: usize,
    },
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSlots => write!(f, "scoring array must have at least one slot"),
            Self::SlotCountMismatch { expected, found } => {
                write!(
                    f,
                    "cannot combine scoring arrays: expected {expected} slots, found {found}"
                )
            }
        }
    }
}

impl Error for ScoringError {}

/// Errors from building and registering observers.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryError {
    /// An observer with this name is already registered.
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// No constructor is known for the declared observer kind.
    UnknownKind {
        /// The declared kind.
        kind: String,
    },
    /// A required declaration parameter is absent.
    MissingParameter {
        /// Observer being constructed.
        observer: String,
        /// The missing key.
        key: String,
    },
    /// A declaration parameter has the wrong type or an invalid value.
    InvalidParameter {
        /// Observer being constructed.
        observer: String,
        /// The offending key.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The observer's scoring arrays could not be constructed.
    Scoring {
        /// Observer being constructed.
        observer: String,
        /// The underlying error.
        source: ScoringError,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => {
                write!(f, "an observer named '{name}' is already registered")
            }
            Self::UnknownKind { kind } => write!(f, "unknown observer kind '{kind}'"),
            Self::MissingParameter { observer, key } => {
                write!(f, "observer '{observer}': missing parameter '{key}'")
            }
            Self::InvalidParameter {
                observer,
                key,
                reason,
            } => {
                write!(
                    f,
                    "observer '{observer}': invalid parameter '{key}': {reason}"
                )
            }
            Self::Scoring { observer, source } => {
                write!(f, "observer '{observer}': {source}")
            }
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Scoring { source, .. } => Some(source),
            _ => None,
        }
    }
}
