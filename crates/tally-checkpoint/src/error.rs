//! Error types for the checkpoint system.

use std::fmt;
use std::io;

use tally_core::ScoringError;

/// Errors that can occur while storing, restoring or merging state.
///
/// All of these are recoverable from the core's point of view: the
/// caller decides whether a failed checkpoint ends the run.
#[derive(Debug)]
pub enum CheckpointError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The stream does not start with the expected `b"TALY"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// A record could not be decoded (inconsistent or corrupt data).
    MalformedRecord {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A history counter is too large for the split 32-bit encoding.
    CounterOverflow {
        /// The counter that could not be encoded.
        value: u64,
    },
    /// The stream's trailing checksum does not match its contents.
    ChecksumMismatch {
        /// Checksum stored in the stream.
        recorded: u64,
        /// Checksum computed while reading.
        computed: u64,
    },
    /// An observer section belongs to a different observer.
    ObserverMismatch {
        /// Name of the live observer at this position.
        expected: String,
        /// Name recorded in the stream.
        found: String,
    },
    /// A merged record could not be folded into the live state.
    Scoring(ScoringError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TALY\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::MalformedRecord { detail } => write!(f, "malformed record: {detail}"),
            Self::CounterOverflow { value } => {
                write!(
                    f,
                    "history counter {value} too large for checkpoint encoding"
                )
            }
            Self::ChecksumMismatch { recorded, computed } => {
                write!(
                    f,
                    "checksum mismatch: recorded={recorded:#018x}, computed={computed:#018x}"
                )
            }
            Self::ObserverMismatch { expected, found } => {
                write!(
                    f,
                    "observer mismatch: expected section for '{expected}', found '{found}'"
                )
            }
            Self::Scoring(e) => write!(f, "cannot merge record: {e}"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Scoring(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ScoringError> for CheckpointError {
    fn from(e: ScoringError) -> Self {
        Self::Scoring(e)
    }
}
