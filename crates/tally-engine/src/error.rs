//! Session-level error type.

use std::error::Error;
use std::fmt;

use tally_checkpoint::CheckpointError;
use tally_core::RegistryError;

use crate::config::ConfigError;
use crate::session::SessionPhase;

/// Errors from building, checkpointing or merging a scoring session.
#[derive(Debug)]
pub enum SessionError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// An observer could not be constructed or registered.
    Registry(RegistryError),
    /// A checkpoint stream could not be written, read or merged.
    Checkpoint(CheckpointError),
    /// `add_state` on a session that is scoring its own histories.
    ///
    /// Call `reset_counter` first; merging into live state would count
    /// the session's own partial data twice.
    MergeIntoLiveSession {
        /// The phase the session was in.
        phase: SessionPhase,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Checkpoint(e) => write!(f, "checkpoint: {e}"),
            Self::MergeIntoLiveSession { phase } => {
                write!(
                    f,
                    "cannot merge job state into a session in phase {phase}; reset_counter first"
                )
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Checkpoint(e) => Some(e),
            Self::MergeIntoLiveSession { .. } => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RegistryError> for SessionError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<CheckpointError> for SessionError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e)
    }
}
