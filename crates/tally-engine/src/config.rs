//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the parsed form of a run's scoring setup.
//! [`validate()`](SessionConfig::validate) checks structural invariants
//! before any observer is constructed.

use std::error::Error;
use std::fmt;

use indexmap::IndexSet;
use tally_core::{HistoryId, RegistryError};
use tally_observer::{ObserverDecl, ObserverFactory};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`SessionConfig`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Two declarations share a name.
    DuplicateObserver {
        /// The contested name.
        name: String,
    },
    /// A checkpoint interval of zero histories.
    ZeroCheckpointInterval,
    /// A declaration the factory cannot construct.
    Registry(RegistryError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateObserver { name } => {
                write!(f, "observer '{name}' is declared more than once")
            }
            Self::ZeroCheckpointInterval => {
                write!(f, "checkpoint_interval must be at least 1")
            }
            Self::Registry(e) => write!(f, "registry: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Observers to build and how often to checkpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionConfig {
    /// Observer declarations in registration (and dispatch) order.
    pub observers: Vec<ObserverDecl>,
    /// Checkpoint every this many histories. `None` disables periodic
    /// checkpoints.
    pub checkpoint_interval: Option<u64>,
}

impl SessionConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style declaration append.
    #[must_use]
    pub fn with_observer(mut self, decl: ObserverDecl) -> Self {
        self.observers.push(decl);
        self
    }

    /// Builder-style checkpoint interval.
    #[must_use]
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = Some(interval);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = IndexSet::with_capacity(self.observers.len());
        for decl in &self.observers {
            if !seen.insert(decl.name.as_str()) {
                return Err(ConfigError::DuplicateObserver {
                    name: decl.name.clone(),
                });
            }
        }
        if self.checkpoint_interval == Some(0) {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        Ok(())
    }

    /// Check that `factory` knows every declared kind.
    pub fn check_kinds(&self, factory: &ObserverFactory) -> Result<(), ConfigError> {
        for decl in &self.observers {
            if !factory.knows(&decl.kind) {
                return Err(RegistryError::UnknownKind {
                    kind: decl.kind.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Whether a checkpoint is due once history `case` has completed.
    ///
    /// True at every positive multiple of the interval; never at 0 and
    /// never without an interval.
    pub fn should_checkpoint(&self, case: HistoryId) -> bool {
        match self.checkpoint_interval {
            Some(n) if n > 0 => case.0 > 0 && case.0 % n == 0,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dose(name: &str) -> ObserverDecl {
        ObserverDecl::new(name, "dose_scoring").with("region_count", 2i64)
    }

    #[test]
    fn validate_accepts_distinct_names() {
        let cfg = SessionConfig::new()
            .with_observer(dose("a"))
            .with_observer(dose("b"))
            .with_checkpoint_interval(10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_duplicate_name_fails() {
        let cfg = SessionConfig::new()
            .with_observer(dose("a"))
            .with_observer(dose("a"));
        match cfg.validate() {
            Err(ConfigError::DuplicateObserver { name }) => assert_eq!(name, "a"),
            other => panic!("expected DuplicateObserver, got {other:?}"),
        }
    }

    #[test]
    fn validate_zero_interval_fails() {
        let cfg = SessionConfig::new().with_checkpoint_interval(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCheckpointInterval));
    }

    #[test]
    fn unknown_kind_detected_before_construction() {
        let cfg = SessionConfig::new().with_observer(ObserverDecl::new("t", "track_scoring"));
        assert!(matches!(
            cfg.check_kinds(&ObserverFactory::with_builtins()),
            Err(ConfigError::Registry(RegistryError::UnknownKind { .. }))
        ));
    }

    #[test]
    fn checkpoint_schedule() {
        let cfg = SessionConfig::new().with_checkpoint_interval(100);
        assert!(!cfg.should_checkpoint(HistoryId(0)));
        assert!(!cfg.should_checkpoint(HistoryId(99)));
        assert!(cfg.should_checkpoint(HistoryId(100)));
        assert!(cfg.should_checkpoint(HistoryId(300)));
        assert!(!SessionConfig::new().should_checkpoint(HistoryId(100)));
    }
}
