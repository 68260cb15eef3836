//! Scoring session orchestration for the Tally scoring core.
//!
//! A [`ScoringSession`] is what a transport code holds for the length
//! of a run: it builds observers from a [`SessionConfig`], routes events
//! to them, writes and reads checkpoints, and merges the checkpoints of
//! parallel jobs into one result.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use session::{ScoringSession, SessionPhase};
