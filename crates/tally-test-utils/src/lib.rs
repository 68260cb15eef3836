//! Test utilities for Tally development.
//!
//! Provides instrumented handlers ([`RecordingObserver`],
//! [`ConstScorer`]) and a deterministic synthetic event source
//! ([`HistoryStream`]) for exercising the registry, dispatcher and
//! checkpoint paths without a transport loop.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod stream;

pub use fixtures::{ConstScorer, RecordingObserver};
pub use stream::{HistoryStream, SyntheticEvent};
