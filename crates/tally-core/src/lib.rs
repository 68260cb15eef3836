//! Core types and traits for the Tally scoring core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: history ids,
//! the closed set of transport event kinds, the per-event context the
//! transport loop hands to observers, error types, and the reporting
//! surface.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod event;
pub mod id;
pub mod report;

pub use context::{EventAction, EventContext};
pub use error::{RegistryError, ScoringError};
pub use event::{EventKind, EventSet, EventSetIter};
pub use id::HistoryId;
pub use report::{CollectingSink, ReportLine, ReportSink, TracingSink};
