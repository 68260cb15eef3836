//! Tally: the scoring core of a Monte Carlo particle transport code.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tally sub-crates. For most users, adding `tally` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tally::prelude::*;
//!
//! // A handler that counts photons leaving a Compton interaction.
//! struct ComptonCounter {
//!     state: ScoredArrays,
//! }
//!
//! impl EventHandler for ComptonCounter {
//!     fn name(&self) -> &str { "compton" }
//!     fn needs_call(&self, kind: EventKind) -> bool { kind == EventKind::AfterCompton }
//!     fn process_event(&mut self, _kind: EventKind, ctx: &EventContext) -> EventAction {
//!         self.state.array_mut(0).score(0, ctx.weight);
//!         EventAction::Continue
//!     }
//!     fn set_current_history(&mut self, case: HistoryId) {
//!         self.state.set_history(case);
//!     }
//! }
//!
//! let mut session = ScoringSession::new();
//! let state = ScoredArrays::new(vec![ScoringArray::new(1).unwrap()]);
//! session.register(Box::new(ComptonCounter { state })).unwrap();
//!
//! for _ in 0..4 {
//!     session.next_history();
//!     session.dispatch(EventKind::AfterCompton, &EventContext::in_region(0));
//! }
//!
//! let counter = session.handler::<ComptonCounter>("compton").unwrap();
//! assert_eq!(counter.state.array(0).result(0).unwrap().mean, 1.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tally-core` | History ids, event kinds, contexts, errors, report sinks |
//! | [`score`] | `tally-score` | Per-history cells and scoring arrays |
//! | [`checkpoint`] | `tally-checkpoint` | Binary state records, checksums, the `Checkpoint` trait |
//! | [`observer`] | `tally-observer` | Handler trait, registry, dispatcher, factory, built-ins |
//! | [`engine`] | `tally-engine` | Scoring sessions, configuration, parallel merge |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`tally-core`).
///
/// [`types::HistoryId`], [`types::EventKind`], [`types::EventContext`],
/// the error types and the [`types::ReportSink`] trait.
pub use tally_core as types;

/// Per-history statistics (`tally-score`).
///
/// [`score::ScoringCell`] accumulates one quantity;
/// [`score::ScoringArray`] is the usual unit of scoring.
pub use tally_score as score;

/// Checkpoint streams (`tally-checkpoint`).
///
/// The [`checkpoint::Checkpoint`] trait and the record codec behind it.
pub use tally_checkpoint as checkpoint;

/// Event handlers and routing (`tally-observer`).
///
/// Implement [`observer::EventHandler`] for new observers; register
/// kinds with an [`observer::ObserverFactory`] to build them from
/// declarations.
pub use tally_observer as observer;

/// Scoring sessions (`tally-engine`).
///
/// [`engine::ScoringSession`] ties a registry, a dispatcher and the
/// history counter together.
pub use tally_engine as engine;

/// Common imports for typical Tally usage.
///
/// ```rust
/// use tally::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tally_core::{
        EventAction, EventContext, EventKind, EventSet, HistoryId, ReportSink, TracingSink,
    };

    // Errors
    pub use tally_checkpoint::CheckpointError;
    pub use tally_core::{RegistryError, ScoringError};
    pub use tally_engine::{ConfigError, SessionError};

    // Scoring
    pub use tally_score::{Estimate, ScoringArray};

    // Checkpointing
    pub use tally_checkpoint::Checkpoint;

    // Observers
    pub use tally_observer::{
        DoseScoring, EventHandler, ObserverDecl, ObserverFactory, RangeRejection, ScoredArrays,
    };

    // Engine
    pub use tally_engine::{ScoringSession, SessionConfig, SessionPhase};
}
