//! Event handlers, registry and dispatcher for the Tally scoring core.
//!
//! The transport loop talks to scoring code through one
//! [`Dispatcher`]. Handlers implement [`EventHandler`], live in a
//! [`Registry`] in registration order, and are usually built from parsed
//! [`ObserverDecl`]s by an [`ObserverFactory`].
//!
//! # Routing
//!
//! `needs_call` is asked once per handler and event kind, when the
//! dispatcher first sees the handler. Per-event dispatch walks a cached
//! list of interested handler indices:
//!
//! ```
//! use tally_core::{EventContext, EventKind, HistoryId};
//! use tally_observer::{Dispatcher, DoseScoring, ObserverDecl, ObserverFactory, Registry};
//!
//! let factory = ObserverFactory::with_builtins();
//! let mut registry = Registry::new();
//! let decl = ObserverDecl::new("dose", "dose_scoring").with("region_count", 2i64);
//! factory.build_into(&[decl], &mut registry).unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! for case in 1..=3u64 {
//!     dispatcher.notify_new_history(&mut registry, HistoryId(case));
//!     let ctx = EventContext::in_region(1).with_edep(2.0);
//!     dispatcher.dispatch(&mut registry, EventKind::BelowTransportCutoff, &ctx);
//! }
//!
//! let dose = registry.lookup("dose").unwrap().downcast_ref::<DoseScoring>().unwrap();
//! assert_eq!(dose.region_dose(1).unwrap().mean, 2.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod factory;
pub mod handler;
pub mod region;
pub mod registry;
pub mod state;

pub use builtin::{DoseScoring, RangeRejection};
pub use config::{ObserverDecl, ParamValue};
pub use dispatch::Dispatcher;
pub use factory::{Constructor, ObserverFactory};
pub use handler::EventHandler;
pub use region::RegionMap;
pub use registry::Registry;
pub use state::ScoredArrays;
