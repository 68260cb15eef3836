//! History-by-history accumulators for Monte Carlo scoring.
//!
//! A [`ScoringCell`] keeps the sum and sum of squares of per-history
//! totals for one scored quantity. A [`ScoringArray`] owns many cells
//! and the full 64-bit history counter, and is the only thing allowed
//! to move cells from one history to the next.
//!
//! # History tagging
//!
//! Cells remember only the low 16 bits of the history index. When the
//! array's counter crosses into a new epoch (`id >> 16` changes) every
//! cell is flushed, so a short id can never be mistaken for the same
//! short id one epoch earlier.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod cell;

pub use array::ScoringArray;
pub use cell::{Estimate, ScoringCell};
