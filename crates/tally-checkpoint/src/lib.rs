//! Checkpoint, restart and merge records for Tally scoring state.
//!
//! Every stateful scoring component can be written to a byte stream,
//! read back to resume a run, or read into a temporary and folded into
//! a live instance to merge independent parallel jobs.
//!
//! # Architecture
//!
//! - [`codec`] holds the primitive little-endian readers and writers and
//!   the [`ScoringArray`](tally_score::ScoringArray) record
//! - [`Checkpoint`] is the store / restore / add / reset protocol
//! - [`ChecksumWriter`] and [`ChecksumReader`] fold an FNV-1a hash over
//!   everything that passes through them
//!
//! # Array record
//!
//! ```text
//! [slot_count u32] [short_id u16] [current_case split] [epoch split]
//! [last_short_id u16, sum f64, sum2 f64] x slot_count
//! ```
//!
//! A "split" 64-bit counter is two little-endian `i32`s, `n / 10^9` and
//! `n % 10^9`, so each half stays a non-negative 32-bit signed value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod state;
pub mod stream;

pub use error::CheckpointError;
pub use state::Checkpoint;
pub use stream::{ChecksumReader, ChecksumWriter};

/// Magic bytes at the start of every checkpoint stream.
pub const MAGIC: [u8; 4] = *b"TALY";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
