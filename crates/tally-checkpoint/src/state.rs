//! The [`Checkpoint`] protocol and its [`ScoringArray`] implementation.

use std::io::{Read, Write};

use tally_score::ScoringArray;

use crate::codec::{decode_array, encode_array};
use crate::error::CheckpointError;

/// Store, restore and merge of persistent scoring state.
///
/// The four operations define restart and parallel combination:
///
/// - [`store`](Checkpoint::store) writes the current totals, counting
///   any in-progress history as complete
/// - [`restore`](Checkpoint::restore) replaces the live state with a
///   stored one
/// - [`add_state`](Checkpoint::add_state) reads a stored state into a
///   temporary and folds it into the live one
/// - [`reset_counter`](Checkpoint::reset_counter) returns to a zeroed
///   state before a sequence of merges
///
/// `restore` and `add_state` decode the whole record before touching
/// `self`, so a failed read leaves the live state unchanged.
pub trait Checkpoint {
    /// Write the persistent state to `w`.
    fn store(&self, w: &mut dyn Write) -> Result<(), CheckpointError>;

    /// Replace the persistent state with the record read from `r`.
    fn restore(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError>;

    /// Read a record from `r` and combine it into the live state.
    fn add_state(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError>;

    /// Zero all accumulated state, keeping the shape.
    fn reset_counter(&mut self);
}

/// Replace `live` with a decoded array, adopting the decoded shape.
///
/// A slot-count change is not an error: restoring into an array built
/// for a different configuration resizes it.
pub fn install(live: &mut ScoringArray, restored: ScoringArray) {
    if restored.bins() != live.bins() {
        tracing::warn!(
            live = live.bins(),
            stored = restored.bins(),
            "restored scoring array has a different slot count, resizing"
        );
    }
    *live = restored;
}

impl Checkpoint for ScoringArray {
    fn store(&self, w: &mut dyn Write) -> Result<(), CheckpointError> {
        encode_array(w, self)
    }

    fn restore(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        install(self, decode_array(r)?);
        Ok(())
    }

    fn add_state(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        let other = decode_array(r)?;
        self.combine(&other)?;
        Ok(())
    }

    fn reset_counter(&mut self) {
        self.reset();
    }
}
