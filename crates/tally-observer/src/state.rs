//! [`ScoredArrays`]: the persistent state shared by scoring handlers.
//!
//! A handler section in a checkpoint stream is:
//!
//! ```text
//! [last_case split] [array_count u32] [array record] x array_count
//! ```

use std::io::{Read, Write};

use tally_checkpoint::codec::{
    decode_array, encode_array, read_counter, read_u32_le, write_counter, write_u32_le,
};
use tally_checkpoint::state::install;
use tally_checkpoint::{Checkpoint, CheckpointError};
use tally_core::{HistoryId, ScoringError};
use tally_score::ScoringArray;

/// The scoring arrays of one handler plus the last history it saw.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredArrays {
    last_case: HistoryId,
    arrays: Vec<ScoringArray>,
}

impl ScoredArrays {
    /// Wrap freshly constructed arrays.
    pub fn new(arrays: Vec<ScoringArray>) -> Self {
        Self {
            last_case: HistoryId::ZERO,
            arrays,
        }
    }

    /// Forward a new history to every array, once per distinct `case`.
    pub fn set_history(&mut self, case: HistoryId) {
        if case == self.last_case {
            return;
        }
        self.last_case = case;
        for array in &mut self.arrays {
            array.set_history(case);
        }
    }

    /// The last history seen.
    pub fn last_case(&self) -> HistoryId {
        self.last_case
    }

    /// Array `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn array(&self, index: usize) -> &ScoringArray {
        &self.arrays[index]
    }

    /// Mutable array `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn array_mut(&mut self, index: usize) -> &mut ScoringArray {
        &mut self.arrays[index]
    }

    /// All arrays in construction order.
    pub fn arrays(&self) -> &[ScoringArray] {
        &self.arrays
    }

    fn read_section(
        &self,
        r: &mut dyn Read,
    ) -> Result<(HistoryId, Vec<ScoringArray>), CheckpointError> {
        let last_case = HistoryId(read_counter(r)?);
        let count = read_u32_le(r)? as usize;
        if count != self.arrays.len() {
            return Err(CheckpointError::MalformedRecord {
                detail: format!(
                    "handler section holds {count} arrays, expected {}",
                    self.arrays.len()
                ),
            });
        }
        let mut arrays = Vec::with_capacity(count);
        for _ in 0..count {
            arrays.push(decode_array(r)?);
        }
        Ok((last_case, arrays))
    }
}

impl Checkpoint for ScoredArrays {
    fn store(&self, w: &mut dyn Write) -> Result<(), CheckpointError> {
        write_counter(w, self.last_case.0)?;
        write_u32_le(w, self.arrays.len() as u32)?;
        for array in &self.arrays {
            encode_array(w, array)?;
        }
        Ok(())
    }

    fn restore(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        let (last_case, arrays) = self.read_section(r)?;
        self.last_case = last_case;
        for (live, restored) in self.arrays.iter_mut().zip(arrays) {
            install(live, restored);
        }
        Ok(())
    }

    fn add_state(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        let (last_case, arrays) = self.read_section(r)?;
        // All shapes are checked before anything is folded in.
        for (live, other) in self.arrays.iter().zip(&arrays) {
            if live.bins() != other.bins() {
                return Err(ScoringError::SlotCountMismatch {
                    expected: live.bins(),
                    found: other.bins(),
                }
                .into());
            }
        }
        self.last_case = HistoryId(self.last_case.0 + last_case.0);
        for (live, other) in self.arrays.iter_mut().zip(&arrays) {
            live.combine(other)?;
        }
        Ok(())
    }

    fn reset_counter(&mut self) {
        self.last_case = HistoryId::ZERO;
        for array in &mut self.arrays {
            array.reset();
        }
    }
}
