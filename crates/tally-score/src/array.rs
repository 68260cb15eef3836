//! [`ScoringArray`]: many cells sharing one 64-bit history counter.

use tally_core::{HistoryId, ReportLine, ReportSink, ScoringError};

use crate::cell::{Estimate, ScoringCell};

/// An indexed collection of [`ScoringCell`]s with a shared history
/// counter.
///
/// The array stores the full history index and hands cells only its low
/// 16 bits. It owns the epoch-rollover policy: whenever the high part of
/// the counter changes, every cell is flushed before any cell can see a
/// repeated short id.
///
/// # Examples
///
/// ```
/// use tally_core::HistoryId;
/// use tally_score::ScoringArray;
///
/// let mut dose = ScoringArray::new(2).unwrap();
/// for case in 1..=4u64 {
///     dose.set_history(HistoryId(case));
///     dose.score(0, 1.0);
///     dose.score(1, case as f64);
/// }
/// let est = dose.result(0).unwrap();
/// assert_eq!(est.mean, 1.0);
/// assert_eq!(est.std_error, 0.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringArray {
    cells: Vec<ScoringCell>,
    current_case: HistoryId,
    epoch: u64,
    short_id: u16,
}

impl ScoringArray {
    /// Create an array of `slots` zeroed cells.
    ///
    /// Returns [`ScoringError::ZeroSlots`] if `slots == 0`.
    pub fn new(slots: usize) -> Result<Self, ScoringError> {
        if slots == 0 {
            return Err(ScoringError::ZeroSlots);
        }
        Ok(Self {
            cells: vec![ScoringCell::new(); slots],
            current_case: HistoryId::ZERO,
            epoch: 0,
            short_id: 0,
        })
    }

    /// Rebuild an array from a history counter and restored cells.
    ///
    /// Epoch and short id are derived from `current_case`.
    pub fn from_parts(
        current_case: HistoryId,
        cells: Vec<ScoringCell>,
    ) -> Result<Self, ScoringError> {
        if cells.is_empty() {
            return Err(ScoringError::ZeroSlots);
        }
        Ok(Self {
            cells,
            current_case,
            epoch: current_case.epoch(),
            short_id: current_case.short_id(),
        })
    }

    /// Start scoring history `case`.
    ///
    /// Must be called before the first score of every history. A no-op
    /// if `case` is already current. Crossing into a new epoch finishes
    /// the pending history of every cell.
    pub fn set_history(&mut self, case: HistoryId) {
        if case == self.current_case {
            return;
        }
        let epoch = case.epoch();
        if epoch != self.epoch {
            tracing::debug!(
                from = self.epoch,
                to = epoch,
                slots = self.cells.len(),
                "scoring array epoch rollover, flushing all cells"
            );
            for cell in &mut self.cells {
                cell.finish_case(0, 0.0);
            }
            self.epoch = epoch;
        }
        self.current_case = case;
        self.short_id = case.short_id();
    }

    /// Add `value` to `slot` for the current history.
    ///
    /// # Panics
    ///
    /// If `slot >= self.bins()`. An out-of-range slot is a bug in the
    /// caller's event-to-slot mapping.
    #[inline]
    pub fn score(&mut self, slot: usize, value: f64) {
        self.cells[slot].score(self.short_id, value);
    }

    /// Running total of the last history that scored into `slot`,
    /// which may be an earlier one.
    pub fn current_value(&self, slot: usize) -> f64 {
        self.cells[slot].current_value()
    }

    /// Amount scored into `slot` by the current history (0 if none).
    pub fn value_for_current_history(&self, slot: usize) -> f64 {
        let cell = &self.cells[slot];
        if cell.last_short_id() == self.short_id {
            cell.current_value()
        } else {
            0.0
        }
    }

    /// Completed `(sum, sum2)` of `slot`.
    pub fn totals(&self, slot: usize) -> (f64, f64) {
        self.cells[slot].totals()
    }

    /// Mean and standard error of `slot` over [`current_case`](Self::current_case)
    /// histories. `None` with fewer than two histories.
    pub fn result(&self, slot: usize) -> Option<Estimate> {
        self.cells[slot].result(self.current_case.0)
    }

    /// Report every slot to `sink`.
    ///
    /// Values and absolute uncertainties are multiplied by
    /// `normalization`; relative uncertainties are in percent. With
    /// fewer than two histories only a warning is emitted. An empty
    /// `title` suppresses the title line.
    pub fn report(
        &self,
        normalization: f64,
        title: &str,
        relative_error: bool,
        sink: &mut dyn ReportSink,
    ) {
        if !title.is_empty() {
            sink.title(title, self.current_case.0);
        }
        if self.current_case.0 < 2 {
            sink.warning(&format!(
                "scoring array report: you must run more than 2 histories (ran {})",
                self.current_case
            ));
            return;
        }
        for (slot, cell) in self.cells.iter().enumerate() {
            let Some(est) = cell.result(self.current_case.0) else {
                continue;
            };
            let uncertainty = if relative_error {
                est.relative_error_percent()
            } else {
                est.std_error * normalization
            };
            sink.line(&ReportLine {
                slot,
                value: est.mean * normalization,
                uncertainty,
                relative: relative_error,
            });
        }
    }

    /// Fold a statistically independent array into this one.
    ///
    /// History counters add; cells combine slot by slot. Any pending
    /// history on either side is counted as complete, so combine only
    /// arrays whose runs have ended.
    pub fn combine(&mut self, other: &ScoringArray) -> Result<(), ScoringError> {
        if other.cells.len() != self.cells.len() {
            return Err(ScoringError::SlotCountMismatch {
                expected: self.cells.len(),
                found: other.cells.len(),
            });
        }
        self.current_case = HistoryId(self.current_case.0 + other.current_case.0);
        self.epoch = self.current_case.epoch();
        self.short_id = self.current_case.short_id();
        for (cell, theirs) in self.cells.iter_mut().zip(&other.cells) {
            cell.combine(theirs);
        }
        Ok(())
    }

    /// Return to the freshly constructed state, keeping the slot count.
    pub fn reset(&mut self) {
        self.current_case = HistoryId::ZERO;
        self.epoch = 0;
        self.short_id = 0;
        for cell in &mut self.cells {
            cell.reset();
        }
    }

    /// Number of slots.
    pub fn bins(&self) -> usize {
        self.cells.len()
    }

    /// The current history counter.
    pub fn current_case(&self) -> HistoryId {
        self.current_case
    }

    /// `current_case >> 16`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `current_case mod 65536`.
    pub fn short_id(&self) -> u16 {
        self.short_id
    }

    /// Read access to one cell.
    pub fn cell(&self, slot: usize) -> &ScoringCell {
        &self.cells[slot]
    }

    /// All cells in slot order.
    pub fn cells(&self) -> &[ScoringCell] {
        &self.cells
    }
}
