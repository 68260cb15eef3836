//! The [`HistoryId`] counter and its narrow/epoch decomposition.

use std::fmt;

/// Number of low bits of a [`HistoryId`] kept per accumulator cell.
pub const SHORT_ID_BITS: u32 = 16;

/// Number of distinct short ids before the counter wraps (65536).
pub const SHORT_ID_SPAN: u64 = 1 << SHORT_ID_BITS;

/// Index of one statistically independent particle history.
///
/// The n-th history of a job has id `n`, so the id of the current
/// history is also the number of histories run so far; id 0 means no
/// history has started.
///
/// Accumulator cells only remember the low 16 bits ([`short_id`]);
/// the remaining high part is the [`epoch`], which the owning scoring
/// array tracks once for all of its cells.
///
/// [`short_id`]: HistoryId::short_id
/// [`epoch`]: HistoryId::epoch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryId(pub u64);

impl HistoryId {
    /// Before the first history.
    pub const ZERO: Self = Self(0);

    /// High part of the counter (`id >> 16`).
    pub fn epoch(self) -> u64 {
        self.0 >> SHORT_ID_BITS
    }

    /// Low 16 bits of the counter (`id mod 65536`).
    pub fn short_id(self) -> u16 {
        (self.0 & (SHORT_ID_SPAN - 1)) as u16
    }

    /// The next history index.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HistoryId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
