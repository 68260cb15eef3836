//! A single history-by-history accumulator.

/// Mean and standard error of a scored quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    /// Mean contribution per history.
    pub mean: f64,
    /// Standard error of the mean.
    pub std_error: f64,
}

impl Estimate {
    /// Uncertainty as a percentage of the mean.
    ///
    /// Reported as 100% when the mean is not positive.
    pub fn relative_error_percent(&self) -> f64 {
        if self.mean > 0.0 {
            100.0 * self.std_error / self.mean
        } else {
            100.0
        }
    }
}

/// Accumulator for one scored slot.
///
/// Contributions for the history in progress collect in `pending`; they
/// are folded into `sum` and `sum2` exactly once, when a different short
/// id is seen (or the owning array forces a flush). All sums are kept in
/// `f64` regardless of the precision of the scored values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoringCell {
    sum: f64,
    sum2: f64,
    pending: f64,
    last_short_id: u16,
}

impl ScoringCell {
    /// A zeroed cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell holding completed totals and no in-progress history.
    pub fn from_totals(last_short_id: u16, sum: f64, sum2: f64) -> Self {
        Self {
            sum,
            sum2,
            pending: 0.0,
            last_short_id,
        }
    }

    /// Add `value` to the history tagged `short_id`.
    ///
    /// A new tag finishes the previous history first.
    #[inline]
    pub fn score(&mut self, short_id: u16, value: f64) {
        if short_id == self.last_short_id {
            self.pending += value;
        } else {
            self.finish_case(short_id, value);
        }
    }

    /// Fold `pending` into the totals and start history `new_short_id`
    /// with `new_pending` already scored.
    #[inline]
    pub fn finish_case(&mut self, new_short_id: u16, new_pending: f64) {
        self.sum += self.pending;
        self.sum2 += self.pending * self.pending;
        self.last_short_id = new_short_id;
        self.pending = new_pending;
    }

    /// Running total of the most recent history that scored here.
    pub fn current_value(&self) -> f64 {
        self.pending
    }

    /// Short id of the most recent history that scored here.
    pub fn last_short_id(&self) -> u16 {
        self.last_short_id
    }

    /// `(sum, sum2)` over completed histories only.
    pub fn totals(&self) -> (f64, f64) {
        (self.sum, self.sum2)
    }

    /// `(sum, sum2)` treating the pending history as complete.
    pub fn completed_totals(&self) -> (f64, f64) {
        (
            self.sum + self.pending,
            self.sum2 + self.pending * self.pending,
        )
    }

    /// Mean and standard error over `histories` histories.
    ///
    /// Returns `None` when `histories < 2`: with fewer than two
    /// histories the sample variance is undefined. A variance that
    /// rounds slightly negative is clamped to zero.
    pub fn result(&self, histories: u64) -> Option<Estimate> {
        if histories < 2 {
            return None;
        }
        let n = histories as f64;
        let (s, s2) = self.completed_totals();
        let mean = s / n;
        let var = s2 / n - mean * mean;
        let std_error = if var > 0.0 {
            (var / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Estimate { mean, std_error })
    }

    /// Fold the totals of a statistically independent cell into this one.
    ///
    /// Both cells' pending values are treated as complete histories, and
    /// this cell is left with no history in progress. Only combine cells
    /// whose history sequences have ended.
    pub fn combine(&mut self, other: &ScoringCell) {
        let (s, s2) = self.completed_totals();
        let (os, os2) = other.completed_totals();
        self.sum = s + os;
        self.sum2 = s2 + os2;
        self.pending = 0.0;
        self.last_short_id = 0;
    }

    /// Zero every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── score / finish_case ────────────────────────────────────

    #[test]
    fn same_history_accumulates_into_pending() {
        let mut cell = ScoringCell::new();
        cell.score(1, 1.0);
        cell.score(1, 2.0);
        cell.score(1, 3.0);
        assert_eq!(cell.current_value(), 6.0);

        cell.finish_case(2, 0.0);
        assert_eq!(cell.totals(), (6.0, 36.0));
        assert_eq!(cell.current_value(), 0.0);
    }

    #[test]
    fn distinct_histories_square_separately() {
        let mut cell = ScoringCell::new();
        cell.score(1, 3.0);
        cell.score(2, 4.0);
        cell.finish_case(3, 0.0);
        assert_eq!(cell.totals(), (7.0, 25.0));
    }

    #[test]
    fn history_zero_scores_without_flush() {
        // A fresh cell is tagged 0, so history 0 lands in pending directly.
        let mut cell = ScoringCell::new();
        cell.score(0, 2.5);
        assert_eq!(cell.totals(), (0.0, 0.0));
        assert_eq!(cell.current_value(), 2.5);
    }

    // ── result ─────────────────────────────────────────────────

    #[test]
    fn result_undefined_below_two_histories() {
        let mut cell = ScoringCell::new();
        cell.score(0, 1.0);
        assert_eq!(cell.result(0), None);
        assert_eq!(cell.result(1), None);
    }

    #[test]
    fn result_matches_textbook_formula() {
        let mut cell = ScoringCell::new();
        let values = [1.0, 2.0, 3.0, 4.0];
        for (i, v) in values.iter().enumerate() {
            cell.score(i as u16, *v);
        }
        let est = cell.result(4).unwrap();
        assert!((est.mean - 2.5).abs() < 1e-12);
        // population variance 1.25, standard error sqrt(1.25 / 3)
        assert!((est.std_error - (1.25f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_scores_give_zero_uncertainty() {
        let mut cell = ScoringCell::new();
        for i in 0..10u16 {
            cell.score(i, 0.5);
        }
        let est = cell.result(10).unwrap();
        assert_eq!(est.std_error, 0.0);
        assert!(!est.std_error.is_nan());
    }

    #[test]
    fn relative_error_of_nonpositive_mean_is_100_percent() {
        let est = Estimate {
            mean: 0.0,
            std_error: 0.0,
        };
        assert_eq!(est.relative_error_percent(), 100.0);
        let est = Estimate {
            mean: 2.0,
            std_error: 0.5,
        };
        assert_eq!(est.relative_error_percent(), 25.0);
    }

    // ── combine / reset ────────────────────────────────────────

    #[test]
    fn combine_folds_both_pending_values() {
        let mut a = ScoringCell::new();
        a.score(1, 2.0);
        let mut b = ScoringCell::new();
        b.score(5, 3.0);
        b.score(6, 1.0);

        a.combine(&b);
        assert_eq!(a.totals(), (6.0, 14.0));
        assert_eq!(a.current_value(), 0.0);
        assert_eq!(a.last_short_id(), 0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut cell = ScoringCell::from_totals(9, 1.0, 1.0);
        cell.score(9, 4.0);
        cell.reset();
        assert_eq!(cell, ScoringCell::default());
    }
}
