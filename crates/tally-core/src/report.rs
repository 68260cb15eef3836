//! The reporting surface: where scoring results go when an observer or
//! array is asked to report.
//!
//! Scoring code never prints. It pushes titles, per-slot lines and
//! warnings into a [`ReportSink`] supplied by the caller. Two sinks ship
//! with the crate: [`TracingSink`] (forwards to `tracing`) and
//! [`CollectingSink`] (keeps everything in memory).

use std::fmt;

/// One reported slot: `slot  value  +/-  uncertainty [%]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportLine {
    /// Slot index within the reported array.
    pub slot: usize,
    /// Normalized mean.
    pub value: f64,
    /// Normalized absolute uncertainty, or percent of `value` when
    /// `relative` is set.
    pub uncertainty: f64,
    /// Whether `uncertainty` is a percentage.
    pub relative: bool,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {}    {}  +/-  {}",
            self.slot, self.value, self.uncertainty
        )?;
        if self.relative {
            write!(f, " %")?;
        }
        Ok(())
    }
}

/// Receiver for human-readable scoring reports.
pub trait ReportSink {
    /// Start a titled block covering `histories` histories.
    fn title(&mut self, title: &str, histories: u64);

    /// One slot of the current block.
    fn line(&mut self, line: &ReportLine);

    /// A non-fatal problem with the report (e.g. too few histories).
    fn warning(&mut self, message: &str);
}

/// Forwards reports to the `tracing` facade.
///
/// Titles and lines go out at `INFO`, warnings at `WARN`, all under the
/// `tally::report` target so subscribers can route them separately.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn title(&mut self, title: &str, histories: u64) {
        tracing::info!(target: "tally::report", histories, "{title} for {histories} particles:");
    }

    fn line(&mut self, line: &ReportLine) {
        tracing::info!(
            target: "tally::report",
            slot = line.slot,
            value = line.value,
            uncertainty = line.uncertainty,
            relative = line.relative,
            "{line}"
        );
    }

    fn warning(&mut self, message: &str) {
        tracing::warn!(target: "tally::report", "{message}");
    }
}

/// Keeps every reported item in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectingSink {
    /// `(title, histories)` pairs in report order.
    pub titles: Vec<(String, u64)>,
    /// Slot lines in report order.
    pub lines: Vec<ReportLine>,
    /// Warnings in report order.
    pub warnings: Vec<String>,
}

impl CollectingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for CollectingSink {
    fn title(&mut self, title: &str, histories: u64) {
        self.titles.push((title.to_string(), histories));
    }

    fn line(&mut self, line: &ReportLine) {
        self.lines.push(*line);
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
