//! Reusable handler fixtures.
//!
//! - [`RecordingObserver`] counts every call it receives per event kind.
//! - [`ConstScorer`] scores a constant into one slot on chosen kinds.

use std::io::{Read, Write};

use tally_checkpoint::{Checkpoint, CheckpointError};
use tally_core::{
    EventAction, EventContext, EventKind, EventSet, HistoryId, ReportSink, ScoringError,
};
use tally_observer::{EventHandler, ScoredArrays};
use tally_score::ScoringArray;

/// Counts `process_event` calls per kind and `set_current_history` calls.
///
/// Calls for kinds outside the declared interest are counted separately
/// in [`unexpected`](RecordingObserver::unexpected), so a test can assert
/// the dispatcher never routed them.
#[derive(Clone, Debug)]
pub struct RecordingObserver {
    pub name: String,
    pub kinds: EventSet,
    calls: [u64; EventKind::COUNT],
    unexpected: u64,
    histories: Vec<HistoryId>,
    action: EventAction,
}

impl RecordingObserver {
    pub fn new(name: impl Into<String>, kinds: EventSet) -> Self {
        Self {
            name: name.into(),
            kinds,
            calls: [0; EventKind::COUNT],
            unexpected: 0,
            histories: Vec::new(),
            action: EventAction::Continue,
        }
    }

    /// Respond to every event with `action`.
    pub fn with_action(mut self, action: EventAction) -> Self {
        self.action = action;
        self
    }

    /// `process_event` calls for `kind`.
    pub fn calls(&self, kind: EventKind) -> u64 {
        self.calls[kind.index()]
    }

    /// `process_event` calls over all kinds.
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().sum()
    }

    /// Calls for kinds `needs_call` rejected.
    pub fn unexpected(&self) -> u64 {
        self.unexpected
    }

    /// Every history id received, in order.
    pub fn histories(&self) -> &[HistoryId] {
        &self.histories
    }
}

impl EventHandler for RecordingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "records calls"
    }

    fn needs_call(&self, kind: EventKind) -> bool {
        self.kinds.contains(kind)
    }

    fn process_event(&mut self, kind: EventKind, _ctx: &EventContext) -> EventAction {
        self.calls[kind.index()] += 1;
        if !self.kinds.contains(kind) {
            self.unexpected += 1;
        }
        self.action
    }

    fn set_current_history(&mut self, case: HistoryId) {
        self.histories.push(case);
    }
}

/// Scores `value` into `slot` every time one of `kinds` fires.
#[derive(Clone, Debug)]
pub struct ConstScorer {
    pub name: String,
    pub kinds: EventSet,
    pub slot: usize,
    pub value: f64,
    state: ScoredArrays,
}

impl ConstScorer {
    /// A scorer with a `slots`-wide array.
    pub fn new(
        name: impl Into<String>,
        kinds: EventSet,
        slots: usize,
        slot: usize,
        value: f64,
    ) -> Result<Self, ScoringError> {
        Ok(Self {
            name: name.into(),
            kinds,
            slot,
            value,
            state: ScoredArrays::new(vec![ScoringArray::new(slots)?]),
        })
    }

    pub fn array(&self) -> &ScoringArray {
        self.state.array(0)
    }

    pub fn last_case(&self) -> HistoryId {
        self.state.last_case()
    }
}

impl EventHandler for ConstScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_call(&self, kind: EventKind) -> bool {
        self.kinds.contains(kind)
    }

    fn process_event(&mut self, _kind: EventKind, _ctx: &EventContext) -> EventAction {
        let slot = self.slot;
        let value = self.value;
        self.state.array_mut(0).score(slot, value);
        EventAction::Continue
    }

    fn set_current_history(&mut self, case: HistoryId) {
        self.state.set_history(case);
    }

    fn store_state(&self, w: &mut dyn Write) -> Result<(), CheckpointError> {
        self.state.store(w)
    }

    fn set_state(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        self.state.restore(r)
    }

    fn add_state(&mut self, r: &mut dyn Read) -> Result<(), CheckpointError> {
        self.state.add_state(r)
    }

    fn reset_counter(&mut self) {
        self.state.reset_counter();
    }

    fn report_results(&self, sink: &mut dyn ReportSink) {
        self.state.array(0).report(1.0, &self.name, false, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_counts_per_kind() {
        let mut rec = RecordingObserver::new("rec", EventSet::empty().with(EventKind::Auger));
        let ctx = EventContext::default();
        rec.process_event(EventKind::Auger, &ctx);
        rec.process_event(EventKind::Auger, &ctx);
        rec.process_event(EventKind::AfterPair, &ctx);
        assert_eq!(rec.calls(EventKind::Auger), 2);
        assert_eq!(rec.total_calls(), 3);
        assert_eq!(rec.unexpected(), 1);
    }

    #[test]
    fn const_scorer_scores_its_slot() {
        let mut s = ConstScorer::new("c", EventSet::all(), 3, 1, 2.0).unwrap();
        s.set_current_history(HistoryId(1));
        s.process_event(EventKind::AfterCompton, &EventContext::default());
        s.process_event(EventKind::AfterCompton, &EventContext::default());
        assert_eq!(s.array().current_value(1), 4.0);
        assert_eq!(s.array().current_value(0), 0.0);
    }
}
