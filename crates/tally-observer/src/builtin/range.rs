//! Range rejection: discard low-energy charged particles.

use std::io::{Read, Write};

use tally_checkpoint::{Checkpoint, CheckpointError};
use tally_core::{
    EventAction, EventContext, EventKind, HistoryId, RegistryError, ReportSink, ScoringError,
};
use tally_score::{Estimate, ScoringArray};

use crate::config::ObserverDecl;
use crate::handler::EventHandler;
use crate::region::RegionMap;
use crate::state::ScoredArrays;

/// Requests [`EventAction::Discard`] for charged particles whose total
/// energy is below `e_max` inside the selected regions.
///
/// Checked before every transport step. The statistical weight of each
/// rejected particle is tallied in a one-slot array so the discarded
/// fraction can be reported.
#[derive(Clone, Debug)]
pub struct RangeRejection {
    name: String,
    e_max: f64,
    regions: RegionMap,
    state: ScoredArrays,
}

impl RangeRejection {
    /// Factory key.
    pub const KIND: &'static str = "range_rejection";

    /// Reject below `e_max` in `regions`.
    pub fn new(
        name: impl Into<String>,
        e_max: f64,
        regions: RegionMap,
    ) -> Result<Self, ScoringError> {
        Ok(Self {
            name: name.into(),
            e_max,
            regions,
            state: ScoredArrays::new(vec![ScoringArray::new(1)?]),
        })
    }

    /// Build from a declaration.
    ///
    /// Parameters: `e_max` (float, required, positive), `regions`
    /// (integer list, required).
    pub fn from_decl(decl: &ObserverDecl) -> Result<Self, RegistryError> {
        let e_max = decl.require_float("e_max")?;
        if !(e_max.is_finite() && e_max > 0.0) {
            return Err(RegistryError::InvalidParameter {
                observer: decl.name.clone(),
                key: "e_max".into(),
                reason: format!("must be positive and finite, got {e_max}"),
            });
        }
        let regions = decl
            .regions("regions")?
            .ok_or_else(|| RegistryError::MissingParameter {
                observer: decl.name.clone(),
                key: "regions".into(),
            })?;
        Self::new(decl.name.clone(), e_max, RegionMap::from_regions(&regions)).map_err(|source| {
            RegistryError::Scoring {
                observer: decl.name.clone(),
                source,
            }
        })
    }

    /// Factory constructor.
    pub fn build(decl: &ObserverDecl) -> Result<Box<dyn EventHandler>, RegistryError> {
        Ok(Box::new(Self::from_decl(decl)?))
    }

    /// Energy threshold, rest mass included.
    pub fn e_max(&self) -> f64 {
        self.e_max
    }

    /// Rejected weight per history.
    pub fn rejected(&self) -> Option<Estimate> {
        self.state.array(0).result(0)
    }

    /// Total rejected weight so far.
    pub fn rejected_weight(&self) -> f64 {
        self.state.array(0).cell(0).completed_totals().0
    }
}

impl EventHandler for RangeRejection {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "range rejection of low-energy charged particles"
    }

    fn needs_call(&self, kind: EventKind) -> bool {
        kind == EventKind::BeforeTransport
    }

    fn process_event(&mut self, kind: EventKind, ctx: &EventContext) -> EventAction {
        if kind != EventKind::BeforeTransport
            || !ctx.is_charged()
            || ctx.energy >= self.e_max
            || self.regions.slot(ctx.region).is_none()
        {
            return EventAction::Continue;
        }
        self.state.array_mut(0).score(0, ctx.weight);
        EventAction::Discard
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
        let title = format!("{}: rejected weight per history", self.name);
        self.state.array(0).report(1.0, &title, false, sink);
    }
}
