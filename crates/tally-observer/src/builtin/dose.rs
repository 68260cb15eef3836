//! Energy deposition per region and per medium.

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

/// Scores `edep * weight` on energy-deposition events.
///
/// Deposits land in the slot of the current region (via a
/// [`RegionMap`]) and, when enabled, in the slot of the current medium.
/// Events in unmapped regions, outside the geometry, or in a medium
/// beyond the configured count are not scored.
#[derive(Clone, Debug)]
pub struct DoseScoring {
    name: String,
    regions: RegionMap,
    region_array: Option<usize>,
    medium_array: Option<usize>,
    state: ScoredArrays,
    normalization: f64,
    relative_error: bool,
}

impl DoseScoring {
    /// Factory key.
    pub const KIND: &'static str = "dose_scoring";

    /// Score the regions of `regions`, and media `0..media` if given.
    ///
    /// Fails with [`ScoringError::ZeroSlots`] if nothing would be scored.
    pub fn new(
        name: impl Into<String>,
        regions: RegionMap,
        media: Option<usize>,
    ) -> Result<Self, ScoringError> {
        let mut arrays = Vec::new();
        let mut region_array = None;
        if !regions.is_empty() {
            region_array = Some(arrays.len());
            arrays.push(ScoringArray::new(regions.slot_count())?);
        }
        let mut medium_array = None;
        if let Some(media) = media {
            medium_array = Some(arrays.len());
            arrays.push(ScoringArray::new(media)?);
        }
        if arrays.is_empty() {
            return Err(ScoringError::ZeroSlots);
        }
        Ok(Self {
            name: name.into(),
            regions,
            region_array,
            medium_array,
            state: ScoredArrays::new(arrays),
            normalization: 1.0,
            relative_error: false,
        })
    }

    /// Build from a declaration.
    ///
    /// Parameters: `regions` (integer list) or `region_count` (integer,
    /// scores `0..n`), `media` (integer), `normalization` (float,
    /// default 1), `relative_error` (bool, default false).
    pub fn from_decl(decl: &ObserverDecl) -> Result<Self, RegistryError> {
        let regions = match decl.regions("regions")? {
            Some(list) => RegionMap::from_regions(&list),
            None => {
                let count = decl.count("region_count")?.unwrap_or(0);
                if count > RegionMap::MAX_IDENTITY {
                    return Err(RegistryError::InvalidParameter {
                        observer: decl.name.clone(),
                        key: "region_count".into(),
                        reason: format!("{count} exceeds the region index range"),
                    });
                }
                RegionMap::identity(count)
            }
        };
        let media = decl.count("media")?;
        let normalization = decl.float("normalization")?.unwrap_or(1.0);
        if !normalization.is_finite() {
            return Err(RegistryError::InvalidParameter {
                observer: decl.name.clone(),
                key: "normalization".into(),
                reason: format!("must be finite, got {normalization}"),
            });
        }
        let relative_error = decl.flag("relative_error")?.unwrap_or(false);
        let dose = Self::new(decl.name.clone(), regions, media).map_err(|source| {
            RegistryError::Scoring {
                observer: decl.name.clone(),
                source,
            }
        })?;
        Ok(dose
            .with_normalization(normalization)
            .with_relative_error(relative_error))
    }

    /// Factory constructor.
    pub fn build(decl: &ObserverDecl) -> Result<Box<dyn EventHandler>, RegistryError> {
        Ok(Box::new(Self::from_decl(decl)?))
    }

    /// Multiply reported values and uncertainties by `normalization`.
    #[must_use]
    pub fn with_normalization(mut self, normalization: f64) -> Self {
        self.normalization = normalization;
        self
    }

    /// Report uncertainties as a percentage of the value.
    #[must_use]
    pub fn with_relative_error(mut self, relative_error: bool) -> Self {
        self.relative_error = relative_error;
        self
    }

    /// The region-to-slot mapping.
    pub fn region_map(&self) -> &RegionMap {
        &self.regions
    }

    /// The per-region array, if regions are scored.
    pub fn region_array(&self) -> Option<&ScoringArray> {
        self.region_array.map(|i| self.state.array(i))
    }

    /// The per-medium array, if media are scored.
    pub fn medium_array(&self) -> Option<&ScoringArray> {
        self.medium_array.map(|i| self.state.array(i))
    }

    /// Energy deposited in `region` per history.
    pub fn region_dose(&self, region: i32) -> Option<Estimate> {
        let slot = self.regions.slot(region)?;
        let array = self.region_array()?;
        if slot >= array.bins() {
            return None;
        }
        array.result(slot)
    }

    /// Energy deposited in `medium` per history.
    pub fn medium_dose(&self, medium: usize) -> Option<Estimate> {
        let array = self.medium_array()?;
        if medium >= array.bins() {
            return None;
        }
        array.result(medium)
    }

    /// The last history this handler saw.
    pub fn last_case(&self) -> HistoryId {
        self.state.last_case()
    }
}

impl EventHandler for DoseScoring {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "energy deposition per region and medium"
    }

    fn needs_call(&self, kind: EventKind) -> bool {
        kind.is_energy_deposition()
    }

    fn process_event(&mut self, kind: EventKind, ctx: &EventContext) -> EventAction {
        if !kind.is_energy_deposition() || ctx.edep <= 0.0 {
            return EventAction::Continue;
        }
        let value = ctx.edep * ctx.weight;
        if let (Some(i), Ok(medium)) = (self.medium_array, usize::try_from(ctx.medium)) {
            let array = self.state.array_mut(i);
            if medium < array.bins() {
                array.score(medium, value);
            }
        }
        if let (Some(i), Some(slot)) = (self.region_array, self.regions.slot(ctx.region)) {
            // A restore may have resized the array.
            let array = self.state.array_mut(i);
            if slot < array.bins() {
                array.score(slot, value);
            }
        }
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
        if let Some(array) = self.region_array() {
            let title = format!("{}: energy deposited per region", self.name);
            array.report(self.normalization, &title, self.relative_error, sink);
        }
        if let Some(array) = self.medium_array() {
            let title = format!("{}: energy deposited per medium", self.name);
            array.report(self.normalization, &title, self.relative_error, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::CollectingSink;

    fn deposit(region: i32, medium: i32, edep: f64, weight: f64) -> EventContext {
        EventContext {
            region,
            medium,
            edep,
            weight,
            ..EventContext::default()
        }
    }

    fn run(dose: &mut DoseScoring, histories: &[&[EventContext]]) {
        for (i, events) in histories.iter().enumerate() {
            dose.set_current_history(HistoryId(i as u64 + 1));
            for ctx in *events {
                dose.process_event(EventKind::BeforeTransport, ctx);
            }
        }
    }

    // ── construction ───────────────────────────────────────────

    #[test]
    fn nothing_to_score_is_an_error() {
        assert_eq!(
            DoseScoring::new("d", RegionMap::from_regions(&[]), None).unwrap_err(),
            ScoringError::ZeroSlots
        );
    }

    #[test]
    fn from_decl_reads_parameters() {
        let decl = ObserverDecl::new("dose", DoseScoring::KIND)
            .with("regions", vec![4i64, 2])
            .with("media", 3i64)
            .with("normalization", 0.5);
        let dose = DoseScoring::from_decl(&decl).unwrap();
        assert_eq!(dose.region_array().unwrap().bins(), 2);
        assert_eq!(dose.medium_array().unwrap().bins(), 3);
        assert_eq!(dose.region_map().slot(2), Some(1));
    }

    #[test]
    fn from_decl_sparse_high_region() {
        let decl = ObserverDecl::new("dose", DoseScoring::KIND)
            .with("regions", vec![i64::from(i32::MAX)]);
        let dose = DoseScoring::from_decl(&decl).unwrap();
        assert_eq!(dose.region_array().unwrap().bins(), 1);
        assert_eq!(dose.region_map().slot(i32::MAX), Some(0));
    }

    #[test]
    fn from_decl_region_count_beyond_index_range() {
        let decl = ObserverDecl::new("dose", DoseScoring::KIND)
            .with("region_count", i64::from(i32::MAX) + 2);
        assert!(matches!(
            DoseScoring::from_decl(&decl),
            Err(RegistryError::InvalidParameter { key, .. }) if key == "region_count"
        ));
    }

    #[test]
    fn from_decl_zero_media_is_scoring_error() {
        let decl = ObserverDecl::new("dose", DoseScoring::KIND).with("media", 0i64);
        assert!(matches!(
            DoseScoring::from_decl(&decl),
            Err(RegistryError::Scoring {
                source: ScoringError::ZeroSlots,
                ..
            })
        ));
    }

    // ── scoring ────────────────────────────────────────────────

    #[test]
    fn interested_in_deposition_events_only() {
        let dose = DoseScoring::new("d", RegionMap::identity(1), None).unwrap();
        let kinds: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|k| dose.needs_call(*k))
            .collect();
        assert_eq!(kinds.len(), 5);
        assert!(kinds.iter().all(|k| k.is_energy_deposition()));
    }

    #[test]
    fn scores_weighted_deposit_in_region_and_medium() {
        let mut dose = DoseScoring::new("d", RegionMap::identity(2), Some(2)).unwrap();
        run(
            &mut dose,
            &[
                &[deposit(0, 1, 2.0, 0.5), deposit(1, 1, 1.0, 1.0)],
                &[deposit(0, 0, 4.0, 1.0)],
            ],
        );
        let r0 = dose.region_dose(0).unwrap();
        assert_eq!(r0.mean, (1.0 + 4.0) / 2.0);
        let r1 = dose.region_dose(1).unwrap();
        assert_eq!(r1.mean, 0.5);
        let m1 = dose.medium_dose(1).unwrap();
        assert_eq!(m1.mean, 1.0);
        let m0 = dose.medium_dose(0).unwrap();
        assert_eq!(m0.mean, 2.0);
    }

    #[test]
    fn unscored_contexts_are_skipped() {
        let mut dose = DoseScoring::new("d", RegionMap::from_regions(&[3]), Some(1)).unwrap();
        run(
            &mut dose,
            &[
                &[
                    deposit(-1, -1, 1.0, 1.0),
                    deposit(7, 5, 1.0, 1.0),
                    deposit(3, 0, 0.0, 1.0),
                    deposit(3, 0, -1.0, 1.0),
                ],
                &[],
            ],
        );
        assert_eq!(dose.region_dose(3).unwrap().mean, 0.0);
        assert_eq!(dose.medium_dose(0).unwrap().mean, 0.0);
        assert!(dose.region_dose(7).is_none());
        assert!(dose.medium_dose(5).is_none());
    }

    #[test]
    fn non_deposition_event_ignored() {
        let mut dose = DoseScoring::new("d", RegionMap::identity(1), None).unwrap();
        dose.set_current_history(HistoryId(1));
        dose.process_event(EventKind::AfterCompton, &deposit(0, 0, 1.0, 1.0));
        assert_eq!(dose.region_array().unwrap().current_value(0), 0.0);
    }

    // ── reporting and state ────────────────────────────────────

    #[test]
    fn report_titles_and_normalization() {
        let mut dose = DoseScoring::new("phantom", RegionMap::identity(1), Some(1))
            .unwrap()
            .with_normalization(10.0);
        run(
            &mut dose,
            &[&[deposit(0, 0, 1.0, 1.0)], &[deposit(0, 0, 3.0, 1.0)]],
        );
        let mut sink = CollectingSink::new();
        dose.report_results(&mut sink);
        assert_eq!(sink.titles.len(), 2);
        assert_eq!(
            sink.titles[0],
            ("phantom: energy deposited per region".to_string(), 2)
        );
        assert_eq!(sink.lines[0].value, 20.0);
    }

    #[test]
    fn state_round_trip_through_handler_interface() {
        let mut dose = DoseScoring::new("d", RegionMap::identity(2), None).unwrap();
        run(
            &mut dose,
            &[&[deposit(0, 0, 1.0, 1.0)], &[deposit(1, 0, 2.0, 1.0)]],
        );
        let mut buf = Vec::new();
        dose.store_state(&mut buf).unwrap();

        let mut back = DoseScoring::new("d", RegionMap::identity(2), None).unwrap();
        back.set_state(&mut buf.as_slice()).unwrap();
        assert_eq!(back.last_case(), HistoryId(2));
        assert_eq!(back.region_dose(1), dose.region_dose(1));

        back.reset_counter();
        assert_eq!(back.last_case(), HistoryId::ZERO);
        assert!(back.region_dose(1).is_none());
    }
}
