//! Deterministic synthetic histories.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tally_core::{EventContext, EventKind, HistoryId};

/// One event of a synthetic history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticEvent {
    pub kind: EventKind,
    pub ctx: EventContext,
}

/// Seeded generator of histories of random events.
///
/// The same seed always yields the same sequence. History ids start at
/// 1 and increase by one per history.
#[derive(Clone, Debug)]
pub struct HistoryStream {
    rng: ChaCha8Rng,
    regions: i32,
    media: i32,
    max_events: usize,
    kinds: Vec<EventKind>,
    next_case: u64,
}

impl HistoryStream {
    /// 4 regions, 2 media, up to 8 events per history, every kind.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            regions: 4,
            media: 2,
            max_events: 8,
            kinds: EventKind::ALL.to_vec(),
            next_case: 1,
        }
    }

    pub fn with_regions(mut self, regions: i32) -> Self {
        self.regions = regions.max(1);
        self
    }

    pub fn with_media(mut self, media: i32) -> Self {
        self.media = media.max(1);
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Only emit events of `kinds`. An empty list is ignored.
    pub fn with_kinds(mut self, kinds: &[EventKind]) -> Self {
        if !kinds.is_empty() {
            self.kinds = kinds.to_vec();
        }
        self
    }

    /// Start numbering histories at `case`.
    pub fn starting_at(mut self, case: u64) -> Self {
        self.next_case = case;
        self
    }

    fn event(&mut self) -> SyntheticEvent {
        let kind = self.kinds[self.rng.random_range(0..self.kinds.len())];
        // One in eight events happens outside the geometry.
        let region = if self.rng.random_range(0..8) == 0 {
            -1
        } else {
            self.rng.random_range(0..self.regions)
        };
        let medium = if region < 0 { -1 } else { region % self.media };
        let edep = if kind.is_energy_deposition() {
            self.rng.random::<f64>()
        } else {
            0.0
        };
        let ctx = EventContext {
            region,
            medium,
            charge: self.rng.random_range(-1..=1),
            energy: 2.0 * self.rng.random::<f64>(),
            edep,
            weight: if self.rng.random_bool(0.25) { 0.5 } else { 1.0 },
            ..EventContext::default()
        };
        SyntheticEvent { kind, ctx }
    }

    /// The next history and its events.
    pub fn next_history(&mut self) -> (HistoryId, Vec<SyntheticEvent>) {
        let case = HistoryId(self.next_case);
        self.next_case += 1;
        let n = self.rng.random_range(0..=self.max_events);
        let events = (0..n).map(|_| self.event()).collect();
        (case, events)
    }

    /// Random `(slot, value)` scores for one history of a `slots`-wide
    /// array, for tests that bypass the dispatcher.
    pub fn scores(&mut self, slots: usize) -> Vec<(usize, f64)> {
        let n = self.rng.random_range(0..=self.max_events);
        (0..n)
            .map(|_| {
                (
                    self.rng.random_range(0..slots.max(1)),
                    self.rng.random::<f64>(),
                )
            })
            .collect()
    }
}

impl Iterator for HistoryStream {
    type Item = (HistoryId, Vec<SyntheticEvent>);

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_history())
    }
}
