//! Per-event context supplied by the transport loop, and the action an
//! observer may request in response.

/// Region index meaning "outside the geometry".
pub const OUTSIDE: i32 = -1;

/// Snapshot of the transport state at the moment an event is reported.
///
/// The transport loop owns the particle stack; this is a by-value copy
/// of the few quantities scoring code reads. Region and medium follow
/// the negative-is-none convention of the geometry collaborator:
/// `-1` means outside (or vacuum), `>= 0` is an interior index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventContext {
    /// Region the top particle is in.
    pub region: i32,
    /// Medium of that region.
    pub medium: i32,
    /// Particle charge (-1, 0, +1).
    pub charge: i32,
    /// Total particle energy.
    pub energy: f64,
    /// Energy deposited locally by this event.
    pub edep: f64,
    /// Statistical weight of the particle.
    pub weight: f64,
    /// Position.
    pub position: [f64; 3],
    /// Unit direction.
    pub direction: [f64; 3],
}

impl EventContext {
    /// A context in `region` with unit weight and nothing else set.
    pub fn in_region(region: i32) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    /// Copy of `self` with the region replaced.
    ///
    /// Used by the dispatcher to apply a region override.
    #[must_use]
    pub fn with_region(mut self, region: i32) -> Self {
        self.region = region;
        self
    }

    /// Copy of `self` with the deposited energy replaced.
    #[must_use]
    pub fn with_edep(mut self, edep: f64) -> Self {
        self.edep = edep;
        self
    }

    /// Whether the particle is inside the geometry.
    pub fn is_inside(&self) -> bool {
        self.region >= 0
    }

    /// Whether the particle is charged.
    pub fn is_charged(&self) -> bool {
        self.charge != 0
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self {
            region: OUTSIDE,
            medium: OUTSIDE,
            charge: 0,
            energy: 0.0,
            edep: 0.0,
            weight: 1.0,
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
        }
    }
}

/// What the transport loop should do after an observer handled an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventAction {
    /// Carry on transporting the particle.
    #[default]
    Continue,
    /// Discard the current particle (variance reduction).
    Discard,
}

impl EventAction {
    /// Combine two responses to the same event; `Discard` wins.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_outside_with_unit_weight() {
        let ctx = EventContext::default();
        assert!(!ctx.is_inside());
        assert_eq!(ctx.weight, 1.0);
        assert_eq!(ctx.medium, OUTSIDE);
    }

    #[test]
    fn with_region_overrides_only_region() {
        let ctx = EventContext::in_region(3).with_edep(0.5);
        let moved = ctx.with_region(7);
        assert_eq!(moved.region, 7);
        assert_eq!(moved.edep, 0.5);
        assert_eq!(ctx.region, 3);
    }

    #[test]
    fn discard_dominates() {
        use EventAction::*;
        assert_eq!(Continue.merge(Continue), Continue);
        assert_eq!(Continue.merge(Discard), Discard);
        assert_eq!(Discard.merge(Continue), Discard);
    }
}
