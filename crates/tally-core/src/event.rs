//! The closed set of transport events ([`EventKind`]) and a compact
//! bitset over it ([`EventSet`]).
//!
//! The integer tags are stable: they are the numbers the transport loop
//! uses when it reports an event, so they must never be renumbered.

use std::fmt;

/// A point in the transport loop at which observers may be notified.
///
/// Discriminants are the stable integer tags. Note that
/// [`BeforeAnnihilationAtRest`](EventKind::BeforeAnnihilationAtRest) was
/// added after [`AfterAnnihilationAtRest`](EventKind::AfterAnnihilationAtRest)
/// and therefore carries a higher tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventKind {
    /// Before a transport step.
    BeforeTransport = 0,
    /// Particle energy fell below the transport cutoff.
    BelowTransportCutoff = 1,
    /// Particle energy fell below the cross-section data cutoff.
    BelowDataCutoff = 2,
    /// The application requested a discard.
    UserDiscard = 3,
    /// Energy not transferred to any particle (e.g. binding energy).
    ExtraEnergy = 4,
    /// After a transport step.
    AfterTransport = 5,
    /// Before a bremsstrahlung interaction.
    BeforeBremsstrahlung = 6,
    /// After a bremsstrahlung interaction.
    AfterBremsstrahlung = 7,
    /// Before an inelastic collision of an electron.
    BeforeMoller = 8,
    /// After an inelastic collision of an electron.
    AfterMoller = 9,
    /// Before an inelastic collision of a positron.
    BeforeBhabha = 10,
    /// After an inelastic collision of a positron.
    AfterBhabha = 11,
    /// Before annihilation in flight.
    BeforeAnnihilationInFlight = 12,
    /// After annihilation in flight.
    AfterAnnihilationInFlight = 13,
    /// After annihilation at rest.
    AfterAnnihilationAtRest = 14,
    /// Before pair production.
    BeforePair = 15,
    /// After pair production.
    AfterPair = 16,
    /// Before a Compton scattering event.
    BeforeCompton = 17,
    /// After a Compton scattering event.
    AfterCompton = 18,
    /// Before photo-absorption.
    BeforePhotoAbsorption = 19,
    /// After photo-absorption.
    AfterPhotoAbsorption = 20,
    /// The direction rotation routine was entered.
    EnteringRotation = 21,
    /// About to leave the direction rotation routine.
    LeavingRotation = 22,
    /// Before coherent (Rayleigh) scattering.
    BeforeRayleigh = 23,
    /// After coherent (Rayleigh) scattering.
    AfterRayleigh = 24,
    /// A fluorescent transition occurred.
    Fluorescence = 25,
    /// A Coster-Kronig transition occurred.
    CosterKronig = 26,
    /// An Auger transition occurred.
    Auger = 27,
    /// Before annihilation at rest.
    BeforeAnnihilationAtRest = 28,
    /// Before a photonuclear event.
    BeforePhotonuclear = 29,
    /// After a photonuclear event.
    AfterPhotonuclear = 30,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 31;

    /// Every event kind, in tag order (`ALL[t].tag() == t`).
    pub const ALL: [EventKind; Self::COUNT] = [
        Self::BeforeTransport,
        Self::BelowTransportCutoff,
        Self::BelowDataCutoff,
        Self::UserDiscard,
        Self::ExtraEnergy,
        Self::AfterTransport,
        Self::BeforeBremsstrahlung,
        Self::AfterBremsstrahlung,
        Self::BeforeMoller,
        Self::AfterMoller,
        Self::BeforeBhabha,
        Self::AfterBhabha,
        Self::BeforeAnnihilationInFlight,
        Self::AfterAnnihilationInFlight,
        Self::AfterAnnihilationAtRest,
        Self::BeforePair,
        Self::AfterPair,
        Self::BeforeCompton,
        Self::AfterCompton,
        Self::BeforePhotoAbsorption,
        Self::AfterPhotoAbsorption,
        Self::EnteringRotation,
        Self::LeavingRotation,
        Self::BeforeRayleigh,
        Self::AfterRayleigh,
        Self::Fluorescence,
        Self::CosterKronig,
        Self::Auger,
        Self::BeforeAnnihilationAtRest,
        Self::BeforePhotonuclear,
        Self::AfterPhotonuclear,
    ];

    /// The stable integer tag.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Tag as a table index in `0..COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up an event kind by its tag. `None` for unknown tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Whether energy is deposited locally at this event.
    ///
    /// True for the first five kinds: before a step (continuous losses)
    /// and the four ways a particle or a slice of energy is dropped from
    /// the stack.
    pub fn is_energy_deposition(self) -> bool {
        self.tag() <= Self::ExtraEnergy.tag()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A set of [`EventKind`]s packed into one 32-bit word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventSet {
    bits: u32,
}

impl EventSet {
    const MASK: u32 = (1u32 << EventKind::COUNT) - 1;

    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Every event kind.
    pub const fn all() -> Self {
        Self { bits: Self::MASK }
    }

    /// The energy-deposition events (tags 0..=4).
    pub const fn energy_deposition() -> Self {
        Self { bits: 0b1_1111 }
    }

    /// Insert an event kind.
    pub fn insert(&mut self, kind: EventKind) {
        self.bits |= 1 << kind.tag();
    }

    /// Remove an event kind.
    pub fn remove(&mut self, kind: EventKind) {
        self.bits &= !(1 << kind.tag());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, kind: EventKind) -> Self {
        self.insert(kind);
        self
    }

    /// Membership test.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.bits & (1 << kind.tag()) != 0
    }

    /// Set union.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Returns `true` if the set contains no kinds.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of kinds in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate over the kinds in the set, in tag order.
    pub fn iter(&self) -> EventSetIter {
        EventSetIter {
            bits: self.bits,
            next_tag: 0,
        }
    }
}

impl FromIterator<EventKind> for EventSet {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl IntoIterator for &EventSet {
    type Item = EventKind;
    type IntoIter = EventSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`EventSet`], yielding kinds in tag order.
pub struct EventSetIter {
    bits: u32,
    next_tag: u8,
}

impl Iterator for EventSetIter {
    type Item = EventKind;

    fn next(&mut self) -> Option<Self::Item> {
        while (self.next_tag as usize) < EventKind::COUNT {
            let tag = self.next_tag;
            self.next_tag += 1;
            if self.bits & (1 << tag) != 0 {
                return EventKind::from_tag(tag);
            }
        }
        None
    }
}
