//! [`RegionMap`]: geometry region index to scoring slot.

use indexmap::IndexSet;

/// Maps geometry regions to compact scoring slots.
///
/// Slots are assigned in the order regions are listed. Negative regions
/// (outside the geometry) and unlisted regions map to no slot. Storage
/// is proportional to the number of scored regions, never to the
/// largest region index.
#[derive(Clone, Debug)]
pub struct RegionMap {
    layout: Layout,
}

#[derive(Clone, Debug)]
enum Layout {
    /// Regions `0..n` score into the slot of the same index.
    Identity(usize),
    /// The set's insertion index is the slot.
    Listed(IndexSet<i32>),
}

impl RegionMap {
    /// Largest region count an identity map can cover.
    pub const MAX_IDENTITY: usize = i32::MAX as usize + 1;

    /// Score regions `0..count` into slots of the same index.
    ///
    /// `count` is clamped to [`MAX_IDENTITY`](Self::MAX_IDENTITY).
    pub fn identity(count: usize) -> Self {
        Self {
            layout: Layout::Identity(count.min(Self::MAX_IDENTITY)),
        }
    }

    /// Score the listed regions, in list order.
    ///
    /// Negative entries and repeats are ignored.
    pub fn from_regions(regions: &[i32]) -> Self {
        let listed = regions.iter().copied().filter(|&r| r >= 0).collect();
        Self {
            layout: Layout::Listed(listed),
        }
    }

    /// Slot of `region`, or `None` if it is not scored.
    #[inline]
    pub fn slot(&self, region: i32) -> Option<usize> {
        match &self.layout {
            Layout::Identity(count) => {
                let r = usize::try_from(region).ok()?;
                (r < *count).then_some(r)
            }
            Layout::Listed(set) => set.get_index_of(&region),
        }
    }

    /// Region scored into `slot`.
    pub fn region(&self, slot: usize) -> Option<i32> {
        match &self.layout {
            Layout::Identity(count) if slot < *count => i32::try_from(slot).ok(),
            Layout::Identity(_) => None,
            Layout::Listed(set) => set.get_index(slot).copied(),
        }
    }

    /// Number of scored regions.
    pub fn slot_count(&self) -> usize {
        match &self.layout {
            Layout::Identity(count) => *count,
            Layout::Listed(set) => set.len(),
        }
    }

    /// Whether no region is scored.
    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }
}
