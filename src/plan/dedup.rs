use std::collections::HashMap;

use crate::{
    foundation::core::{FrameIndex, Size},
    plan::frames::FrameSizePlan,
};

/// Canonical frame index for every output position, in playback order.
///
/// The concat list is written from this sequence, so its order is the output's temporal order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentReference {
    positions: Vec<FrameIndex>,
}

impl SegmentReference {
    /// `0..len`, used when every frame is encoded on its own.
    pub fn identity(len: usize) -> Self {
        Self {
            positions: (0..len as u64).map(FrameIndex).collect(),
        }
    }

    pub fn from_positions(positions: Vec<FrameIndex>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[FrameIndex] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_index(&self) -> Option<FrameIndex> {
        self.positions.iter().copied().max()
    }

    /// Sorted, deduplicated indices that need a segment on disk.
    pub fn distinct_indices(&self) -> Vec<FrameIndex> {
        let mut out = self.positions.clone();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// First-seen-wins map from size to canonical frame index.
#[derive(Clone, Debug, Default)]
pub struct DedupCache {
    by_size: HashMap<Size, FrameIndex>,
    canonical: Vec<Size>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical index for `size` and whether it was newly allocated.
    pub fn intern(&mut self, size: Size) -> (FrameIndex, bool) {
        if let Some(idx) = self.by_size.get(&size).copied() {
            return (idx, false);
        }
        let idx = FrameIndex(self.canonical.len() as u64);
        self.by_size.insert(size, idx);
        self.canonical.push(size);
        (idx, true)
    }

    /// Sizes indexed by canonical frame index.
    pub fn canonical_sizes(&self) -> &[Size] {
        &self.canonical
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn size_of(&self, idx: FrameIndex) -> Option<Size> {
        self.canonical.get(idx.0 as usize).copied()
    }
}

/// A plan collapsed to its distinct sizes.
#[derive(Clone, Debug)]
pub struct DedupPlan {
    /// Distinct sizes, indexed by canonical frame index.
    pub cache: DedupCache,
    /// Canonical index for every output position.
    pub reference: SegmentReference,
}

impl DedupPlan {
    pub fn build(plan: &FrameSizePlan) -> Self {
        let mut cache = DedupCache::new();
        let positions = plan.sizes().map(|size| cache.intern(size).0).collect();
        Self {
            cache,
            reference: SegmentReference::from_positions(positions),
        }
    }

    /// Sizes in playback order, rebuilt from the reference sequence.
    pub fn resolved_sizes(&self) -> Vec<Size> {
        self.reference
            .positions()
            .iter()
            .filter_map(|&idx| self.cache.size_of(idx))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/dedup.rs"]
mod tests;
