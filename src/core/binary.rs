use crate::core::Comparator;
use crate::models::{BinaryScores, RegionTiers};

/// Exact-match comparator for single categorical attributes
#[derive(Debug, Clone)]
pub struct BinaryComparator {
    scores: BinaryScores,
}

impl BinaryComparator {
    pub fn new(scores: BinaryScores) -> Self {
        Self { scores }
    }
}

impl Comparator for BinaryComparator {
    type Value = str;

    #[inline]
    fn compare(&self, source: &str, target: &str) -> f64 {
        if source == target {
            self.scores.matched
        } else {
            self.scores.unmatched
        }
    }
}

/// Server/region comparator
///
/// Exact region → `exact`; both regions in the same configured group →
/// `same_group`; otherwise `cross_group`. A region outside every configured
/// group also falls back to `cross_group`.
#[derive(Debug, Clone)]
pub struct RegionComparator {
    tiers: RegionTiers,
}

impl RegionComparator {
    pub fn new(tiers: RegionTiers) -> Self {
        Self { tiers }
    }
}

impl Comparator for RegionComparator {
    type Value = str;

    fn compare(&self, source: &str, target: &str) -> f64 {
        if source == target {
            return self.tiers.exact;
        }

        match (self.tiers.group_of(source), self.tiers.group_of(target)) {
            (Some(a), Some(b)) if a == b => self.tiers.same_group,
            _ => self.tiers.cross_group,
        }
    }
}
