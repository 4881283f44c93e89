use crate::core::Comparator;
use crate::models::{GenderPolicy, Profile, RankDecay};

/// Bidirectional, rank-weighted gender preference comparator.
///
/// Each side's weight decays with the rank the other side's gender holds in
/// its list; both weights are combined by geometric mean. Pairs where either
/// side is not the other's first choice are capped at `non_top_cap`. Empty
/// lists and unlisted genders score `unmatched_score` instead of zero.
#[derive(Debug, Clone)]
pub struct GenderComparator {
    policy: GenderPolicy,
}

impl GenderComparator {
    pub fn new(policy: GenderPolicy) -> Self {
        Self { policy }
    }

    /// Weight of a preference found at `position` in a list of `len` entries
    pub fn rank_weight(&self, position: usize, len: usize) -> f64 {
        let exponent = match self.policy.rank_decay {
            RankDecay::FromTop => position,
            RankDecay::FromBottom => len.saturating_sub(1 + position),
        };
        self.policy.decay.powi(exponent as i32)
    }
}

impl Comparator for GenderComparator {
    type Value = Profile;

    fn compare(&self, source: &Profile, target: &Profile) -> f64 {
        let source_list = source.gender_preference();
        let target_list = target.gender_preference();

        if source_list.is_empty() || target_list.is_empty() {
            return self.policy.unmatched_score;
        }

        let (source_rank, target_rank) = match (
            source.preference_rank(target.gender()),
            target.preference_rank(source.gender()),
        ) {
            (Some(s), Some(t)) => (s, t),
            _ => return self.policy.unmatched_score,
        };

        let source_weight = self.rank_weight(source_rank, source_list.len());
        let target_weight = self.rank_weight(target_rank, target_list.len());
        let combined = (source_weight * target_weight).sqrt().clamp(0.0, 1.0);

        if source_rank > 0 || target_rank > 0 {
            combined.min(self.policy.non_top_cap)
        } else {
            combined
        }
    }
}
