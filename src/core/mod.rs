// Core algorithm exports
pub mod binary;
pub mod filters;
pub mod games;
pub mod gender;
pub mod matcher;
pub mod ordinal;
pub mod preference;
pub mod scoring;

pub use binary::{BinaryComparator, RegionComparator};
pub use filters::{expanded_game_set, shares_game, similar_games};
pub use games::{jaccard, GameComparator, GameSimilarity};
pub use gender::GenderComparator;
pub use matcher::{MatchEngine, MatchOutcome, RankOptions};
pub use ordinal::OrdinalComparator;
pub use preference::PreferenceComparator;
pub use scoring::Aggregator;

/// Per-dimension similarity between two values.
///
/// Implementations are pure and return a score in `[0, 1]`. Unknown values
/// must degrade to a fallback score instead of failing.
pub trait Comparator: Send + Sync {
    type Value: ?Sized;

    fn compare(&self, source: &Self::Value, target: &Self::Value) -> f64;
}
