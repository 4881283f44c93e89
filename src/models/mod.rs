// Model exports
pub mod domain;
pub mod requests;
pub mod responses;
pub mod tables;

pub use domain::{
    Dimension, DimensionScore, Explanation, GameCatalog, GameCatalogEntry, MatchResult, Profile,
    ProfileBuilder, ProfileRecord, ScoreBand,
};
pub use requests::RankQuery;
pub use responses::{RankedMatch, RankingReport};
pub use tables::{
    BinaryScores, ConfigTables, GameWeights, GenderPolicy, OrdinalScale, PreferenceTable,
    RankDecay, RegionTiers, SimilarityMatrix, SocialWeights,
};
