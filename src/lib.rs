//! Playmate Match - Compatibility scoring and ranking for game partners
//!
//! This library scores how well two player profiles fit together across a set
//! of independently weighted dimensions (online status, server, play time,
//! experience, play style, MBTI, zodiac, gender preference and games) and
//! ranks a candidate pool for a target player.
//!
//! All lookup tables are immutable once the engine is built, so a single
//! [`MatchEngine`] can be shared freely between threads.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{Aggregator, Comparator, MatchEngine, MatchOutcome, RankOptions};
pub use error::{EngineError, Result};
pub use models::{
    ConfigTables, Dimension, GameCatalog, GameCatalogEntry, MatchResult, Profile, RankQuery,
    RankingReport,
};
pub use services::{LoadError, PoolData, PoolLoader};
