use thiserror::Error;

/// Structural errors raised by the matching engine.
///
/// Data-quality problems (unknown categories, missing table rows, empty game
/// lists) never surface here; comparators absorb them into fallback scores.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Profile failed validation at construction
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] validator::ValidationErrors),

    /// Game catalog entry failed validation
    #[error("Invalid catalog entry '{game_id}': {message}")]
    InvalidCatalogEntry { game_id: String, message: String },

    /// Dimension weight is negative or not finite
    #[error("Invalid weight for dimension '{dimension}': {weight}")]
    InvalidWeight { dimension: String, weight: f64 },

    /// Gender preference decay must be a positive real
    #[error("Invalid decay factor: {0} (must be > 0)")]
    InvalidDecay(f64),

    /// Similarity table entry outside [0, 1]
    #[error("Table '{table}' has out-of-range entry {key}: {value}")]
    TableOutOfRange {
        table: String,
        key: String,
        value: f64,
    },

    /// Target id does not resolve to a profile in the pool
    #[error("Target profile not found in pool: {0}")]
    TargetNotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
