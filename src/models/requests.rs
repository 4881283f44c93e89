use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::RankOptions;

/// Request to rank the pool for one target user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_top_n", alias = "top_n", rename = "topN")]
    pub top_n: usize,
    /// Overrides the configured shared-game prefilter when set
    #[serde(default)]
    pub prefilter: Option<bool>,
}

fn default_top_n() -> usize {
    10
}

impl RankQuery {
    pub fn new(user_id: impl Into<String>, top_n: usize) -> Self {
        Self {
            user_id: user_id.into(),
            top_n,
            prefilter: None,
        }
    }

    /// Apply this query on top of the configured ranking options
    pub fn options(&self, base: &RankOptions) -> RankOptions {
        RankOptions {
            top_n: self.top_n,
            prefilter: self.prefilter.unwrap_or(base.prefilter),
            ..*base
        }
    }
}
