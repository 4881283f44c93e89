use serde::Serialize;

use crate::core::MatchOutcome;
use crate::models::domain::{DimensionScore, Explanation, MatchResult};

/// One ranked candidate as handed to the result consumer
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub rank: usize,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    pub breakdown: Vec<DimensionScore>,
    pub explanation: Vec<Explanation>,
}

impl From<(usize, &MatchResult<'_>)> for RankedMatch {
    fn from((index, result): (usize, &MatchResult<'_>)) -> Self {
        Self {
            rank: index + 1,
            user_id: result.candidate.user_id().to_string(),
            total_score: result.total_score,
            breakdown: result.breakdown.clone(),
            explanation: result.explain(),
        }
    }
}

/// Ranking report for one target user
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    #[serde(rename = "targetUserId")]
    pub target_user_id: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    pub scored: usize,
    pub matches: Vec<RankedMatch>,
    #[serde(rename = "recommendedGames")]
    pub recommended_games: Vec<(String, f64)>,
}

impl RankingReport {
    pub fn new(
        target_user_id: impl Into<String>,
        outcome: &MatchOutcome<'_>,
        generated_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            target_user_id: target_user_id.into(),
            generated_at,
            total_candidates: outcome.total_candidates,
            scored: outcome.scored,
            matches: outcome
                .matches
                .iter()
                .enumerate()
                .map(|(index, result)| RankedMatch::from((index, result)))
                .collect(),
            recommended_games: outcome.recommended_games.clone(),
        }
    }
}
