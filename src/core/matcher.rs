use rayon::prelude::*;

use crate::core::{
    filters::{expanded_game_set, shares_game, similar_games},
    scoring::Aggregator,
};
use crate::error::{EngineError, Result};
use crate::models::{ConfigTables, GameCatalog, MatchResult, Profile};

/// Ranking knobs for one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Maximum number of results
    pub top_n: usize,
    /// Only score candidates sharing a played or recommended game
    pub prefilter: bool,
    /// Minimum type-set Jaccard for a catalog game to count as recommended
    pub similar_game_threshold: f64,
    /// Pools at least this large are scored in parallel
    pub parallel_threshold: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            prefilter: false,
            similar_game_threshold: 0.4,
            parallel_threshold: 256,
        }
    }
}

/// Result of ranking a pool for one target
#[derive(Debug)]
pub struct MatchOutcome<'a> {
    pub matches: Vec<MatchResult<'a>>,
    /// Pool size without the target itself
    pub total_candidates: usize,
    /// Candidates that survived the pre-filter and were scored
    pub scored: usize,
    /// Catalog games recommended for the target, best first
    pub recommended_games: Vec<(String, f64)>,
}

/// Matching engine: owns the immutable tables and catalog, ranks pools.
///
/// # Pipeline Stages
/// 1. Self-exclusion by identifier
/// 2. Optional shared-game pre-filter
/// 3. Scoring (parallel for large pools, order preserving)
/// 4. Gender-preference tiered sort, or a global sort when the target has no
///    preference list. Genders missing from a non-empty list are dropped.
/// 5. Truncation to `top_n`
#[derive(Debug, Clone)]
pub struct MatchEngine {
    aggregator: Aggregator,
}

impl MatchEngine {
    pub fn new(tables: ConfigTables, catalog: GameCatalog) -> Result<Self> {
        Ok(Self {
            aggregator: Aggregator::new(tables, catalog)?,
        })
    }

    pub fn with_reference_tables(catalog: GameCatalog) -> Result<Self> {
        Self::new(ConfigTables::reference(), catalog)
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn catalog(&self) -> &GameCatalog {
        self.aggregator.games().catalog()
    }

    /// Score a single (source, target) pair
    pub fn score_pair<'a>(&self, source: &Profile, target: &'a Profile) -> MatchResult<'a> {
        self.aggregator.score(source, target)
    }

    /// Rank `pool` for `target`
    pub fn find_matches<'a>(
        &self,
        target: &Profile,
        pool: &'a [Profile],
        options: &RankOptions,
    ) -> MatchOutcome<'a> {
        let candidates: Vec<&'a Profile> = pool.iter().filter(|p| *p != target).collect();
        let total_candidates = candidates.len();

        let recommended_games = similar_games(
            target.games(),
            self.catalog(),
            options.similar_game_threshold,
        );

        let candidates = if options.prefilter {
            let allowed = expanded_game_set(target, &recommended_games);
            candidates
                .into_iter()
                .filter(|candidate| shares_game(candidate, &allowed))
                .collect()
        } else {
            candidates
        };

        tracing::debug!(
            "Scoring {} of {} candidates for {}",
            candidates.len(),
            total_candidates,
            target.user_id()
        );

        let scored: Vec<MatchResult<'a>> = if candidates.len() >= options.parallel_threshold {
            candidates
                .par_iter()
                .map(|&candidate| self.score_pair(target, candidate))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&candidate| self.score_pair(target, candidate))
                .collect()
        };
        let scored_count = scored.len();

        let matches = if target.gender_preference().is_empty() {
            rank_globally(scored, options.top_n)
        } else {
            rank_by_preference_tiers(scored, target.gender_preference(), options.top_n)
        };

        tracing::debug!(
            "Returning {} matches for {} (scored {})",
            matches.len(),
            target.user_id(),
            scored_count
        );

        MatchOutcome {
            matches,
            total_candidates,
            scored: scored_count,
            recommended_games,
        }
    }

    /// Rank the pool for the pool member identified by `target_id`
    pub fn find_matches_by_id<'a>(
        &self,
        target_id: &str,
        pool: &'a [Profile],
        options: &RankOptions,
    ) -> Result<MatchOutcome<'a>> {
        let target = pool
            .iter()
            .find(|p| p.user_id() == target_id)
            .ok_or_else(|| EngineError::TargetNotFound(target_id.to_string()))?;

        Ok(self.find_matches(target, pool, options))
    }
}

/// Stable descending sort; equal scores keep pool order
fn sort_by_score(results: &mut [MatchResult<'_>]) {
    results.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
}

fn rank_globally(mut scored: Vec<MatchResult<'_>>, top_n: usize) -> Vec<MatchResult<'_>> {
    sort_by_score(&mut scored);
    scored.truncate(top_n);
    scored
}

/// Fill results tier by tier following the target's preference order.
///
/// Tier `i` holds candidates whose gender is the target's `i`-th preference;
/// candidates with an unlisted gender are not ranked at all. Each tier is
/// sorted on its own and later tiers are only consulted while slots remain.
fn rank_by_preference_tiers<'a>(
    scored: Vec<MatchResult<'a>>,
    preference: &[String],
    top_n: usize,
) -> Vec<MatchResult<'a>> {
    let capacity = top_n.min(scored.len());
    let mut tiers: Vec<Vec<MatchResult<'a>>> = preference.iter().map(|_| Vec::new()).collect();

    for result in scored {
        match preference
            .iter()
            .position(|gender| gender == result.candidate.gender())
        {
            Some(tier) => tiers[tier].push(result),
            None => tracing::trace!(
                "Dropping {}: gender {} not preferred",
                result.candidate.user_id(),
                result.candidate.gender()
            ),
        }
    }

    let mut ranked = Vec::with_capacity(capacity);
    for mut tier in tiers {
        let remaining = top_n - ranked.len();
        if remaining == 0 {
            break;
        }
        sort_by_score(&mut tier);
        ranked.extend(tier.into_iter().take(remaining));
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameCatalogEntry;

    fn catalog() -> GameCatalog {
        GameCatalog::new(vec![
            GameCatalogEntry::new("英雄联盟", ["MOBA"]),
            GameCatalogEntry::new("王者荣耀", ["MOBA"]),
            GameCatalogEntry::new("CSGO", ["FPS"]),
            GameCatalogEntry::new("原神", ["RPG"]),
        ])
        .unwrap()
    }

    fn create_candidate(id: &str, gender: &str, play_time: &str, games: &[&str]) -> Profile {
        Profile::builder(id)
            .games(games.iter().copied())
            .gender(gender)
            .gender_preference(["男"])
            .region("国服")
            .play_time(play_time)
            .experience("高级")
            .online_status("在线")
            .play_style("竞技")
            .build()
            .unwrap()
    }

    fn create_target(preference: &[&str]) -> Profile {
        Profile::builder("target")
            .games(["英雄联盟"])
            .gender("男")
            .gender_preference(preference.iter().copied())
            .region("国服")
            .play_time("晚上")
            .experience("高级")
            .online_status("在线")
            .play_style("竞技")
            .build()
            .unwrap()
    }

    fn ids<'a>(outcome: &MatchOutcome<'a>) -> Vec<&'a str> {
        outcome.matches.iter().map(|m| m.candidate.user_id()).collect()
    }

    #[test]
    fn test_excludes_target_from_pool() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&[]);
        let pool = vec![
            target.clone(),
            create_candidate("1", "女", "晚上", &["英雄联盟"]),
        ];

        let outcome = engine.find_matches(&target, &pool, &RankOptions::default());

        assert_eq!(outcome.total_candidates, 1);
        assert_eq!(ids(&outcome), vec!["1"]);
    }

    #[test]
    fn test_global_sort_without_preferences() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&[]);
        let pool = vec![
            create_candidate("far", "女", "早上", &["CSGO"]),
            create_candidate("close", "男", "晚上", &["英雄联盟"]),
            create_candidate("mid", "女", "下午", &["王者荣耀"]),
        ];

        let outcome = engine.find_matches(&target, &pool, &RankOptions::default());

        assert_eq!(ids(&outcome), vec!["close", "mid", "far"]);
        for pair in outcome.matches.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn test_preference_tiers_fill_in_order() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女", "男"]);
        let pool = vec![
            create_candidate("m_best", "男", "晚上", &["英雄联盟"]),
            create_candidate("f_low", "女", "早上", &["CSGO"]),
            create_candidate("f_high", "女", "晚上", &["王者荣耀"]),
            create_candidate("other", "其他", "晚上", &["英雄联盟"]),
        ];

        let options = RankOptions {
            top_n: 3,
            ..RankOptions::default()
        };
        let outcome = engine.find_matches(&target, &pool, &options);

        // women first even though the best-scoring candidate is a man
        assert_eq!(ids(&outcome), vec!["f_high", "f_low", "m_best"]);
    }

    #[test]
    fn test_first_tier_can_fill_quota() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女"]);
        let pool = vec![
            create_candidate("m", "男", "晚上", &["英雄联盟"]),
            create_candidate("f1", "女", "早上", &["CSGO"]),
            create_candidate("f2", "女", "晚上", &["王者荣耀"]),
        ];

        let options = RankOptions {
            top_n: 2,
            ..RankOptions::default()
        };
        let outcome = engine.find_matches(&target, &pool, &options);
        assert_eq!(ids(&outcome), vec!["f2", "f1"]);
    }

    #[test]
    fn test_unlisted_genders_are_excluded() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女"]);
        let pool = vec![
            create_candidate("m", "男", "晚上", &["英雄联盟"]),
            create_candidate("f", "女", "早上", &["CSGO"]),
            create_candidate("o", "其他", "晚上", &["英雄联盟"]),
        ];

        let outcome = engine.find_matches(&target, &pool, &RankOptions::default());
        assert_eq!(ids(&outcome), vec!["f"]);
        assert_eq!(outcome.total_candidates, 3);
        assert_eq!(outcome.scored, 3);
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&[]);
        let pool: Vec<Profile> = (0..5)
            .map(|i| create_candidate(&i.to_string(), "女", "晚上", &["英雄联盟"]))
            .collect();

        let outcome = engine.find_matches(&target, &pool, &RankOptions::default());
        assert_eq!(ids(&outcome), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_respects_limit() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女", "男"]);
        let pool: Vec<Profile> = (0..20)
            .map(|i| {
                let gender = if i % 2 == 0 { "女" } else { "男" };
                create_candidate(&i.to_string(), gender, "晚上", &["原神"])
            })
            .collect();

        for top_n in [0, 1, 5, 15, 50] {
            let options = RankOptions {
                top_n,
                ..RankOptions::default()
            };
            let outcome = engine.find_matches(&target, &pool, &options);
            assert_eq!(outcome.matches.len(), top_n.min(20));
        }
    }

    #[test]
    fn test_prefilter_requires_shared_game() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&[]);
        let pool = vec![
            create_candidate("lol", "女", "晚上", &["英雄联盟"]),
            create_candidate("similar", "女", "晚上", &["王者荣耀"]),
            create_candidate("unrelated", "女", "晚上", &["CSGO"]),
        ];

        let options = RankOptions {
            prefilter: true,
            ..RankOptions::default()
        };
        let outcome = engine.find_matches(&target, &pool, &options);

        assert_eq!(outcome.total_candidates, 3);
        assert_eq!(outcome.scored, 2);
        assert_eq!(ids(&outcome), vec!["lol", "similar"]);
        assert_eq!(outcome.recommended_games, vec![("王者荣耀".to_string(), 1.0)]);
    }

    #[test]
    fn test_parallel_scoring_matches_sequential() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女", "男"]);
        let times = ["凌晨", "早上", "中午", "下午", "晚上"];
        let games = ["英雄联盟", "王者荣耀", "CSGO", "原神"];
        let pool: Vec<Profile> = (0..300)
            .map(|i| {
                create_candidate(
                    &i.to_string(),
                    if i % 3 == 0 { "男" } else { "女" },
                    times[i % times.len()],
                    &[games[i % games.len()]],
                )
            })
            .collect();

        let sequential = RankOptions {
            top_n: 50,
            parallel_threshold: usize::MAX,
            ..RankOptions::default()
        };
        let parallel = RankOptions {
            parallel_threshold: 1,
            ..sequential
        };

        let a = engine.find_matches(&target, &pool, &sequential);
        let b = engine.find_matches(&target, &pool, &parallel);

        assert_eq!(ids(&a), ids(&b));
        for (x, y) in a.matches.iter().zip(b.matches.iter()) {
            assert_eq!(x.total_score.to_bits(), y.total_score.to_bits());
        }
    }

    #[test]
    fn test_find_matches_by_id() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let pool = vec![
            create_target(&["女"]),
            create_candidate("1", "女", "晚上", &["英雄联盟"]),
        ];

        let outcome = engine
            .find_matches_by_id("target", &pool, &RankOptions::default())
            .unwrap();
        assert_eq!(ids(&outcome), vec!["1"]);

        let missing = engine.find_matches_by_id("nobody", &pool, &RankOptions::default());
        assert!(matches!(missing, Err(EngineError::TargetNotFound(_))));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MatchEngine>();
    }

    #[test]
    fn test_empty_pool() {
        let engine = MatchEngine::with_reference_tables(catalog()).unwrap();
        let target = create_target(&["女"]);

        let pool: Vec<Profile> = Vec::new();

        let outcome = engine.find_matches(&target, &pool, &RankOptions::default());
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.total_candidates, 0);
    }
}
