use crate::core::{
    binary::{BinaryComparator, RegionComparator},
    games::{GameComparator, GameSimilarity},
    gender::GenderComparator,
    ordinal::OrdinalComparator,
    preference::PreferenceComparator,
    Comparator,
};
use crate::error::Result;
use crate::models::{ConfigTables, Dimension, DimensionScore, GameCatalog, MatchResult, Profile};

/// Weighted combination of every dimension comparator.
///
/// Scoring formula:
/// total = Σ(score_i * weight_i) / Σ(weight_i)
///
/// over the known dimensions with a positive configured weight, in
/// [`Dimension::ALL`] order. Each dimension's contribution is its normalized
/// share `score_i * weight_i / Σ(weight_i)`, so contributions add up to the
/// total (up to floating-point rounding).
#[derive(Debug, Clone)]
pub struct Aggregator {
    active: Vec<(Dimension, f64)>,
    total_weight: f64,
    online_status: BinaryComparator,
    server: RegionComparator,
    time: OrdinalComparator,
    experience: OrdinalComparator,
    style: BinaryComparator,
    mbti: PreferenceComparator,
    zodiac: PreferenceComparator,
    gender: GenderComparator,
    games: GameComparator,
}

impl Aggregator {
    pub fn new(tables: ConfigTables, catalog: GameCatalog) -> Result<Self> {
        tables.validate()?;

        for name in tables.weights.keys() {
            if name.parse::<Dimension>().is_err() {
                tracing::warn!("Ignoring weight for unknown dimension: {}", name);
            }
        }

        let active: Vec<(Dimension, f64)> = Dimension::ALL
            .iter()
            .map(|&d| (d, tables.weight(d)))
            .filter(|&(_, w)| w > 0.0)
            .collect();
        let total_weight = active.iter().map(|(_, w)| w).sum();

        if active.is_empty() {
            tracing::warn!("No dimension has a positive weight, every total will be 0");
        }

        Ok(Self {
            active,
            total_weight,
            online_status: BinaryComparator::new(tables.online_status),
            server: RegionComparator::new(tables.region),
            time: OrdinalComparator::new(tables.time),
            experience: OrdinalComparator::new(tables.experience.clone()),
            style: BinaryComparator::new(tables.play_style),
            mbti: PreferenceComparator::new(tables.mbti, tables.preference_scale),
            zodiac: PreferenceComparator::new(tables.zodiac, tables.preference_scale),
            gender: GenderComparator::new(tables.gender),
            games: GameComparator::new(
                catalog,
                tables.type_correlations,
                tables.default_type_correlation,
                tables.game,
                tables.social,
                tables.experience,
            ),
        })
    }

    pub fn games(&self) -> &GameComparator {
        &self.games
    }

    /// Dimensions that take part in the total, with their weights
    pub fn active_dimensions(&self) -> &[(Dimension, f64)] {
        &self.active
    }

    fn needs_games(&self) -> bool {
        self.active.iter().any(|(d, _)| {
            matches!(
                d,
                Dimension::GameType
                    | Dimension::GamePreference
                    | Dimension::GameSocial
                    | Dimension::Game
            )
        })
    }

    /// Raw comparator output for one dimension
    fn dimension_score(
        &self,
        dimension: Dimension,
        source: &Profile,
        target: &Profile,
        games: Option<&GameSimilarity>,
    ) -> f64 {
        match dimension {
            Dimension::OnlineStatus => self
                .online_status
                .compare(source.online_status(), target.online_status()),
            Dimension::Server => self.server.compare(source.region(), target.region()),
            Dimension::Time => self.time.compare(source.play_time(), target.play_time()),
            Dimension::Experience => self
                .experience
                .compare(source.experience(), target.experience()),
            Dimension::Style => self.style.compare(source.play_style(), target.play_style()),
            Dimension::Mbti => self.mbti.compare(source.mbti(), target.mbti()),
            Dimension::Zodiac => self.zodiac.compare(source.zodiac(), target.zodiac()),
            Dimension::Gender => self.gender.compare(source, target),
            Dimension::GameType => games.map_or(0.0, |g| g.type_similarity),
            Dimension::GamePreference => games.map_or(0.0, |g| g.preference_similarity),
            Dimension::GameSocial => games.map_or(0.0, |g| g.social_similarity),
            Dimension::Game => games.map_or(0.0, |g| g.combined),
        }
    }

    /// Score `target` from the point of view of `source`
    pub fn score<'a>(&self, source: &Profile, target: &'a Profile) -> MatchResult<'a> {
        let games = self
            .needs_games()
            .then(|| self.games.similarity(source, target));

        let breakdown: Vec<DimensionScore> = self
            .active
            .iter()
            .map(|&(dimension, weight)| {
                let score = self
                    .dimension_score(dimension, source, target, games.as_ref())
                    .clamp(0.0, 1.0);
                DimensionScore {
                    dimension,
                    score,
                    weight,
                    contribution: score * weight / self.total_weight,
                }
            })
            .collect();

        let total_score = breakdown
            .iter()
            .map(|d| d.contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        tracing::trace!(
            "Scored {} -> {}: {:.4}",
            source.user_id(),
            target.user_id(),
            total_score
        );

        MatchResult {
            candidate: target,
            total_score,
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameCatalogEntry;
    use std::collections::BTreeMap;

    fn catalog() -> GameCatalog {
        GameCatalog::new(vec![
            GameCatalogEntry::new("英雄联盟", ["MOBA"]),
            GameCatalogEntry::new("王者荣耀", ["MOBA"]),
            GameCatalogEntry::new("原神", ["RPG"]),
        ])
        .unwrap()
    }

    fn profile(id: &str, online: &str, games: &[&str]) -> Profile {
        Profile::builder(id)
            .games(games.iter().copied())
            .gender("男")
            .gender_preference(["女"])
            .region("国服")
            .play_time("晚上")
            .mbti("INTJ")
            .zodiac("天蝎座")
            .experience("高级")
            .online_status(online)
            .play_style("竞技")
            .build()
            .unwrap()
    }

    fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_total_is_normalized_weighted_mean() {
        let mut tables = ConfigTables::reference();
        tables.weights = weights(&[("online_status", 1.0), ("time", 3.0)]);
        let aggregator = Aggregator::new(tables, catalog()).unwrap();

        let a = profile("a", "在线", &["英雄联盟"]);
        let b = profile("b", "离线", &["英雄联盟"]);
        let result = aggregator.score(&a, &b);

        assert!((result.total_score - 0.75).abs() < 1e-12);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.contribution_of(Dimension::OnlineStatus), Some(0.0));
        assert!((result.contribution_of(Dimension::Time).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_contributions_sum_to_total() {
        let aggregator = Aggregator::new(ConfigTables::reference(), catalog()).unwrap();
        let a = profile("a", "在线", &["英雄联盟", "王者荣耀"]);
        let b = profile("b", "离线", &["王者荣耀", "原神"]);
        let result = aggregator.score(&a, &b);

        let sum: f64 = result.breakdown.iter().map(|d| d.contribution).sum();
        assert!((sum - result.total_score).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_dimensions_are_skipped() {
        let mut tables = ConfigTables::reference();
        tables.weights = weights(&[("time", 1.0), ("mbti", 0.0), ("platform", 5.0)]);
        let aggregator = Aggregator::new(tables, catalog()).unwrap();

        assert_eq!(aggregator.active_dimensions(), &[(Dimension::Time, 1.0)]);

        let a = profile("a", "在线", &[]);
        let b = profile("b", "在线", &[]);
        let result = aggregator.score(&a, &b);
        assert_eq!(result.total_score, 1.0);
        assert_eq!(result.score_of(Dimension::Mbti), None);
    }

    #[test]
    fn test_no_weights_scores_zero() {
        let aggregator = Aggregator::new(ConfigTables::default(), catalog()).unwrap();
        let a = profile("a", "在线", &["英雄联盟"]);
        let b = profile("b", "在线", &["英雄联盟"]);
        let result = aggregator.score(&a, &b);

        assert_eq!(result.total_score, 0.0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_combined_game_dimension() {
        let mut tables = ConfigTables::reference();
        tables.weights = weights(&[("game", 1.0)]);
        let aggregator = Aggregator::new(tables, catalog()).unwrap();

        let a = profile("a", "在线", &["英雄联盟"]);
        let b = profile("b", "在线", &["英雄联盟"]);
        let result = aggregator.score(&a, &b);

        assert!((result.total_score - 1.0).abs() < 1e-12);
        assert_eq!(
            result.score_of(Dimension::Game),
            Some(aggregator.games().compare(&a, &b))
        );
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        let mut tables = ConfigTables::reference();
        tables.weights.insert("server".to_string(), f64::NAN);
        assert!(Aggregator::new(tables, catalog()).is_err());
    }
}
