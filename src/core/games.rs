use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::ordinal::OrdinalComparator;
use crate::core::Comparator;
use crate::models::{
    GameCatalog, GameWeights, OrdinalScale, Profile, SimilarityMatrix, SocialWeights,
};

/// Jaccard index `|a ∩ b| / |a ∪ b|`; 0.0 when the union is empty
#[inline]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Sub-scores of the game comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameSimilarity {
    pub type_similarity: f64,
    pub preference_similarity: f64,
    pub social_similarity: f64,
    /// Sub-weighted combination of the three scores
    pub combined: f64,
}

/// Set-based game compatibility comparator
#[derive(Debug, Clone)]
pub struct GameComparator {
    catalog: GameCatalog,
    correlations: SimilarityMatrix,
    default_correlation: f64,
    weights: GameWeights,
    social: SocialWeights,
    experience: OrdinalComparator,
}

impl GameComparator {
    pub fn new(
        catalog: GameCatalog,
        correlations: SimilarityMatrix,
        default_correlation: f64,
        weights: GameWeights,
        social: SocialWeights,
        experience: OrdinalScale,
    ) -> Self {
        Self {
            catalog,
            correlations,
            default_correlation,
            weights,
            social,
            experience: OrdinalComparator::new(experience),
        }
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    /// Correlation between two type tags, looked up in either direction
    pub fn correlation(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }

        let forward = self.correlations.get(a).and_then(|row| row.get(b)).copied();
        let backward = self.correlations.get(b).and_then(|row| row.get(a)).copied();

        match (forward, backward) {
            (Some(x), Some(y)) => (x + y) / 2.0,
            (Some(x), None) | (None, Some(x)) => x,
            (None, None) => self.default_correlation,
        }
    }

    /// Mean pairwise correlation between two type sets; 0.0 if either is empty
    pub fn type_similarity(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for type_a in a {
            for type_b in b {
                total += self.correlation(type_a, type_b);
            }
        }

        total / (a.len() * b.len()) as f64
    }

    /// Jaccard index of the played-game sets
    pub fn preference_similarity(&self, source: &Profile, target: &Profile) -> f64 {
        let a: BTreeSet<&String> = source.games().iter().collect();
        let b: BTreeSet<&String> = target.games().iter().collect();
        jaccard(&a, &b)
    }

    /// Blend of online-status match, play-style match and experience distance
    pub fn social_similarity(&self, source: &Profile, target: &Profile) -> f64 {
        let indicator = |same: bool| if same { 1.0 } else { self.social.mismatch_score };
        let online = indicator(source.online_status() == target.online_status());
        let style = indicator(source.play_style() == target.play_style());
        let experience = self
            .experience
            .compare(source.experience(), target.experience());

        weighted_mean(&[
            (online, self.social.online_status),
            (style, self.social.play_style),
            (experience, self.social.experience),
        ])
    }

    pub fn similarity(&self, source: &Profile, target: &Profile) -> GameSimilarity {
        let source_types = self.catalog.type_set(source.games());
        let target_types = self.catalog.type_set(target.games());

        let type_similarity = self.type_similarity(&source_types, &target_types);
        let preference_similarity = self.preference_similarity(source, target);
        let social_similarity = self.social_similarity(source, target);

        let combined = weighted_mean(&[
            (type_similarity, self.weights.type_similarity),
            (preference_similarity, self.weights.preference_similarity),
            (social_similarity, self.weights.social_similarity),
        ]);

        GameSimilarity {
            type_similarity,
            preference_similarity,
            social_similarity,
            combined,
        }
    }
}

impl Comparator for GameComparator {
    type Value = Profile;

    fn compare(&self, source: &Profile, target: &Profile) -> f64 {
        self.similarity(source, target).combined
    }
}

fn weighted_mean(parts: &[(f64, f64)]) -> f64 {
    let weight: f64 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
    if weight <= 0.0 {
        return 0.0;
    }

    let total: f64 = parts.iter().map(|(score, w)| score * w.max(0.0)).sum();
    (total / weight).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfigTables, GameCatalogEntry};

    fn catalog() -> GameCatalog {
        GameCatalog::new(vec![
            GameCatalogEntry::new("英雄联盟", ["MOBA"]),
            GameCatalogEntry::new("王者荣耀", ["MOBA"]),
            GameCatalogEntry::new("星际争霸", ["RTS"]),
            GameCatalogEntry::new("CSGO", ["FPS"]),
            GameCatalogEntry::new("原神", ["RPG"]),
        ])
        .unwrap()
    }

    fn comparator() -> GameComparator {
        let tables = ConfigTables::reference();
        GameComparator::new(
            catalog(),
            tables.type_correlations,
            tables.default_type_correlation,
            tables.game,
            tables.social,
            tables.experience,
        )
    }

    fn player(id: &str, games: &[&str], experience: &str) -> Profile {
        Profile::builder(id)
            .games(games.iter().copied())
            .experience(experience)
            .online_status("在线")
            .play_style("竞技")
            .build()
            .unwrap()
    }

    fn types(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<i32> = [1, 2, 3].into_iter().collect();
        let b: BTreeSet<i32> = [2, 3, 4].into_iter().collect();
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::<i32>::new(), &BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_type_similarity_averages_pairs() {
        let comparator = comparator();
        let score = comparator.type_similarity(&types(&["MOBA"]), &types(&["MOBA", "RPG"]));
        assert!((score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_type_similarity_is_symmetric() {
        let comparator = comparator();
        let a = types(&["MOBA", "CASUAL"]);
        let b = types(&["RTS", "RPG", "SANDBOX"]);
        let forward = comparator.type_similarity(&a, &b);
        let backward = comparator.type_similarity(&b, &a);
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn test_unlisted_pair_uses_default_correlation() {
        let comparator = comparator();
        assert_eq!(comparator.correlation("MOBA", "SANDBOX"), 0.1);
        assert_eq!(comparator.correlation("SANDBOX", "SANDBOX"), 1.0);
    }

    #[test]
    fn test_one_directional_entry_is_symmetric() {
        let mut correlations = SimilarityMatrix::new();
        correlations
            .entry("MOBA".to_string())
            .or_default()
            .insert("ARPG".to_string(), 0.5);
        let comparator = GameComparator::new(
            catalog(),
            correlations,
            0.1,
            GameWeights::default(),
            SocialWeights::default(),
            OrdinalScale::default(),
        );

        assert_eq!(comparator.correlation("MOBA", "ARPG"), 0.5);
        assert_eq!(comparator.correlation("ARPG", "MOBA"), 0.5);
    }

    #[test]
    fn test_empty_games_score_zero() {
        let comparator = comparator();
        let empty = player("e", &[], "初级");
        let other = player("o", &["英雄联盟", "王者荣耀"], "高级");

        let similarity = comparator.similarity(&other, &empty);
        assert_eq!(similarity.type_similarity, 0.0);
        assert_eq!(similarity.preference_similarity, 0.0);
    }

    #[test]
    fn test_unknown_games_degrade_to_empty_types() {
        let comparator = comparator();
        let a = player("a", &["不存在的游戏"], "高级");
        let b = player("b", &["不存在的游戏"], "高级");

        let similarity = comparator.similarity(&a, &b);
        assert_eq!(similarity.type_similarity, 0.0);
        assert_eq!(similarity.preference_similarity, 1.0);
    }

    #[test]
    fn test_social_similarity() {
        let comparator = comparator();
        let a = player("a", &["CSGO"], "高级");
        let b = player("b", &["CSGO"], "中级");

        // online 1.0 * 0.3 + style 1.0 * 0.3 + experience 0.7 * 0.4
        assert!((comparator.social_similarity(&a, &b) - 0.88).abs() < 1e-12);
    }

    #[test]
    fn test_combined_score() {
        let comparator = comparator();
        let a = player("a", &["英雄联盟", "王者荣耀"], "高级");
        let b = player("b", &["王者荣耀", "原神"], "高级");

        let similarity = comparator.similarity(&a, &b);
        assert!((similarity.type_similarity - 0.7).abs() < 1e-12);
        assert!((similarity.preference_similarity - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(similarity.social_similarity, 1.0);

        let expected = 0.7 * 0.4 + (1.0 / 3.0) * 0.4 + 1.0 * 0.2;
        assert!((similarity.combined - expected).abs() < 1e-12);
        assert_eq!(comparator.compare(&a, &b), similarity.combined);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let comparator = comparator();
        let players = [
            player("a", &["英雄联盟"], "初级"),
            player("b", &["CSGO", "原神", "星际争霸"], "高超"),
            player("c", &[], "宗师"),
        ];

        for a in &players {
            for b in &players {
                let s = comparator.similarity(a, b);
                let values = [
                    s.type_similarity,
                    s.preference_similarity,
                    s.social_similarity,
                    s.combined,
                ];
                for value in values {
                    assert!((0.0..=1.0).contains(&value));
                }
            }
        }
    }
}
