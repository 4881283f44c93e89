use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::models::domain::{Dimension, Profile};

/// Nested lookup keyed by categorical value pairs
pub type SimilarityMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Directional preference table: `rows[source][target]` on a 0..=scale range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceTable {
    pub rows: SimilarityMatrix,
}

impl PreferenceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn raw(&self, source: &str, target: &str) -> Option<f64> {
        self.rows.get(source).and_then(|row| row.get(target)).copied()
    }

    pub fn has_row(&self, source: &str) -> bool {
        self.rows.contains_key(source)
    }
}

/// Scores for an exact-match dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryScores {
    #[serde(default = "default_matched")]
    pub matched: f64,
    #[serde(default)]
    pub unmatched: f64,
}

impl BinaryScores {
    pub fn new(matched: f64, unmatched: f64) -> Self {
        Self { matched, unmatched }
    }
}

impl Default for BinaryScores {
    fn default() -> Self {
        Self::new(default_matched(), 0.0)
    }
}

/// Three-tier region rule over a static partition of regions into groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTiers {
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_matched")]
    pub exact: f64,
    #[serde(default = "default_same_group")]
    pub same_group: f64,
    #[serde(default = "default_cross_group")]
    pub cross_group: f64,
}

impl Default for RegionTiers {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            exact: default_matched(),
            same_group: default_same_group(),
            cross_group: default_cross_group(),
        }
    }
}

impl RegionTiers {
    /// Name of the group containing `region`, if any
    pub fn group_of(&self, region: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == region))
            .map(|(name, _)| name.as_str())
    }
}

/// Totally ordered categorical domain with a distance→score lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalScale {
    #[serde(default)]
    pub values: Vec<String>,
    /// Distance is measured around a cycle instead of along a line
    #[serde(default)]
    pub wraps: bool,
    /// Index = step distance; distances past the end use the last entry
    #[serde(default = "default_distance_scores")]
    pub distance_scores: Vec<f64>,
}

impl Default for OrdinalScale {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            wraps: false,
            distance_scores: default_distance_scores(),
        }
    }
}

impl OrdinalScale {
    pub fn new<I, S>(values: I, wraps: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            wraps,
            distance_scores: default_distance_scores(),
        }
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.position(value).is_some()
    }
}

/// How rank positions turn into decay exponents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDecay {
    /// `decay^position`: first place weighs 1.0
    #[default]
    FromTop,
    /// `decay^(len - 1 - position)`: last place weighs 1.0
    FromBottom,
}

/// Gender preference scoring policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenderPolicy {
    #[serde(default = "default_decay")]
    pub decay: f64,
    #[serde(default)]
    pub rank_decay: RankDecay,
    /// Score when a list is empty or a gender is not listed
    #[serde(default = "default_unmatched_gender")]
    pub unmatched_score: f64,
    /// Ceiling applied when either side is not the other's first choice
    #[serde(default = "default_non_top_cap")]
    pub non_top_cap: f64,
}

impl Default for GenderPolicy {
    fn default() -> Self {
        Self {
            decay: default_decay(),
            rank_decay: RankDecay::default(),
            unmatched_score: default_unmatched_gender(),
            non_top_cap: default_non_top_cap(),
        }
    }
}

/// Sub-weights of the combined game score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameWeights {
    #[serde(default = "default_type_weight")]
    pub type_similarity: f64,
    #[serde(default = "default_preference_weight")]
    pub preference_similarity: f64,
    #[serde(default = "default_social_weight")]
    pub social_similarity: f64,
}

impl Default for GameWeights {
    fn default() -> Self {
        Self {
            type_similarity: default_type_weight(),
            preference_similarity: default_preference_weight(),
            social_similarity: default_social_weight(),
        }
    }
}

/// Sub-weights of the social game score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocialWeights {
    #[serde(default = "default_social_online")]
    pub online_status: f64,
    #[serde(default = "default_social_style")]
    pub play_style: f64,
    #[serde(default = "default_social_experience")]
    pub experience: f64,
    /// Partial credit for a differing online status or play style
    #[serde(default = "default_social_mismatch")]
    pub mismatch_score: f64,
}

impl Default for SocialWeights {
    fn default() -> Self {
        Self {
            online_status: default_social_online(),
            play_style: default_social_style(),
            experience: default_social_experience(),
            mismatch_score: default_social_mismatch(),
        }
    }
}

/// Immutable lookup tables parameterizing every comparator.
///
/// Deserializing a partial document is always possible: absent maps become
/// empty and absent scalars take their documented defaults, so the engine runs
/// in degraded mode instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigTables {
    /// Dimension name → non-negative weight
    pub weights: BTreeMap<String, f64>,
    pub type_correlations: SimilarityMatrix,
    pub default_type_correlation: f64,
    pub region: RegionTiers,
    pub time: OrdinalScale,
    pub experience: OrdinalScale,
    pub online_status: BinaryScores,
    pub play_style: BinaryScores,
    pub mbti: PreferenceTable,
    pub zodiac: PreferenceTable,
    /// Upper end of the raw preference-table range
    pub preference_scale: f64,
    pub gender: GenderPolicy,
    pub game: GameWeights,
    pub social: SocialWeights,
}

impl Default for ConfigTables {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            type_correlations: BTreeMap::new(),
            default_type_correlation: 0.1,
            region: RegionTiers::default(),
            time: OrdinalScale {
                wraps: true,
                ..OrdinalScale::default()
            },
            experience: OrdinalScale::default(),
            online_status: BinaryScores::default(),
            play_style: BinaryScores::new(1.0, 0.3),
            mbti: PreferenceTable::default(),
            zodiac: PreferenceTable::default(),
            preference_scale: 10.0,
            gender: GenderPolicy::default(),
            game: GameWeights::default(),
            social: SocialWeights::default(),
        }
    }
}

impl ConfigTables {
    /// Built-in reference tables: weights, type correlations, server groups,
    /// time slots and experience levels. MBTI and zodiac tables are left empty
    /// and are expected from the pool provider.
    pub fn reference() -> Self {
        let weights = [
            ("online_status", 5.0),
            ("server", 10.0),
            ("time", 15.0),
            ("experience", 10.0),
            ("style", 10.0),
            ("mbti", 10.0),
            ("zodiac", 5.0),
            ("gender", 10.0),
            ("game_type", 10.0),
            ("game_preference", 10.0),
            ("game_social", 5.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let types = ["MOBA", "RTS", "FPS", "RPG", "CASUAL"];
        let correlations: [[f64; 5]; 5] = [
            [1.0, 0.8, 0.6, 0.4, 0.2],
            [0.8, 1.0, 0.6, 0.4, 0.2],
            [0.6, 0.6, 1.0, 0.4, 0.2],
            [0.4, 0.4, 0.4, 1.0, 0.6],
            [0.2, 0.2, 0.2, 0.6, 1.0],
        ];
        let type_correlations = types
            .iter()
            .zip(correlations.iter())
            .map(|(row_type, row)| {
                let cells = types
                    .iter()
                    .zip(row.iter())
                    .map(|(col_type, value)| (col_type.to_string(), *value))
                    .collect();
                (row_type.to_string(), cells)
            })
            .collect();

        let mut groups = BTreeMap::new();
        groups.insert("asia".to_string(), vec!["国服".to_string(), "亚服".to_string()]);
        groups.insert("western".to_string(), vec!["美服".to_string(), "欧服".to_string()]);

        Self {
            weights,
            type_correlations,
            region: RegionTiers {
                groups,
                ..RegionTiers::default()
            },
            time: OrdinalScale::new(["凌晨", "早上", "中午", "下午", "晚上"], true),
            experience: OrdinalScale::new(["初级", "中级", "高级", "高超"], false),
            ..Self::default()
        }
    }

    /// Parse tables from a TOML document
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Weight configured for a dimension; unlisted dimensions weigh 0
    pub fn weight(&self, dimension: Dimension) -> f64 {
        self.weights.get(dimension.as_str()).copied().unwrap_or(0.0)
    }

    /// Check the structural constraints the comparators rely on
    pub fn validate(&self) -> Result<()> {
        for (dimension, &weight) in &self.weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidWeight {
                    dimension: dimension.clone(),
                    weight,
                });
            }
        }

        if !self.gender.decay.is_finite() || self.gender.decay <= 0.0 {
            return Err(EngineError::InvalidDecay(self.gender.decay));
        }

        for (row, cells) in &self.type_correlations {
            for (column, &value) in cells {
                check_unit("type_correlations", &format!("{}/{}", row, column), value)?;
            }
        }

        check_unit("default_type_correlation", "-", self.default_type_correlation)?;
        for (i, &value) in self.time.distance_scores.iter().enumerate() {
            check_unit("time.distance_scores", &i.to_string(), value)?;
        }
        for (i, &value) in self.experience.distance_scores.iter().enumerate() {
            check_unit("experience.distance_scores", &i.to_string(), value)?;
        }

        let scalars = [
            ("region.exact", self.region.exact),
            ("region.same_group", self.region.same_group),
            ("region.cross_group", self.region.cross_group),
            ("online_status.matched", self.online_status.matched),
            ("online_status.unmatched", self.online_status.unmatched),
            ("play_style.matched", self.play_style.matched),
            ("play_style.unmatched", self.play_style.unmatched),
            ("gender.unmatched_score", self.gender.unmatched_score),
            ("gender.non_top_cap", self.gender.non_top_cap),
            ("social.mismatch_score", self.social.mismatch_score),
        ];
        for (table, value) in scalars {
            check_unit(table, "-", value)?;
        }

        Ok(())
    }

    /// Categorical values of `profile` that fall outside the configured
    /// domains, as `(field, value)` pairs. Empty domains are not checked.
    pub fn unknown_values<'p>(&self, profile: &'p Profile) -> Vec<(&'static str, &'p str)> {
        let mut unknown = Vec::new();

        if !self.region.groups.is_empty() && self.region.group_of(profile.region()).is_none() {
            unknown.push(("region", profile.region()));
        }
        if !self.time.values.is_empty() && !self.time.contains(profile.play_time()) {
            unknown.push(("play_time", profile.play_time()));
        }
        if !self.experience.values.is_empty() && !self.experience.contains(profile.experience()) {
            unknown.push(("experience", profile.experience()));
        }
        if !self.mbti.is_empty() && !self.mbti.has_row(profile.mbti()) {
            unknown.push(("mbti", profile.mbti()));
        }
        if !self.zodiac.is_empty() && !self.zodiac.has_row(profile.zodiac()) {
            unknown.push(("zodiac", profile.zodiac()));
        }

        unknown
    }
}

fn check_unit(table: &str, key: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::TableOutOfRange {
            table: table.to_string(),
            key: key.to_string(),
            value,
        })
    }
}

fn default_matched() -> f64 { 1.0 }
fn default_same_group() -> f64 { 0.7 }
fn default_cross_group() -> f64 { 0.3 }
fn default_distance_scores() -> Vec<f64> { vec![1.0, 0.7, 0.3] }
fn default_decay() -> f64 { 0.7 }
fn default_unmatched_gender() -> f64 { 0.2 }
fn default_non_top_cap() -> f64 { 0.7 }
fn default_type_weight() -> f64 { 0.4 }
fn default_preference_weight() -> f64 { 0.4 }
fn default_social_weight() -> f64 { 0.2 }
fn default_social_online() -> f64 { 0.3 }
fn default_social_style() -> f64 { 0.3 }
fn default_social_experience() -> f64 { 0.4 }
fn default_social_mismatch() -> f64 { 0.5 }
