use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use validator::Validate;

use crate::error::{EngineError, Result};

/// Player profile as supplied by the pool provider, before validation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileRecord {
    #[validate(length(min = 1))]
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub games: Vec<String>,
    pub gender: String,
    #[serde(rename = "genderPreference", alias = "gender_preference", default)]
    pub gender_preference: Vec<String>,
    pub region: String,
    #[serde(rename = "playTime", alias = "play_time")]
    pub play_time: String,
    pub mbti: String,
    pub zodiac: String,
    pub experience: String,
    #[serde(rename = "onlineStatus", alias = "online_status")]
    pub online_status: String,
    #[serde(rename = "playStyle", alias = "play_style")]
    pub play_style: String,
}

/// Validated, immutable player profile.
///
/// Equality and hashing use the identifier only.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    user_id: String,
    games: Vec<String>,
    gender: String,
    #[serde(rename = "genderPreference")]
    gender_preference: Vec<String>,
    region: String,
    #[serde(rename = "playTime")]
    play_time: String,
    mbti: String,
    zodiac: String,
    experience: String,
    #[serde(rename = "onlineStatus")]
    online_status: String,
    #[serde(rename = "playStyle")]
    play_style: String,
}

impl Profile {
    pub fn builder(user_id: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder::new(user_id)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Played games, duplicates removed
    pub fn games(&self) -> &[String] {
        &self.games
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    /// Preferred genders, most preferred first
    pub fn gender_preference(&self) -> &[String] {
        &self.gender_preference
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn play_time(&self) -> &str {
        &self.play_time
    }

    pub fn mbti(&self) -> &str {
        &self.mbti
    }

    pub fn zodiac(&self) -> &str {
        &self.zodiac
    }

    pub fn experience(&self) -> &str {
        &self.experience
    }

    pub fn online_status(&self) -> &str {
        &self.online_status
    }

    pub fn play_style(&self) -> &str {
        &self.play_style
    }

    /// Rank of `gender` in this profile's preference list (0 = most preferred)
    pub fn preference_rank(&self, gender: &str) -> Option<usize> {
        self.gender_preference.iter().position(|g| g == gender)
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_id.hash(state);
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = EngineError;

    fn try_from(record: ProfileRecord) -> Result<Self> {
        record.validate()?;

        Ok(Self {
            user_id: record.user_id,
            games: dedup_preserving_order(record.games),
            gender: record.gender,
            gender_preference: dedup_preserving_order(record.gender_preference),
            region: record.region,
            play_time: record.play_time,
            mbti: record.mbti,
            zodiac: record.zodiac,
            experience: record.experience,
            online_status: record.online_status,
            play_style: record.play_style,
        })
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Builder for [`Profile`]; unset categorical fields stay empty strings
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    record: ProfileRecord,
}

impl ProfileBuilder {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            record: ProfileRecord {
                user_id: user_id.into(),
                games: Vec::new(),
                gender: String::new(),
                gender_preference: Vec::new(),
                region: String::new(),
                play_time: String::new(),
                mbti: String::new(),
                zodiac: String::new(),
                experience: String::new(),
                online_status: String::new(),
                play_style: String::new(),
            },
        }
    }

    pub fn games<I, S>(mut self, games: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.games = games.into_iter().map(Into::into).collect();
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.record.gender = gender.into();
        self
    }

    pub fn gender_preference<I, S>(mut self, preference: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.gender_preference = preference.into_iter().map(Into::into).collect();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.record.region = region.into();
        self
    }

    pub fn play_time(mut self, play_time: impl Into<String>) -> Self {
        self.record.play_time = play_time.into();
        self
    }

    pub fn mbti(mut self, mbti: impl Into<String>) -> Self {
        self.record.mbti = mbti.into();
        self
    }

    pub fn zodiac(mut self, zodiac: impl Into<String>) -> Self {
        self.record.zodiac = zodiac.into();
        self
    }

    pub fn experience(mut self, experience: impl Into<String>) -> Self {
        self.record.experience = experience.into();
        self
    }

    pub fn online_status(mut self, online_status: impl Into<String>) -> Self {
        self.record.online_status = online_status.into();
        self
    }

    pub fn play_style(mut self, play_style: impl Into<String>) -> Self {
        self.record.play_style = play_style.into();
        self
    }

    pub fn build(self) -> Result<Profile> {
        Profile::try_from(self.record)
    }
}

/// Game catalog entry; platforms and tags are informational only
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GameCatalogEntry {
    #[validate(length(min = 1))]
    #[serde(rename = "gameId", alias = "name")]
    pub game_id: String,
    #[validate(length(min = 1))]
    pub types: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GameCatalogEntry {
    pub fn new<I, S>(game_id: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            game_id: game_id.into(),
            types: types.into_iter().map(Into::into).collect(),
            platforms: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Game catalog indexed by game id
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    entries: Vec<GameCatalogEntry>,
    index: HashMap<String, usize>,
}

impl GameCatalog {
    /// Build a catalog, validating every entry. A repeated id replaces the
    /// earlier entry in place.
    pub fn new(entries: Vec<GameCatalogEntry>) -> Result<Self> {
        let mut catalog = Self::default();

        for entry in entries {
            entry
                .validate()
                .map_err(|e| EngineError::InvalidCatalogEntry {
                    game_id: entry.game_id.clone(),
                    message: e.to_string(),
                })?;

            match catalog.index.get(&entry.game_id) {
                Some(&pos) => {
                    tracing::warn!(
                        "Duplicate catalog entry for game {}, keeping the last one",
                        entry.game_id
                    );
                    catalog.entries[pos] = entry;
                }
                None => {
                    catalog.index.insert(entry.game_id.clone(), catalog.entries.len());
                    catalog.entries.push(entry);
                }
            }
        }

        Ok(catalog)
    }

    pub fn get(&self, game_id: &str) -> Option<&GameCatalogEntry> {
        self.index.get(game_id).map(|&pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[GameCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of type tags over the given games. Unknown games contribute nothing.
    pub fn type_set<'a, I>(&self, games: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut types = BTreeSet::new();
        for game in games {
            match self.get(game) {
                Some(entry) => types.extend(entry.types.iter().cloned()),
                None => tracing::trace!("Game {} not in catalog, no types resolved", game),
            }
        }
        types
    }
}

/// One scored aspect of compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    OnlineStatus,
    Server,
    Time,
    Experience,
    Style,
    Mbti,
    Zodiac,
    Gender,
    GameType,
    GamePreference,
    GameSocial,
    /// Sub-weighted combination of the three game scores
    Game,
}

impl Dimension {
    /// Aggregation order
    pub const ALL: [Dimension; 12] = [
        Dimension::OnlineStatus,
        Dimension::Server,
        Dimension::Time,
        Dimension::Experience,
        Dimension::Style,
        Dimension::Mbti,
        Dimension::Zodiac,
        Dimension::Gender,
        Dimension::GameType,
        Dimension::GamePreference,
        Dimension::GameSocial,
        Dimension::Game,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::OnlineStatus => "online_status",
            Dimension::Server => "server",
            Dimension::Time => "time",
            Dimension::Experience => "experience",
            Dimension::Style => "style",
            Dimension::Mbti => "mbti",
            Dimension::Zodiac => "zodiac",
            Dimension::Gender => "gender",
            Dimension::GameType => "game_type",
            Dimension::GamePreference => "game_preference",
            Dimension::GameSocial => "game_social",
            Dimension::Game => "game",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown dimension: {}", s))
    }
}

/// Score of one dimension for one (target, candidate) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Raw comparator output in [0, 1]
    pub score: f64,
    /// Configured weight
    pub weight: f64,
    /// `score * weight / total_weight`; contributions sum to the total score
    pub contribution: f64,
}

/// Qualitative label for a [0, 1] score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
    None,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ScoreBand::Excellent
        } else if score >= 0.6 {
            ScoreBand::Good
        } else if score >= 0.4 {
            ScoreBand::Fair
        } else if score >= 0.2 {
            ScoreBand::Poor
        } else {
            ScoreBand::None
        }
    }
}

/// Per-dimension explanation line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Explanation {
    pub dimension: Dimension,
    pub score: f64,
    pub band: ScoreBand,
}

/// Scored candidate
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'a> {
    pub candidate: &'a Profile,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    pub breakdown: Vec<DimensionScore>,
}

impl<'a> MatchResult<'a> {
    pub fn score_of(&self, dimension: Dimension) -> Option<f64> {
        self.breakdown
            .iter()
            .find(|d| d.dimension == dimension)
            .map(|d| d.score)
    }

    pub fn contribution_of(&self, dimension: Dimension) -> Option<f64> {
        self.breakdown
            .iter()
            .find(|d| d.dimension == dimension)
            .map(|d| d.contribution)
    }

    /// Dimensions ordered by raw score, highest first
    pub fn explain(&self) -> Vec<Explanation> {
        let mut lines: Vec<Explanation> = self
            .breakdown
            .iter()
            .map(|d| Explanation {
                dimension: d.dimension,
                score: d.score,
                band: ScoreBand::from_score(d.score),
            })
            .collect();

        lines.sort_by(|a, b| b.score.total_cmp(&a.score));
        lines
    }
}
