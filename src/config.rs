use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::RankOptions;
use crate::models::ConfigTables;
use crate::services::LoadError;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Location of the JSON pool files
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_profiles_file")]
    pub profiles: String,
    #[serde(default = "default_games_file")]
    pub games: String,
    #[serde(default = "default_mbti_file")]
    pub mbti: String,
    #[serde(default = "default_zodiac_file")]
    pub zodiac: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            profiles: default_profiles_file(),
            games: default_games_file(),
            mbti: default_mbti_file(),
            zodiac: default_zodiac_file(),
        }
    }
}

impl DataSettings {
    pub fn profiles_path(&self) -> PathBuf {
        self.dir.join(&self.profiles)
    }

    pub fn games_path(&self) -> PathBuf {
        self.dir.join(&self.games)
    }

    pub fn mbti_path(&self) -> PathBuf {
        self.dir.join(&self.mbti)
    }

    pub fn zodiac_path(&self) -> PathBuf {
        self.dir.join(&self.zodiac)
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_profiles_file() -> String { "profiles.json".to_string() }
fn default_games_file() -> String { "games.json".to_string() }
fn default_mbti_file() -> String { "mbti.json".to_string() }
fn default_zodiac_file() -> String { "zodiac.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub prefilter: bool,
    #[serde(default = "default_similar_game_threshold")]
    pub similar_game_threshold: f64,
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            prefilter: false,
            similar_game_threshold: default_similar_game_threshold(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl From<&RankingSettings> for RankOptions {
    fn from(settings: &RankingSettings) -> Self {
        Self {
            top_n: settings.top_n,
            prefilter: settings.prefilter,
            similar_game_threshold: settings.similar_game_threshold,
            parallel_threshold: settings.parallel_threshold,
        }
    }
}

fn default_top_n() -> usize { 10 }
fn default_similar_game_threshold() -> f64 { 0.4 }
fn default_parallel_threshold() -> usize { 256 }

/// Which lookup tables the engine starts from
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Start from the built-in reference tables instead of empty ones
    #[serde(default = "default_use_reference")]
    pub use_reference_tables: bool,
    /// TOML file replacing the starting tables entirely
    #[serde(default)]
    pub tables_file: Option<PathBuf>,
    /// Per-dimension weight overrides applied last
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            use_reference_tables: default_use_reference(),
            tables_file: None,
            weights: BTreeMap::new(),
        }
    }
}

fn default_use_reference() -> bool { true }

impl EngineSettings {
    /// Resolve the tables: reference or empty base, optional TOML file, then
    /// weight overrides
    pub fn tables(&self) -> Result<ConfigTables, LoadError> {
        let mut tables = match &self.tables_file {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                ConfigTables::from_toml_str(&source).map_err(|e| LoadError::Toml {
                    path: path.clone(),
                    source: e,
                })?
            }
            None if self.use_reference_tables => ConfigTables::reference(),
            None => ConfigTables::default(),
        };

        for (dimension, weight) in &self.weights {
            tables.weights.insert(dimension.clone(), *weight);
        }

        Ok(tables)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PLAYMATE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PLAYMATE__RANKING__TOP_N -> ranking.top_n
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    pub fn rank_options(&self) -> RankOptions {
        RankOptions::from(&self.ranking)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PLAYMATE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply shorthand environment overrides
///
/// `PLAYMATE_DATA_DIR` points the loader at another pool directory.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    if let Ok(dir) = std::env::var("PLAYMATE_DATA_DIR") {
        builder = builder.set_override("data.dir", dir)?;
    }

    builder.build()
}
