use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DataSettings;
use crate::error::EngineError;
use crate::models::{
    ConfigTables, GameCatalog, GameCatalogEntry, PreferenceTable, Profile, ProfileRecord,
};

/// Errors that can occur when loading pool data
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Everything read from the data directory
#[derive(Debug, Clone, Default)]
pub struct PoolData {
    pub profiles: Vec<Profile>,
    pub catalog: GameCatalog,
    pub mbti: PreferenceTable,
    pub zodiac: PreferenceTable,
}

impl PoolData {
    /// Install the loaded MBTI and zodiac tables. Empty files leave the
    /// configured tables untouched.
    pub fn apply_tables(&self, tables: &mut ConfigTables) {
        if !self.mbti.is_empty() {
            tables.mbti = self.mbti.clone();
        }
        if !self.zodiac.is_empty() {
            tables.zodiac = self.zodiac.clone();
        }
    }

    /// Log categorical values outside the configured domains, returning how
    /// many were found
    pub fn report_unknown_values(&self, tables: &ConfigTables) -> usize {
        let mut count = 0;
        for profile in &self.profiles {
            for (field, value) in tables.unknown_values(profile) {
                tracing::warn!(
                    "Profile {} has unknown {} value '{}', it will score as a mismatch",
                    profile.user_id(),
                    field,
                    value
                );
                count += 1;
            }
        }
        count
    }
}

/// JSON loader for profiles, game catalog and preference tables.
///
/// Handles:
/// - Missing files (warned about, loaded as empty)
/// - Invalid profiles (skipped with a warning)
/// - Repeated user ids (first occurrence wins)
pub struct PoolLoader {
    settings: DataSettings,
}

impl PoolLoader {
    pub fn new(settings: DataSettings) -> Self {
        Self { settings }
    }

    /// Loader reading the default file names from `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(DataSettings {
            dir: dir.as_ref().to_path_buf(),
            ..DataSettings::default()
        })
    }

    pub fn load(&self) -> Result<PoolData, LoadError> {
        let records: Vec<ProfileRecord> = read_optional(&self.settings.profiles_path())?;
        let entries: Vec<GameCatalogEntry> = read_optional(&self.settings.games_path())?;
        let mbti: PreferenceTable = read_optional(&self.settings.mbti_path())?;
        let zodiac: PreferenceTable = read_optional(&self.settings.zodiac_path())?;

        let profiles = collect_profiles(records);
        let catalog = GameCatalog::new(entries)?;

        tracing::info!(
            "Loaded {} profiles, {} games, {} MBTI rows, {} zodiac rows",
            profiles.len(),
            catalog.len(),
            mbti.rows.len(),
            zodiac.rows.len()
        );

        Ok(PoolData {
            profiles,
            catalog,
            mbti,
            zodiac,
        })
    }
}

fn collect_profiles(records: Vec<ProfileRecord>) -> Vec<Profile> {
    let mut seen = HashSet::new();
    let mut profiles = Vec::with_capacity(records.len());

    for record in records {
        let user_id = record.user_id.clone();
        match Profile::try_from(record) {
            Ok(profile) => {
                if seen.insert(user_id) {
                    profiles.push(profile);
                } else {
                    tracing::warn!(
                        "Duplicate profile {}, keeping the first one",
                        profile.user_id()
                    );
                }
            }
            Err(e) => tracing::warn!("Skipping profile '{}': {}", user_id, e),
        }
    }

    profiles
}

/// Read a JSON document, or its default value when the file does not exist
fn read_optional<T>(path: &Path) -> Result<T, LoadError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::warn!("{} not found, continuing with empty data", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| LoadError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
