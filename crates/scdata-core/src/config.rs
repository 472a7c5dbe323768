//! Persistent configuration of the local data store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of the config file inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable overriding the configured database path
pub const DB_PATH_ENV: &str = "SCDATA_DB_PATH";

const DEFAULT_SYNCED_EDIT_RETENTION_DAYS: u32 = 14;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Database file; the CLI falls back to its platform data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// How long uploaded edits are kept before they are purged
    #[serde(default = "default_synced_edit_retention_days")]
    pub synced_edit_retention_days: u32,
    /// `tracing` filter directive, e.g. `scdata=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

const fn default_synced_edit_retention_days() -> u32 {
    DEFAULT_SYNCED_EDIT_RETENTION_DAYS
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            database_path: None,
            synced_edit_retention_days: DEFAULT_SYNCED_EDIT_RETENTION_DAYS,
            log_filter: None,
        }
    }
}

fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Length of `days` whole days in milliseconds
pub fn days_to_millis(days: u32) -> i64 {
    i64::from(days) * MILLIS_PER_DAY
}

impl DataConfig {
    /// Load the config, falling back to defaults when the file does not exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::InvalidInput(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn normalize(&mut self) {
        self.log_filter = normalize_text_option(self.log_filter.take());
        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.database_path = None;
        }
    }

    /// Database location: environment override, then config, then `default`
    pub fn resolve_database_path(&self, default: &Path) -> PathBuf {
        if let Some(path) = normalize_text_option(std::env::var(DB_PATH_ENV).ok()) {
            return PathBuf::from(path);
        }
        self.database_path
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }

    /// Cut-off timestamp for purging synced edits, relative to `now` (ms)
    pub fn synced_edit_cutoff(&self, now: i64) -> i64 {
        now - days_to_millis(self.synced_edit_retention_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = DataConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, DataConfig::default());
        assert_eq!(config.synced_edit_retention_days, 14);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = DataConfig {
            database_path: Some(PathBuf::from("/tmp/other.db")),
            synced_edit_retention_days: 3,
            log_filter: Some("  scdata=debug ".to_string()),
            ..DataConfig::default()
        };

        config.save_to_path(&path).unwrap();
        let loaded = DataConfig::load_from_path(&path).unwrap();

        assert_eq!(
            loaded,
            DataConfig {
                log_filter: Some("scdata=debug".to_string()),
                ..config
            }
        );
    }

    #[test]
    fn partial_file_uses_field_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "log_filter": "" }"#).unwrap();

        let config = DataConfig::load_from_path(&path).unwrap();
        assert_eq!(config, DataConfig::default());
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            DataConfig::load_from_path(&path),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn cutoff_subtracts_retention() {
        let config = DataConfig {
            synced_edit_retention_days: 2,
            ..DataConfig::default()
        };
        assert_eq!(config.synced_edit_cutoff(MILLIS_PER_DAY * 5), MILLIS_PER_DAY * 3);
    }

    #[test]
    fn days_to_millis_counts_whole_days() {
        assert_eq!(days_to_millis(0), 0);
        assert_eq!(days_to_millis(2), 172_800_000);
        assert_eq!(days_to_millis(u32::MAX), i64::from(u32::MAX) * MILLIS_PER_DAY);
    }
}
