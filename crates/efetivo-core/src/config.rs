//! Application configuration management.
//!
//! Holds where data lives, the table page size, an optional seed roster and
//! the last open view. Stored at `~/.config/efetivo/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_PAGE_SIZE;
use crate::state::View;

/// Application name used for config/data directory paths
const APP_NAME: &str = "efetivo";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides `data_dir`
pub const DATA_DIR_ENV: &str = "EFETIVO_DATA_DIR";

/// Overrides `seed_file`
pub const SEED_FILE_ENV: &str = "EFETIVO_SEED_FILE";

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Roster JSON imported when the store holds no roster.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
    #[serde(default)]
    pub last_view: View,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            seed_file: None,
            last_view: View::default(),
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(SEED_FILE_ENV).ok(),
        );
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let mut config: Config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.page_size = config.page_size.max(1);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Blank values are ignored.
    pub fn apply_overrides(&mut self, data_dir: Option<String>, seed_file: Option<String>) {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(file) = seed_file.filter(|f| !f.trim().is_empty()) {
            self.seed_file = Some(PathBuf::from(file));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for stored documents and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!("efetivo-config-{}.json", uuid::Uuid::new_v4()));
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("efetivo-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/efetivo")),
            page_size: 50,
            seed_file: None,
            last_view: View::Ddqod,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_view":"OrgChart"}"#).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.last_view, View::OrgChart);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("/srv/efetivo".to_string()), Some("  ".to_string()));
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/efetivo")));
        assert!(config.seed_file.is_none());
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/srv/efetivo"));
    }
}
