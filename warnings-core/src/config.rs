use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::BackendType;

/// Overrides the location of the config file
pub const CONFIG_PATH_ENV: &str = "WARNINGS_CONFIG_PATH";
/// Overrides the configured data directory
pub const DATA_DIR_ENV: &str = "WARNINGS_DATA_DIR";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the store keeps its data; `None` means the platform data dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub backend: BackendType,
    pub autosave_interval_secs: u64,
    pub preview_debounce_ms: u64,
    pub toast_lifetime_secs: u64,
    /// Simulated processing time before a warning is generated
    pub generate_delay_ms: u64,
    /// Simulated processing time before an HTML export is written
    pub export_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendType::File,
            autosave_interval_secs: 30,
            preview_debounce_ms: 500,
            toast_lifetime_secs: 5,
            generate_delay_ms: 1000,
            export_delay_ms: 1500,
        }
    }
}

impl Config {
    /// Loads the config from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config from the default location, falling back to defaults
    /// when no file exists. `WARNINGS_DATA_DIR` is applied on top.
    pub fn load_or_default() -> Result<Self> {
        let path = get_config_path()?;
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            log::debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes a default config file if none exists. Returns true if one was written.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<bool> {
        if path.as_ref().exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    /// The data directory, resolving the platform default
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Where the store lives: the data dir itself for file storage,
    /// a database file inside it for SQLite
    pub fn store_path(&self) -> Result<PathBuf> {
        let dir = self.resolved_data_dir()?;
        Ok(match self.backend {
            BackendType::Sqlite => dir.join("warnings.db"),
            _ => dir,
        })
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_secs(self.toast_lifetime_secs)
    }

    pub fn generate_delay(&self) -> Duration {
        Duration::from_millis(self.generate_delay_ms)
    }

    pub fn export_delay(&self) -> Duration {
        Duration::from_millis(self.export_delay_ms)
    }

    /// Same settings with the simulated delays removed
    pub fn without_delays(mut self) -> Self {
        self.generate_delay_ms = 0;
        self.export_delay_ms = 0;
        self
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;

    Ok(config_dir.join("warnings").join("config.yaml"))
}

/// The platform data directory for the store
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(data_dir.join("warnings"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.preview_debounce(), Duration::from_millis(500));
        assert_eq!(config.toast_lifetime(), Duration::from_secs(5));
        assert_eq!(config.generate_delay(), Duration::from_millis(1000));
        assert_eq!(config.export_delay(), Duration::from_millis(1500));
        assert_eq!(config.backend, BackendType::File);
    }

    #[test]
    fn test_create_default_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        assert!(Config::create_default(&path).unwrap());
        assert!(!Config::create_default(&path).unwrap());
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "backend: sqlite\ndata_dir: /tmp/w\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend, BackendType::Sqlite);
        assert_eq!(config.autosave_interval_secs, 30);
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/tmp/w/warnings.db"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "backend: [").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_without_delays() {
        let config = Config::default().without_delays();
        assert_eq!(config.generate_delay(), Duration::ZERO);
        assert_eq!(config.export_delay(), Duration::ZERO);
        assert_eq!(config.preview_debounce_ms, 500);
    }
}
