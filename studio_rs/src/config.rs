//! Configuration file support.
//!
//! The studio persists exactly one thing between runs: the last database
//! path it connected to, stored in `config.toml` under the platform config
//! directory. Loading is tolerant - a missing or unreadable file degrades
//! to defaults with a warning, never an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Database path of the most recent successful connection.
    pub last_db_path: Option<String>,
}

impl StudioConfig {
    /// `<config-dir>/soch-studio/config.toml`, if the platform has a
    /// config directory at all.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("soch-studio").join("config.toml"))
    }

    /// Load from the default location. Returns defaults when the platform
    /// has no config directory.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path),
            None => Self::default(),
        }
    }

    /// Load config from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(err) => {
                    warn!("failed to parse {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                warn!("failed to read {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Save to the default location. A platform without a config directory
    /// silently skips persistence.
    pub fn save(&self) -> Result<()> {
        match Self::default_path() {
            Some(path) => self.save_to_path(&path),
            None => Ok(()),
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to encode config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn remember_path(&mut self, path: impl Into<String>) {
        self.last_db_path = Some(path.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let config = StudioConfig::load_from_path(&temp.path().join("config.toml"));
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "last_db_path = [not toml").expect("write");
        let config = StudioConfig::load_from_path(&path);
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("config.toml");

        let mut config = StudioConfig::default();
        config.remember_path("./dev.sochdb");
        config.save_to_path(&path).expect("save");

        let loaded = StudioConfig::load_from_path(&path);
        assert_eq!(loaded.last_db_path.as_deref(), Some("./dev.sochdb"));
    }
}
