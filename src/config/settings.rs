use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::format::is_valid_pattern;

fn default_true() -> bool {
    true
}
fn default_bar_width() -> usize {
    12
}
fn default_date_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Overrides the database location under the data directory
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    /// strftime pattern for printed instants (always UTC)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            bar_width: default_bar_width(),
            date_format: default_date_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "cadence")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Database location: CLI override, then config file, then data dir.
    pub fn db_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.storage.db_path {
            return Ok(path.clone());
        }
        Ok(Self::data_dir()?.join("cadence.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        if !is_valid_pattern(&config.display.date_format) {
            bail!(
                "Invalid display.date_format {:?} in {:?}",
                config.display.date_format,
                path
            );
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    /// Make sure the directory holding the database exists.
    pub fn ensure_parent_dir(db_path: &Path) -> Result<()> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating {:?}", parent))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("nope.toml")).unwrap();
        assert!(config.display.color);
        assert_eq!(config.display.bar_width, 12);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[display]\ncolor = false\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(!config.display.color);
        assert_eq!(config.display.date_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.storage.db_path = Some(tmp.path().join("habits.db"));
        config.display.bar_width = 20;
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.storage.db_path, config.storage.db_path);
        assert_eq!(reloaded.display.bar_width, 20);
    }

    #[test]
    fn cli_override_wins() {
        let mut config = AppConfig::default();
        config.storage.db_path = Some(PathBuf::from("/from/config.db"));
        let chosen = config.db_path(Some(Path::new("/from/cli.db"))).unwrap();
        assert_eq!(chosen, PathBuf::from("/from/cli.db"));
        assert_eq!(config.db_path(None).unwrap(), PathBuf::from("/from/config.db"));
    }

    #[test]
    fn rejects_unrenderable_date_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[display]\ndate_format = \"%Y-%Q\"\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("date_format"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[display\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
