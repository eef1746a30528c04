//! Application configuration.
//!
//! Settings are layered: built-in defaults, then `~/.config/gamedex/config.toml`,
//! then `GAMEDEX_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_PAGE_SIZE;

/// Public endpoint of the catalog API.
pub const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api";
/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "gamedex";

const DEFAULT_CONFIG: &str = r#"# gamedex configuration
#
# Every key can also be set through the environment, e.g. GAMEDEX_API_KEY.

api_base_url = "https://api.rawg.io/api"

# Personal key from https://rawg.io/apidocs
# api_key = ""

page_size = 20

# Abort requests that take longer than this many seconds.
# request_timeout_secs = 30
"#;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the catalog API.
    pub api_base_url: String,
    /// Key appended to every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Page size for store list fetches.
    pub page_size: u32,
    /// Optional per-request timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Directory for persisted state and logs.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: None,
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration using `path` as the file layer. A missing file is fine.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("page_size", i64::from(defaults.page_size))?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("GAMEDEX").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }

    /// File backing the persisted key/value storage.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_base_url = "http://localhost:8080/api"
api_key = "abc"
page_size = 40
data_dir = "/tmp/gamedex-test"
"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.page_size, 40);
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/gamedex-test/storage.json"));
        Ok(())
    }

    #[test]
    fn default_file_parses_and_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.request_timeout_secs, None);

        fs::write(&path, "page_size = 5\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "page_size = 5\n");
        Ok(())
    }
}
