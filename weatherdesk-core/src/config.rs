use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::ConfigError, model::Units};

pub const DEFAULT_CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Credentials and endpoints of the weather API.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: String,

    /// Current-weather endpoint.
    #[serde(default)]
    pub url: String,

    /// 5-day forecast endpoint. Falls back to [`DEFAULT_FORECAST_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// units = "metric"
///
/// [api]
/// key = "..."
/// url = "https://api.openweathermap.org/data/2.5/weather"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub units: Units,

    /// Where the history and favorites files live. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load config from `path`. A missing file is an error: nothing works without an API key.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Config::load_from`], but a missing file yields an empty config.
    /// Used by `configure`, which is how the file gets created in the first place.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load_from(path) {
            Err(ConfigError::Missing(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Fail unless the API key and the current-weather URL are both set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.key.trim().is_empty() {
            return Err(ConfigError::MissingField("api.key"));
        }
        if self.api.url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.url"));
        }
        Ok(())
    }

    pub fn forecast_url(&self) -> &str {
        self.api
            .forecast_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_FORECAST_URL)
    }

    /// Set the API key, filling in the default endpoint if none is configured yet.
    pub fn set_api_key(&mut self, key: String) {
        self.api.key = key;

        if self.api.url.trim().is_empty() {
            self.api.url = DEFAULT_CURRENT_URL.to_string();
        }
    }

    /// Directory holding `search_history.txt` and `favorites.txt`.
    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("dev", "weatherdesk", "weatherdesk").ok_or(ConfigError::NoConfigDir)
}
