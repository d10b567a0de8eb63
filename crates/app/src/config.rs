//! Configuration for the studypace binary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use studypace_core::TokenPolicy;

/// Settings read from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database URL; the platform data dir is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,

    /// How `units` input treats malformed tokens.
    pub token_policy: TokenPolicy,
}

impl Config {
    /// Load configuration from `path`, or from the platform config dir.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.json"))
    }

    /// Default database location under the data directory.
    pub fn default_db_url() -> Result<String> {
        let path = project_dirs()?.data_dir().join("studypace.sqlite3");
        Ok(format!("sqlite://{}", path.display()))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "studypace").context("Failed to determine config directory")
}
