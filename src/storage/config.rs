//! Configuration handling
//!
//! Settings live in a single TOML file in the platform config
//! directory (`~/.config/taskdown/config.toml` on Linux). A missing
//! file means defaults; there is no per-project configuration.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::syntax::SyntaxConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands, as spelled in the config file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format when no --format flag is given
    pub default_format: OutputFormat,

    /// Task syntax settings shared by every command
    pub syntax: SyntaxConfig,
}

impl GlobalConfig {
    /// Loads configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = match Self::config_dir() {
            Some(dir) => dir.join("config.toml"),
            None => return Ok(GlobalConfig::default()),
        };

        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse config")
    }

    /// Returns the global config directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "taskdown").map(|dirs| dirs.config_dir().to_path_buf())
    }
}
