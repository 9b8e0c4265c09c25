//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use credline_core::Delimiters;
use serde::Deserialize;

/// Global configuration for credline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub affiliation: AffiliationConfig,
    pub format: Delimiters,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// DuckDB database file; `${VAR}` is expanded
    #[serde(deserialize_with = "deserialize_env_path")]
    pub path: PathBuf,
    /// DuckDB memory limit (e.g. "1GB")
    pub memory_limit: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/credline.duckdb"),
            memory_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AffiliationConfig {
    /// Institution token matched case-insensitively against affiliations
    pub institution: String,
}

impl Default for AffiliationConfig {
    fn default() -> Self {
        Self {
            institution: "innopolis".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub bom: bool,
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data/results"),
            bom: true,
            preview_rows: 10,
        }
    }
}

/// Deserialize a path that may be an environment variable reference like ${VAR}
fn deserialize_env_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    expand_env_var(&s)
        .map(PathBuf::from)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable in {s} is not set")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./credline.toml (current directory)
    /// 2. ~/.config/credline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("credline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "credline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text and check the `[format]` separators.
    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if let Err(field) = config.format.validate() {
            anyhow::bail!("format.{field} must not be empty");
        }
        Ok(config)
    }
}
