//! Application configuration module
//!
//! Handles loading configuration from environment variables (and `.env`).

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Where the catalog lives on disk
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub root: PathBuf,
    /// Record the git commit of the scanned tree with each snapshot
    pub record_revision: bool,
}

impl CatalogConfig {
    /// `$HOME/.claude/ram/librarian/catalog`
    pub fn default_root(home: impl Into<PathBuf>) -> PathBuf {
        home.into()
            .join(".claude")
            .join("ram")
            .join("librarian")
            .join("catalog")
    }
}

/// Terminal output configuration
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub no_color: bool,
}

/// Diff behaviour configuration
#[derive(Debug, Clone, Default)]
pub struct DiffConfig {
    /// Also compare primary-key / unique / default on shared columns
    pub strict: bool,
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    pub diff: DiffConfig,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// An explicit `catalog_dir` takes precedence over `SCHEMA_CATALOG_DIR`.
    pub fn load(catalog_dir: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| match (key, catalog_dir) {
            ("SCHEMA_CATALOG_DIR", Some(dir)) => Some(dir.to_string_lossy().into_owned()),
            _ => std::env::var(key).ok(),
        })
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = match lookup("SCHEMA_CATALOG_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME")
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingVar("HOME".to_string()))?;
                CatalogConfig::default_root(home)
            }
        };

        let record_revision = match lookup("SCHEMA_CATALOG_GIT") {
            Some(v) => Self::parse_flag("SCHEMA_CATALOG_GIT", &v)?,
            None => true,
        };

        let no_color = lookup("NO_COLOR").is_some_and(|v| !v.is_empty());

        let strict = match lookup("SCHEMA_CATALOG_STRICT_DIFF") {
            Some(v) => Self::parse_flag("SCHEMA_CATALOG_STRICT_DIFF", &v)?,
            None => false,
        };

        Ok(Self {
            catalog: CatalogConfig { root, record_revision },
            output: OutputConfig { no_color },
            diff: DiffConfig { strict },
        })
    }

    fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue(format!(
                "{} must be a boolean, got '{}'",
                name, other
            ))),
        }
    }
}
