//! Run configuration (tinytest.toml + environment)
//!
//! Configuration is merged in the following order (later overrides earlier):
//! 1. `tinytest.toml`, searched from the working directory upward
//! 2. Environment variables (`TINYTEST_*`)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "tinytest.toml";

/// Substring filter on test names (TINYTEST_FILTER)
pub const FILTER_ENV: &str = "TINYTEST_FILTER";

/// Diagnostic detail (TINYTEST_DIAGNOSTICS=message|located)
pub const DIAGNOSTICS_ENV: &str = "TINYTEST_DIAGNOSTICS";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How much a failed test's YAML block says
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnostics {
    /// `message` only
    #[default]
    Message,
    /// `message`, `file` and `line`
    Located,
}

impl FromStr for Diagnostics {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(Diagnostics::Message),
            "located" => Ok(Diagnostics::Located),
            other => Err(ConfigError::InvalidValue {
                field: "diagnostics".to_string(),
                reason: format!("expected 'message' or 'located', got '{}'", other),
            }),
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Only run tests whose name contains this pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Diagnostic detail for failed tests
    pub diagnostics: Diagnostics,
}

impl Config {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Find `tinytest.toml` by walking up from `start_dir`
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.is_file())
    }

    /// Load the project file (if any) and apply environment overrides
    pub fn load(start_dir: &Path) -> ConfigResult<Self> {
        let config = match Self::find(start_dir) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.with_overrides(|key| env::var(key).ok())
    }

    /// Configuration from environment variables alone
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply `TINYTEST_*` overrides read through `lookup`
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(filter) = lookup(FILTER_ENV) {
            self.filter = (!filter.is_empty()).then_some(filter);
        }

        if let Some(diagnostics) = lookup(DIAGNOSTICS_ENV) {
            self.diagnostics = diagnostics.parse()?;
        }

        Ok(self)
    }
}
