//! Configuration for clients and the command-line tool.
//!
//! Settings come from an optional TOML file, then `DOCSYNC_*` environment
//! variables, and are validated last.

use std::path::{Path, PathBuf};

use docsync_path::MAX_PATH_LENGTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Database id stamped onto decoded references.
    pub database: String,
    pub decode: DecodeConfig,
    pub subscription: SubscriptionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Deepest field path a decode may open a container at.
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Keep listeners attached after their token is dropped.
    pub keep_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            decode: DecodeConfig::default(),
            subscription: SubscriptionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_PATH_LENGTH,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

impl SyncConfig {
    /// Reads `path` if given, applies environment overrides, validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `DOCSYNC_DATABASE`, `DOCSYNC_MAX_DEPTH` and
    /// `DOCSYNC_LOG_LEVEL` as returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("DOCSYNC_DATABASE") {
            self.database = database;
        }
        if let Some(depth) = lookup("DOCSYNC_MAX_DEPTH") {
            self.decode.max_depth = depth
                .parse()
                .map_err(|e| ConfigError::invalid("DOCSYNC_MAX_DEPTH", format!("{e}")))?;
        }
        if let Some(level) = lookup("DOCSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::invalid("database", "must not be empty"));
        }
        if !(1..=MAX_PATH_LENGTH).contains(&self.decode.max_depth) {
            return Err(ConfigError::invalid(
                "decode.max_depth",
                format!("must be between 1 and {MAX_PATH_LENGTH}"),
            ));
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::invalid(
                "logging.level",
                format!("unknown level `{other}`"),
            )),
        }
    }
}
