//! Pipeline configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::manifest::FileNaming;
use crate::month::YearMonth;

/// Public NYC TLC trip-record location.
pub const DEFAULT_SOURCE_BASE: &str = "https://d37ci6vzurbbsx.cloudfront.net/trip-data/";

/// Errors raised before any I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed month '{0}' (expected YYYY-MM with month 01-12)")]
    MalformedMonth(String),

    #[error("inverted range: start {start} is after end {end}")]
    InvertedRange { start: YearMonth, end: YearMonth },

    #[error("invalid config value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// What happens when a transfer fails during acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquirePolicy {
    /// Abort the remaining acquisitions on the first failure.
    #[default]
    FailFast,
    /// Keep acquiring and report every failure at the end.
    Isolate,
}

/// Which files the orchestrator processes after acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSelection {
    /// Exactly the manifest entries, in manifest order.
    #[default]
    Manifest,
    /// Every identifier-shaped file found in storage, in filename order.
    Storage,
}

/// Configuration for one pipeline run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// First month of the range (inclusive).
    pub range_start: YearMonth,
    /// Last month of the range (inclusive).
    pub range_end: YearMonth,
    /// URL or directory prefix the identifier is appended to.
    #[serde(default = "default_source_base")]
    pub source_base: String,
    /// Flat directory holding the acquired files.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default)]
    pub acquire_policy: AcquirePolicy,
    #[serde(default)]
    pub file_selection: FileSelection,
    /// Extra transfer attempts after a retryable failure. Zero disables retry.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_source_base() -> String {
    DEFAULT_SOURCE_BASE.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("raw_files")
}

fn default_file_prefix() -> String {
    FileNaming::default().prefix
}

fn default_file_extension() -> String {
    FileNaming::default().extension
}

impl PipelineConfig {
    /// Config with defaults for everything but the range.
    pub fn new(range_start: YearMonth, range_end: YearMonth) -> Self {
        Self {
            range_start,
            range_end,
            source_base: default_source_base(),
            storage_dir: default_storage_dir(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            acquire_policy: AcquirePolicy::default(),
            file_selection: FileSelection::default(),
            max_retries: 0,
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Check cross-field invariants. Month bounds are already valid by construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range_start > self.range_end {
            return Err(ConfigError::InvertedRange {
                start: self.range_start,
                end: self.range_end,
            });
        }
        if self.source_base.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "source_base",
                reason: "must not be empty".into(),
            });
        }
        self.naming().validate()
    }

    pub fn naming(&self) -> FileNaming {
        FileNaming {
            prefix: self.file_prefix.clone(),
            extension: self.file_extension.clone(),
        }
    }
}
