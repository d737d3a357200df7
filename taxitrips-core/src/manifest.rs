//! Manifest generation: the exact set of monthly source files a run needs.
//!
//! Identifiers follow `<prefix>_<YYYY>-<MM>.<ext>`, one per calendar month in
//! the configured inclusive range, in chronological order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ConfigError, PipelineConfig};
use crate::month::YearMonth;

/// Naming scheme shared by every identifier of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub prefix: String,
    pub extension: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            prefix: "yellow_tripdata".into(),
            extension: "parquet".into(),
        }
    }
}

impl FileNaming {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidField {
                field: "file_prefix",
                reason: format!("'{}' is not a usable file name prefix", self.prefix),
            });
        }
        if self.extension.is_empty() || self.extension.contains(['/', '\\', '.']) {
            return Err(ConfigError::InvalidField {
                field: "file_extension",
                reason: format!("'{}' is not a usable file extension", self.extension),
            });
        }
        Ok(())
    }

    pub fn identifier(&self, month: YearMonth) -> FileIdentifier {
        FileIdentifier {
            name: format!("{}_{}.{}", self.prefix, month, self.extension),
            month,
        }
    }

    /// Recover an identifier from a file name written under this naming scheme.
    pub fn parse(&self, file_name: &str) -> Option<FileIdentifier> {
        let stem = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('_')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        let month: YearMonth = stem.parse().ok()?;
        Some(self.identifier(month))
    }
}

/// Canonical name of one monthly source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileIdentifier {
    name: String,
    month: YearMonth,
}

impl FileIdentifier {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Generate the manifest for a config's date range.
pub fn generate(config: &PipelineConfig) -> Result<Vec<FileIdentifier>, ConfigError> {
    let naming = config.naming();
    naming.validate()?;
    generate_range(config.range_start, config.range_end, &naming)
}

/// Generate identifiers for every month in `[start, end]`.
///
/// Fails with [`ConfigError::InvertedRange`] when `start > end`.
pub fn generate_range(
    start: YearMonth,
    end: YearMonth,
    naming: &FileNaming,
) -> Result<Vec<FileIdentifier>, ConfigError> {
    if start > end {
        return Err(ConfigError::InvertedRange { start, end });
    }

    let mut identifiers = Vec::with_capacity(start.months_through(end) as usize);
    for year in start.year()..=end.year() {
        let first = if year == start.year() { start.month() } else { 1 };
        let last = if year == end.year() { end.month() } else { 12 };
        for month in first..=last {
            identifiers.push(naming.identifier(YearMonth::new(year, month)?));
        }
    }
    Ok(identifiers)
}
