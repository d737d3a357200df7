//! Tabular readers: load one local file fully into a `DataFrame`.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A local file could not be turned into a frame.
#[derive(Debug, Error)]
#[error("failed to read {}: {reason}", path.display())]
pub struct ReadError {
    pub path: PathBuf,
    pub reason: String,
}

impl ReadError {
    pub fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub trait TabularReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<DataFrame, ReadError>;
}

/// Reads Parquet snapshots with polars.
pub struct ParquetFrameReader;

impl TabularReader for ParquetFrameReader {
    fn read(&self, path: &Path) -> Result<DataFrame, ReadError> {
        let file = fs::File::open(path).map_err(|e| ReadError::new(path, format!("open: {e}")))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| ReadError::new(path, format!("parquet: {e}")))?;

        if df.width() == 0 {
            return Err(ReadError::new(path, "file has no columns"));
        }
        Ok(df)
    }
}
