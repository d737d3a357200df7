//! Transport trait and structured error types.
//!
//! The Transport trait abstracts over byte sources (HTTP, a local mirror) so
//! the acquirer can be tested against a mock. Transports don't know about the
//! manifest or storage layout; they move one source to one destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::manifest::FileIdentifier;

/// Why a single transfer failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("source not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::NotFound(_) | FetchError::Io { .. } => false,
        }
    }
}

/// A failed acquisition for a specific identifier.
#[derive(Debug, Error)]
#[error("failed to acquire {identifier}: {source}")]
pub struct TransportError {
    pub identifier: FileIdentifier,
    #[source]
    pub source: FetchError,
}

/// Moves the bytes of one source location to a local destination.
pub trait Transport: Send + Sync {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// Blocking transfer of `source` to `destination`.
    ///
    /// On success `destination` exists and is complete. On failure it does not exist.
    fn fetch(&self, source: &str, destination: &Path) -> Result<(), FetchError>;
}

/// Write `destination` through a `.part` sibling, renaming into place on success.
///
/// The final name is never visible with partial content.
pub(crate) fn write_atomically<F>(destination: &Path, write: F) -> Result<(), FetchError>
where
    F: FnOnce(&mut fs::File) -> Result<(), FetchError>,
{
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| FetchError::Io { path, source }
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
    }

    let part = part_path(destination);
    let result = fs::File::create(&part)
        .map_err(io_err(&part))
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all().map_err(io_err(&part))
        })
        .and_then(|()| fs::rename(&part, destination).map_err(io_err(destination)));

    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Join a source base and an identifier, inserting a separator if needed.
pub fn source_location(base: &str, identifier: &FileIdentifier) -> String {
    if base.ends_with('/') || base.ends_with('\\') {
        format!("{base}{identifier}")
    } else {
        format!("{base}/{identifier}")
    }
}
