//! Pipeline orchestrator — wires manifest, acquisition, normalization and the gate.
//!
//! Two entry points:
//! - `PipelineOrchestrator::run()`: the end-to-end run over a config. Used by CLI `run`.
//! - `check_file()`: read, normalize and validate one local file. Used by the
//!   orchestrator per file and by CLI `validate`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taxitrips_core::data::{
    LocalStorage, ReadError, SourceAcquirer, TabularReader, Transport, TransportError,
};
use taxitrips_core::manifest::{self, FileIdentifier};
use taxitrips_core::{
    ConfigError, FileSelection, PipelineConfig, QualityGate, RunObserver, SchemaNormalizer,
    ValidationVerdict, YearMonth,
};

/// Infrastructure failures. Any of these ends the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("read error for {identifier}: {source}")]
    Read {
        identifier: FileIdentifier,
        #[source]
        source: ReadError,
    },
    #[error("cannot list storage directory {}: {source}", dir.display())]
    Storage {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Current schema version for persisted run reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Result of checking one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCheck {
    pub rows: usize,
    /// BLAKE3 hex digest of the file bytes.
    pub content_hash: String,
    pub verdict: ValidationVerdict,
}

/// Verdict for one manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVerdict {
    pub identifier: FileIdentifier,
    pub rows: usize,
    pub content_hash: String,
    pub verdict: ValidationVerdict,
}

/// A transfer that failed under the isolate policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionFailure {
    pub identifier: FileIdentifier,
    pub reason: String,
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub range_start: YearMonth,
    pub range_end: YearMonth,
    pub generated_at: chrono::NaiveDateTime,
    /// Per-file verdicts in processing order.
    pub files: Vec<FileVerdict>,
    pub fetched: Vec<FileIdentifier>,
    pub already_present: Vec<FileIdentifier>,
    pub acquisition_failures: Vec<AcquisitionFailure>,
    /// Files in storage with the run's extension that are not manifest entries.
    pub stray_files: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    /// Every file passed and nothing failed to acquire.
    pub fn passed(&self) -> bool {
        self.acquisition_failures.is_empty() && self.files.iter().all(|f| f.verdict.passed)
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileVerdict> {
        self.files.iter().filter(|f| !f.verdict.passed)
    }

    /// `(identifier, verdict)` pairs in processing order.
    pub fn verdicts(&self) -> Vec<(&FileIdentifier, &ValidationVerdict)> {
        self.files.iter().map(|f| (&f.identifier, &f.verdict)).collect()
    }
}

/// Read, normalize and validate one local file.
pub fn check_file(reader: &dyn TabularReader, path: &Path) -> Result<FileCheck, ReadError> {
    let (check, _) = check_file_with_renames(reader, path)?;
    Ok(check)
}

fn check_file_with_renames(
    reader: &dyn TabularReader,
    path: &Path,
) -> Result<(FileCheck, Vec<(&'static str, &'static str)>), ReadError> {
    let frame = reader.read(path)?;
    let content_hash = hash_file(path)?;
    let rows = frame.height();

    let (frame, renamed) = SchemaNormalizer::normalize_with_renames(frame);
    let verdict = QualityGate::validate(&frame);

    Ok((
        FileCheck {
            rows,
            content_hash,
            verdict,
        },
        renamed,
    ))
}

fn hash_file(path: &Path) -> Result<String, ReadError> {
    let mut file = fs::File::open(path).map_err(|e| ReadError::new(path, format!("open: {e}")))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(|e| ReadError::new(path, format!("hash: {e}")))?;
    Ok(hasher.finalize().to_hex().to_string())
}

pub struct PipelineOrchestrator<'a> {
    transport: &'a dyn Transport,
    reader: &'a dyn TabularReader,
    observer: &'a dyn RunObserver,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        reader: &'a dyn TabularReader,
        observer: &'a dyn RunObserver,
    ) -> Self {
        Self {
            transport,
            reader,
            observer,
        }
    }

    /// Run the pipeline: manifest → acquisition → per-file normalize and validate.
    ///
    /// Failed verdicts never stop the run; infrastructure errors always do.
    pub fn run(&self, config: &PipelineConfig) -> Result<RunReport, PipelineError> {
        config.validate()?;
        let manifest = manifest::generate(config)?;
        self.observer.on_manifest(&manifest);

        let acquisition =
            SourceAcquirer::new(self.transport, self.observer).ensure_local(&manifest, config)?;

        let storage = LocalStorage::new(&config.storage_dir);
        let naming = config.naming();
        let stored = storage
            .list(&naming.extension)
            .map_err(|source| PipelineError::Storage {
                dir: config.storage_dir.clone(),
                source,
            })?;

        let expected: HashSet<&str> = manifest.iter().map(|id| id.name()).collect();
        let stray_files: Vec<String> = stored
            .iter()
            .filter(|name| !expected.contains(name.as_str()))
            .cloned()
            .collect();
        for name in &stray_files {
            self.observer.on_stray_file(name);
        }

        let to_process: Vec<FileIdentifier> = match config.file_selection {
            FileSelection::Manifest => manifest
                .iter()
                .filter(|id| !acquisition.is_failed(id))
                .cloned()
                .collect(),
            FileSelection::Storage => stored.iter().filter_map(|name| naming.parse(name)).collect(),
        };

        let mut files = Vec::with_capacity(to_process.len());
        for identifier in to_process {
            let path = storage.path_for(&identifier);
            let (check, renamed) =
                check_file_with_renames(self.reader, &path).map_err(|source| {
                    PipelineError::Read {
                        identifier: identifier.clone(),
                        source,
                    }
                })?;
            self.observer.on_normalized(&identifier, &renamed);
            self.observer.on_verdict(&identifier, check.rows, &check.verdict);

            files.push(FileVerdict {
                identifier,
                rows: check.rows,
                content_hash: check.content_hash,
                verdict: check.verdict,
            });
        }

        let failed = files.iter().filter(|f| !f.verdict.passed).count();
        self.observer
            .on_run_complete(files.len() - failed, failed, files.len());

        Ok(RunReport {
            schema_version: SCHEMA_VERSION,
            range_start: config.range_start,
            range_end: config.range_end,
            generated_at: chrono::Local::now().naive_local(),
            files,
            fetched: acquisition.fetched,
            already_present: acquisition.already_present,
            acquisition_failures: acquisition
                .failed
                .into_iter()
                .map(|e| AcquisitionFailure {
                    reason: e.source.to_string(),
                    identifier: e.identifier,
                })
                .collect(),
            stray_files,
        })
    }
}
