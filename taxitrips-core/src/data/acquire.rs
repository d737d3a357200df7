//! Source acquisition: make every manifest entry present in local storage.
//!
//! Sequential, one identifier at a time. Files already present are trusted and
//! never re-fetched, so a second run over the same manifest transfers nothing.

use super::storage::LocalStorage;
use super::transport::{source_location, Transport, TransportError};
use crate::config::{AcquirePolicy, PipelineConfig};
use crate::manifest::FileIdentifier;
use crate::observer::RunObserver;

/// Outcome of one acquisition pass.
#[derive(Debug, Default)]
pub struct AcquisitionReport {
    pub fetched: Vec<FileIdentifier>,
    pub already_present: Vec<FileIdentifier>,
    /// Only populated under [`AcquirePolicy::Isolate`].
    pub failed: Vec<TransportError>,
}

impl AcquisitionReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_failed(&self, identifier: &FileIdentifier) -> bool {
        self.failed.iter().any(|e| &e.identifier == identifier)
    }
}

pub struct SourceAcquirer<'a> {
    transport: &'a dyn Transport,
    observer: &'a dyn RunObserver,
}

impl<'a> SourceAcquirer<'a> {
    pub fn new(transport: &'a dyn Transport, observer: &'a dyn RunObserver) -> Self {
        Self {
            transport,
            observer,
        }
    }

    /// Fetch every identifier not yet in `config.storage_dir`.
    ///
    /// Under fail-fast the first transfer failure is returned and nothing after
    /// it is attempted. Under isolate every failure lands in the report.
    pub fn ensure_local(
        &self,
        identifiers: &[FileIdentifier],
        config: &PipelineConfig,
    ) -> Result<AcquisitionReport, TransportError> {
        let storage = LocalStorage::new(&config.storage_dir);
        let total = identifiers.len();
        let mut report = AcquisitionReport::default();

        for (i, identifier) in identifiers.iter().enumerate() {
            if storage.contains(identifier) {
                report.already_present.push(identifier.clone());
                continue;
            }

            let source = source_location(&config.source_base, identifier);
            self.observer.on_fetch_start(identifier, &source, i, total);

            let result = self
                .transport
                .fetch(&source, &storage.path_for(identifier))
                .map_err(|source| TransportError {
                    identifier: identifier.clone(),
                    source,
                });
            self.observer.on_fetch_complete(identifier, &result);

            match result {
                Ok(()) => report.fetched.push(identifier.clone()),
                Err(e) => match config.acquire_policy {
                    AcquirePolicy::FailFast => return Err(e),
                    AcquirePolicy::Isolate => report.failed.push(e),
                },
            }
        }

        self.observer.on_acquire_complete(&report);
        Ok(report)
    }
}
