//! Run observer: the logging capability handed to pipeline components.
//!
//! Components never log through a global. They report events to a
//! `&dyn RunObserver`, so a test can pass [`NullObserver`] (or its own
//! recording implementation) and the CLI passes [`TracingObserver`].

use crate::data::acquire::AcquisitionReport;
use crate::data::transport::TransportError;
use crate::manifest::FileIdentifier;
use crate::quality::ValidationVerdict;

/// Callbacks for pipeline progress. Every method defaults to a no-op.
pub trait RunObserver: Send + Sync {
    /// The manifest for this run has been generated.
    fn on_manifest(&self, _identifiers: &[FileIdentifier]) {}

    /// A transfer is about to start.
    fn on_fetch_start(&self, _identifier: &FileIdentifier, _source: &str, _index: usize, _total: usize) {}

    /// A transfer finished, successfully or not.
    fn on_fetch_complete(&self, _identifier: &FileIdentifier, _result: &Result<(), TransportError>) {}

    /// Acquisition is done for the whole manifest.
    fn on_acquire_complete(&self, _report: &AcquisitionReport) {}

    /// A file in storage matches the extension but is not part of this run's manifest.
    fn on_stray_file(&self, _file_name: &str) {}

    /// A file has been normalized; `renamed` lists the applied renames.
    fn on_normalized(&self, _identifier: &FileIdentifier, _renamed: &[(&str, &str)]) {}

    /// A file has been validated.
    fn on_verdict(&self, _identifier: &FileIdentifier, _rows: usize, _verdict: &ValidationVerdict) {}

    /// The run finished without an infrastructure error.
    fn on_run_complete(&self, _passed: usize, _failed: usize, _total: usize) {}
}

/// Ignores every event.
pub struct NullObserver;

impl RunObserver for NullObserver {}

/// Emits every event as a structured `tracing` event.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_manifest(&self, identifiers: &[FileIdentifier]) {
        match (identifiers.first(), identifiers.last()) {
            (Some(first), Some(last)) => tracing::info!(
                count = identifiers.len(),
                first = %first,
                last = %last,
                "manifest generated"
            ),
            _ => tracing::info!(count = 0, "manifest generated"),
        }
    }

    fn on_fetch_start(&self, identifier: &FileIdentifier, source: &str, index: usize, total: usize) {
        tracing::info!(file = %identifier, source, "[{}/{}] downloading", index + 1, total);
    }

    fn on_fetch_complete(&self, identifier: &FileIdentifier, result: &Result<(), TransportError>) {
        match result {
            Ok(()) => tracing::info!(file = %identifier, "downloaded"),
            Err(e) => tracing::error!(file = %identifier, error = %e, "download failed"),
        }
    }

    fn on_acquire_complete(&self, report: &AcquisitionReport) {
        tracing::info!(
            fetched = report.fetched.len(),
            already_present = report.already_present.len(),
            failed = report.failed.len(),
            "acquisition complete"
        );
    }

    fn on_stray_file(&self, file_name: &str) {
        tracing::warn!(file = file_name, "file in storage is not part of the manifest");
    }

    fn on_normalized(&self, identifier: &FileIdentifier, renamed: &[(&str, &str)]) {
        tracing::debug!(file = %identifier, renamed = renamed.len(), "schema normalized");
    }

    fn on_verdict(&self, identifier: &FileIdentifier, rows: usize, verdict: &ValidationVerdict) {
        if verdict.passed {
            tracing::info!(file = %identifier, rows, "validation passed");
            return;
        }
        if !verdict.missing_columns.is_empty() {
            let missing: Vec<&str> = verdict.missing_columns.iter().map(String::as_str).collect();
            tracing::warn!(file = %identifier, missing = ?missing, "missing required columns");
        }
        for violation in &verdict.violations {
            tracing::warn!(
                file = %identifier,
                rule = %violation.rule,
                rows = violation.offending_rows,
                "{}",
                violation.description
            );
        }
    }

    fn on_run_complete(&self, passed: usize, failed: usize, total: usize) {
        if failed == 0 {
            tracing::info!(passed, total, "run complete");
        } else {
            tracing::warn!(passed, failed, total, "run complete with failed files");
        }
    }
}
