//! taxitrips runner — pipeline orchestration and run report export.
//!
//! This crate builds on `taxitrips-core` to provide:
//! - The end-to-end run: manifest, acquisition, per-file normalize and validate
//! - Single-file checks for ad-hoc validation
//! - JSON/CSV run report artifacts

pub mod export;
pub mod pipeline;

pub use export::{export_findings_csv, export_json, import_json, load_report, save_report};
pub use pipeline::{
    check_file, AcquisitionFailure, FileCheck, FileVerdict, PipelineError, PipelineOrchestrator,
    RunReport, SCHEMA_VERSION,
};
