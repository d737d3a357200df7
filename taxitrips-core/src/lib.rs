//! taxitrips core — manifest, acquisition, schema normalization, quality gate.
//!
//! This crate holds the pieces of the monthly trip-record pipeline that carry
//! real logic:
//! - Manifest generation from an inclusive month range
//! - Acquisition of missing files through an injected transport
//! - Vendor-to-canonical column renaming
//! - Presence and value-range validation producing a structured verdict
//!
//! Orchestration lives in `taxitrips-runner`.

pub mod config;
pub mod data;
pub mod manifest;
pub mod month;
pub mod observer;
pub mod quality;
pub mod schema;

pub use config::{AcquirePolicy, ConfigError, FileSelection, PipelineConfig};
pub use manifest::{FileIdentifier, FileNaming};
pub use month::YearMonth;
pub use observer::{NullObserver, RunObserver, TracingObserver};
pub use quality::{QualityGate, ValidationVerdict, Violation};
pub use schema::{SchemaNormalizer, CANONICAL_COLUMNS, VENDOR_RENAMES};
