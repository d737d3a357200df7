//! Acquisition and reading of monthly source files.

pub mod acquire;
pub mod http;
pub mod local;
pub mod reader;
pub mod storage;
pub mod transport;

pub use acquire::{AcquisitionReport, SourceAcquirer};
pub use http::HttpTransport;
pub use local::LocalCopyTransport;
pub use reader::{ParquetFrameReader, ReadError, TabularReader};
pub use storage::LocalStorage;
pub use transport::{FetchError, Transport, TransportError};

/// Pick a transport from the source base: HTTP(S) URLs go over the network,
/// anything else is treated as a local directory.
pub fn transport_for(source_base: &str, max_retries: u32) -> Result<Box<dyn Transport>, FetchError> {
    let lower = source_base.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(Box::new(HttpTransport::new(max_retries)?))
    } else {
        Ok(Box::new(LocalCopyTransport))
    }
}
