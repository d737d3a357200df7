//! Transport for a source base that is a local directory (or a `file://` prefix).

use std::fs;
use std::io;
use std::path::Path;

use super::transport::{write_atomically, FetchError, Transport};

pub struct LocalCopyTransport;

impl LocalCopyTransport {
    fn resolve(source: &str) -> &Path {
        Path::new(source.strip_prefix("file://").unwrap_or(source))
    }
}

impl Transport for LocalCopyTransport {
    fn name(&self) -> &str {
        "local_copy"
    }

    fn fetch(&self, source: &str, destination: &Path) -> Result<(), FetchError> {
        let path = Self::resolve(source);
        let mut input = fs::File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(source.to_string()),
            _ => FetchError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        write_atomically(destination, |file| {
            io::copy(&mut input, file).map(|_| ()).map_err(|source| FetchError::Io {
                path: path.to_path_buf(),
                source,
            })
        })
    }
}
