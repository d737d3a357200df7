//! Flat local storage directory.
//!
//! Layout: `{storage_dir}/{identifier}`. Presence of the exact path is the only
//! acquisition signal; contents of present files are trusted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::manifest::FileIdentifier;

pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identifier: &FileIdentifier) -> PathBuf {
        self.dir.join(identifier.name())
    }

    pub fn contains(&self, identifier: &FileIdentifier) -> bool {
        self.path_for(identifier).is_file()
    }

    /// File names in storage ending in `.{extension}`, sorted.
    ///
    /// A missing directory lists as empty.
    pub fn list(&self, extension: &str) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FileNaming;

    #[test]
    fn contains_is_exact_path_match() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let id = FileNaming::default().identifier("2024-01".parse().unwrap());

        assert!(!storage.contains(&id));
        fs::write(dir.path().join("yellow_tripdata_2024-01.parquet.part"), b"x").unwrap();
        assert!(!storage.contains(&id));
        fs::write(storage.path_for(&id), b"x").unwrap();
        assert!(storage.contains(&id));
    }

    #[test]
    fn list_filters_by_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.parquet", "a.parquet", "notes.txt", "c.parquet.part"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.parquet")).unwrap();

        let storage = LocalStorage::new(dir.path());
        assert_eq!(storage.list("parquet").unwrap(), vec!["a.parquet", "b.parquet"]);
    }

    #[test]
    fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("absent"));
        assert!(storage.list("parquet").unwrap().is_empty());
    }
}
