//! In-memory filesystem the bundler writes into.
//!
//! A [`MemoryFs`] is created for one build and owned by it, so nothing is
//! left on the operator's disk and parallel builds cannot see each other's
//! output.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Flat map of path to file contents.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryFs {
    /// Empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the file at `path`.
    pub fn write(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
    }

    /// Borrow the contents of `path`.
    pub fn read(&self, path: impl AsRef<Path>) -> io::Result<&[u8]> {
        let path = path.as_ref();
        self.files
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| not_found(path))
    }

    /// Remove `path` and return its contents.
    pub fn take(&mut self, path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        let path = path.as_ref();
        self.files.remove(path).ok_or_else(|| not_found(path))
    }

    /// Whether `path` exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// Paths of all files, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file has been written.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found in memory filesystem", path.display()),
    )
}
