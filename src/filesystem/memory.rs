//! In-memory file store for tests and dry runs.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ConvergeError, Result};

use super::store::{FileStore, WriteReport};

/// In-memory file store.
///
/// The filesystem root always exists; every other directory exists once it
/// was registered or created by a write.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    /// File contents by path.
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    /// Existing directories.
    dirs: Mutex<BTreeSet<PathBuf>>,
    /// Number of successful writes.
    writes: AtomicUsize,
}

impl MemoryFileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file, registering its parent directories.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.register_dirs(parent);
        }
        if let Ok(mut files) = self.files.lock() {
            files.insert(path, content.into());
        }
        self
    }

    /// Returns the current content of a file.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path.as_ref()).cloned())
    }

    /// Returns true if the directory exists in the store.
    #[must_use]
    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        path.parent().is_none()
            || self
                .dirs
                .lock()
                .is_ok_and(|dirs| dirs.contains(path))
    }

    /// Returns the number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Registers `dir` and all its ancestors, returning the newly added ones.
    fn register_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(mut dirs) = self.dirs.lock() else {
            return Vec::new();
        };

        let mut created: Vec<PathBuf> = dir
            .ancestors()
            .filter(|d| d.parent().is_some() && !d.as_os_str().is_empty())
            .filter(|d| dirs.insert(d.to_path_buf()))
            .map(Path::to_path_buf)
            .collect();

        created.reverse();
        created
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let files = self
            .files
            .lock()
            .map_err(|_| ConvergeError::internal("memory file store lock poisoned"))?;
        Ok(files.get(path).cloned())
    }

    async fn write(&self, path: &Path, content: &[u8]) -> Result<WriteReport> {
        let created_dirs = path
            .parent()
            .map(|parent| self.register_dirs(parent))
            .unwrap_or_default();

        self.files
            .lock()
            .map_err(|_| ConvergeError::internal("memory file store lock poisoned"))?
            .insert(path.to_path_buf(), content.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(WriteReport {
            created_dirs,
            bytes_written: content.len(),
        })
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_file_is_readable() {
        let store = MemoryFileStore::new().with_file("/etc/motd", "welcome");

        let content = store.read(Path::new("/etc/motd")).await.unwrap();
        assert_eq!(content.as_deref(), Some(&b"welcome"[..]));
        assert!(store.has_dir("/etc"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_write_reports_new_dirs_only() {
        let store = MemoryFileStore::new().with_file("/srv/app/old.txt", "x");

        let report = store
            .write(Path::new("/srv/app/conf/new.txt"), b"y")
            .await
            .unwrap();

        assert_eq!(report.created_dirs, vec![PathBuf::from("/srv/app/conf")]);
        assert_eq!(store.contents("/srv/app/conf/new.txt"), Some(b"y".to_vec()));
        assert_eq!(store.write_count(), 1);
    }
}
