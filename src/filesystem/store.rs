//! File store trait definition.
//!
//! This module defines the filesystem capability the file reconciler is
//! handed, so tests can swap the real filesystem for an in-memory one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// What a write actually did on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Directories created for the write, outermost first.
    pub created_dirs: Vec<PathBuf>,
    /// Number of bytes written.
    pub bytes_written: usize,
}

/// Trait for filesystem backends.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Reads the current content of a file.
    ///
    /// Returns `None` if the file does not exist.
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Replaces the content of a file, creating missing parent directories.
    ///
    /// Readers never observe a partially written file.
    async fn write(&self, path: &Path, content: &[u8]) -> Result<WriteReport>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
