//! Local filesystem backend.
//!
//! Writes go to a temporary sibling file that is synced and then renamed over
//! the target, so a concurrent reader sees either the old or the new content.
//! A symlink at the target path is written through: the file it points to is
//! replaced and the link is kept.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ConvergeError, FilesystemError, Result};

use super::store::{FileStore, WriteReport};

/// Suffix of temporary files created next to the target.
const TEMP_SUFFIX: &str = "converge.tmp";

/// Local filesystem store.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileStore;

impl LocalFileStore {
    /// Creates a new local file store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the ancestors of `dir` that do not exist yet, outermost first.
    async fn missing_ancestors(dir: &Path) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        let mut current = Some(dir);

        while let Some(candidate) = current {
            if candidate.as_os_str().is_empty() || fs::metadata(candidate).await.is_ok() {
                break;
            }
            missing.push(candidate.to_path_buf());
            current = candidate.parent();
        }

        missing.reverse();
        missing
    }

    /// Creates missing parent directories of `path`.
    async fn ensure_parent(path: &Path) -> Result<Vec<PathBuf>> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(Vec::new());
        };

        let missing = Self::missing_ancestors(parent).await;
        if !missing.is_empty() {
            debug!("Creating directory: {}", parent.display());
            fs::create_dir_all(parent).await.map_err(|source| {
                ConvergeError::Filesystem(FilesystemError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })
            })?;
        }

        Ok(missing)
    }

    /// Resolves symlinks in `path` to the file that is actually replaced.
    ///
    /// A path that does not exist yet is used as is.
    async fn resolve_target(path: &Path) -> Result<PathBuf> {
        match fs::canonicalize(path).await {
            Ok(resolved) => {
                if resolved != path {
                    debug!("Resolved {} to {}", path.display(), resolved.display());
                }
                Ok(resolved)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(path.to_path_buf()),
            Err(source) => Err(ConvergeError::Filesystem(FilesystemError::Write {
                path: path.to_path_buf(),
                source,
            })),
        }
    }

    /// Builds a unique temporary path next to the target.
    fn temp_path(path: &Path) -> Result<PathBuf> {
        let file_name = path.file_name().ok_or_else(|| {
            ConvergeError::Filesystem(FilesystemError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
            })
        })?;

        let temp_name = format!(
            ".{}.{}.{TEMP_SUFFIX}",
            file_name.to_string_lossy(),
            Uuid::new_v4().simple()
        );
        Ok(path.with_file_name(temp_name))
    }

    /// Writes the temporary file and renames it over the target.
    async fn write_and_replace(path: &Path, temp_path: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        drop(file);

        // Keep the mode of a file being replaced.
        if let Ok(metadata) = fs::metadata(path).await
            && metadata.is_file()
        {
            fs::set_permissions(temp_path, metadata.permissions()).await?;
        }

        fs::rename(temp_path, path).await
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(content) => {
                debug!("Read {} bytes from {}", content.len(), path.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("File does not exist: {}", path.display());
                Ok(None)
            }
            Err(source) => Err(ConvergeError::Filesystem(FilesystemError::Read {
                path: path.to_path_buf(),
                source,
            })),
        }
    }

    async fn write(&self, path: &Path, content: &[u8]) -> Result<WriteReport> {
        let created_dirs = Self::ensure_parent(path).await?;
        let target = Self::resolve_target(path).await?;
        let temp_path = Self::temp_path(&target)?;

        info!("Writing {} bytes to: {}", content.len(), path.display());

        if let Err(source) = Self::write_and_replace(&target, &temp_path, content).await {
            // Best effort: the temp file may not exist if creation failed.
            let _ = fs::remove_file(&temp_path).await;
            return Err(ConvergeError::Filesystem(FilesystemError::Write {
                path: path.to_path_buf(),
                source,
            }));
        }

        Ok(WriteReport {
            created_dirs,
            bytes_written: content.len(),
        })
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}
