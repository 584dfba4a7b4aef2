//! Text file content reconciler.

use tracing::{error, info};

use crate::config::{ContentHasher, DesiredFileState, InputValidator};
use crate::error::Result;
use crate::filesystem::FileStore;
use crate::planner::{DiffEngine, ExecutionMode, Phase, PhaseTracker, PlannedAction, ReconcilePlan};

use super::{FileFields, ReconcileResult};

/// Reconciler for the content of a single text file.
///
/// Content is compared byte for byte with no normalization: a trailing
/// newline or a CRLF line ending is a difference.
pub struct FileContentReconciler<'a, F: FileStore + ?Sized> {
    /// Filesystem capability.
    store: &'a F,
    /// Input validator.
    validator: InputValidator,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// Content hasher.
    hasher: ContentHasher,
}

impl<'a, F: FileStore + ?Sized> FileContentReconciler<'a, F> {
    /// Creates a new file reconciler.
    #[must_use]
    pub const fn new(store: &'a F) -> Self {
        Self {
            store,
            validator: InputValidator::new(),
            diff_engine: DiffEngine::new(),
            hasher: ContentHasher::new(),
        }
    }

    /// Converges the file at `desired.path` to `desired.content`.
    ///
    /// In check mode nothing is written. Otherwise the file is replaced
    /// atomically when its content differs, creating missing parent
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the file cannot be read or
    /// written.
    pub async fn reconcile(
        &self,
        desired: &DesiredFileState,
        mode: ExecutionMode,
    ) -> Result<ReconcileResult<FileFields>> {
        self.validator.validate_file(desired)?;

        let path = desired.path.as_path();
        let mut tracker = PhaseTracker::new(path.display().to_string());

        tracker.advance(Phase::Probing)?;
        let current = self.store.read(path).await?;

        let diff = self
            .diff_engine
            .file_diff(path, current.as_deref(), &desired.content);
        let plan = ReconcilePlan::from_diff(diff, mode);
        tracker.advance(plan.phase_after_probe())?;

        match plan.action {
            PlannedAction::Noop => {
                info!("File already up to date: {}", path.display());
            }
            PlannedAction::Report => {
                tracker.advance(Phase::CheckReported)?;
                info!("Would write {} bytes to: {}", desired.content.len(), path.display());
            }
            PlannedAction::Apply => {
                tracker.advance(Phase::Applying)?;
                match self.store.write(path, desired.content.as_bytes()).await {
                    Ok(report) => {
                        for dir in &report.created_dirs {
                            info!("Created directory: {}", dir.display());
                        }
                        info!("Wrote {} bytes to: {}", report.bytes_written, path.display());
                        tracker.advance(Phase::Applied)?;
                    }
                    Err(e) => {
                        tracker.advance(Phase::Failed)?;
                        error!("Failed to write {}: {e}", path.display());
                        return Err(e);
                    }
                }
            }
        }

        Ok(ReconcileResult {
            changed: plan.diff.has_changes(),
            diff: plan.diff.diff,
            resource: FileFields {
                path: desired.path.clone(),
                size: desired.content.len(),
                checksum: self.hasher.checksum(desired.content.as_bytes()),
            },
            phase: tracker.phase(),
        })
    }
}
