//! Reconcilers for converging resources to their desired state.
//!
//! Each reconciler borrows the capability it needs (a [`FileStore`] or a
//! [`ProvisionerClient`]) and handles exactly one resource per call:
//! probe, diff, then report or apply depending on the execution mode.

mod file;
mod instance;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::TaskArgs;
use crate::error::Result;
use crate::filesystem::FileStore;
use crate::planner::{Diff, ExecutionMode, Phase};
use crate::yc::{InstanceStatus, ProvisionerClient};

pub use file::FileContentReconciler;
pub use instance::InstanceReconciler;

/// Result of one reconcile call.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResult<T> {
    /// Whether the resource differed from its desired state.
    pub changed: bool,
    /// Before/after rendering, present when changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    /// Resource-specific fields.
    #[serde(flatten)]
    pub resource: T,
    /// Terminal phase of the call.
    #[serde(skip)]
    pub phase: Phase,
}

/// Resource fields reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFields {
    /// Target path.
    pub path: PathBuf,
    /// Byte length of the desired content.
    pub size: usize,
    /// SHA-256 hex digest of the desired content.
    pub checksum: String,
}

/// Resource fields reported for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceFields {
    /// Instance name.
    pub name: String,
    /// Instance ID; absent in check mode when the instance does not exist.
    pub id: Option<String>,
    /// Public NAT address.
    pub ip_address: Option<String>,
    /// Internal address.
    pub internal_ip: Option<String>,
    /// Instance status.
    pub status: Option<InstanceStatus>,
}

/// Result of reconciling any task.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskOutcome {
    /// File task result.
    File(ReconcileResult<FileFields>),
    /// Instance task result.
    Instance(ReconcileResult<InstanceFields>),
}

impl TaskOutcome {
    /// Returns whether the resource changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        match self {
            Self::File(result) => result.changed,
            Self::Instance(result) => result.changed,
        }
    }

    /// Returns the terminal phase of the call.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::File(result) => result.phase,
            Self::Instance(result) => result.phase,
        }
    }
}

/// Reconciles a parsed task with the given capabilities.
///
/// # Errors
///
/// Returns the error of the underlying reconciler.
pub async fn reconcile_task<F, P>(
    task: &TaskArgs,
    mode: ExecutionMode,
    store: &F,
    provisioner: &P,
    address_wait: Duration,
) -> Result<TaskOutcome>
where
    F: FileStore + ?Sized,
    P: ProvisionerClient + ?Sized,
{
    match task {
        TaskArgs::File(desired) => FileContentReconciler::new(store)
            .reconcile(desired, mode)
            .await
            .map(TaskOutcome::File),
        TaskArgs::Instance(spec) => InstanceReconciler::new(provisioner)
            .with_address_wait(address_wait)
            .reconcile(spec, mode)
            .await
            .map(TaskOutcome::Instance),
    }
}
