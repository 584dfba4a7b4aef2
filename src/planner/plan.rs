//! Reconciliation plan and phase tracking.
//!
//! A reconcile call walks a fixed state machine:
//!
//! ```text
//! Init -> Probing -> Unchanged
//!                 -> Diffing -> CheckReported
//!                            -> Applying -> Applied
//!                                        -> Failed
//! ```

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::{ConvergeError, Result};

use super::diff::ResourceDiff;

/// Whether changes are applied or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Report the would-be change without mutating anything.
    Check,
    /// Apply the change.
    #[default]
    Apply,
}

/// Phase of a single reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing done yet.
    Init,
    /// Reading the current state.
    Probing,
    /// Current state matches; terminal.
    Unchanged,
    /// A change is required.
    Diffing,
    /// Change reported in check mode; terminal.
    CheckReported,
    /// Change being applied.
    Applying,
    /// Change applied; terminal.
    Applied,
    /// Applying failed; terminal.
    Failed,
}

/// Action chosen for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedAction {
    /// Nothing to do.
    Noop,
    /// Report the change only.
    Report,
    /// Apply the change.
    Apply,
}

/// Plan for one resource: its diff and the action to take.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// Computed diff.
    pub diff: ResourceDiff,
    /// Action to take.
    pub action: PlannedAction,
}

/// Tracks and validates phase transitions of one reconcile call.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    resource: String,
    phase: Phase,
}

impl ExecutionMode {
    /// Maps a `check_mode` flag to a mode.
    #[must_use]
    pub const fn from_check_flag(check_mode: bool) -> Self {
        if check_mode { Self::Check } else { Self::Apply }
    }

    /// Returns true in check mode.
    #[must_use]
    pub const fn is_check(self) -> bool {
        matches!(self, Self::Check)
    }
}

impl Phase {
    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Unchanged | Self::CheckReported | Self::Applied | Self::Failed
        )
    }

    /// Returns true if `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Probing)
                | (Self::Probing, Self::Unchanged | Self::Diffing)
                | (Self::Diffing, Self::CheckReported | Self::Applying)
                | (Self::Applying, Self::Applied | Self::Failed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Probing => "probing",
            Self::Unchanged => "unchanged",
            Self::Diffing => "diffing",
            Self::CheckReported => "check_reported",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl ReconcilePlan {
    /// Creates a plan from a diff and the execution mode.
    #[must_use]
    pub fn from_diff(diff: ResourceDiff, mode: ExecutionMode) -> Self {
        let action = if !diff.has_changes() {
            PlannedAction::Noop
        } else if mode.is_check() {
            PlannedAction::Report
        } else {
            PlannedAction::Apply
        };

        Self { diff, action }
    }

    /// Returns the phase that follows `Probing` for this plan.
    #[must_use]
    pub fn phase_after_probe(&self) -> Phase {
        if self.action == PlannedAction::Noop {
            Phase::Unchanged
        } else {
            Phase::Diffing
        }
    }
}

impl PhaseTracker {
    /// Starts tracking a resource in `Init`.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            phase: Phase::Init,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the transition is not allowed.
    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(ConvergeError::internal(format!(
                "{} already finished as {}, cannot move to {next}",
                self.resource, self.phase
            )));
        }
        if !self.phase.can_transition_to(next) {
            return Err(ConvergeError::internal(format!(
                "illegal phase transition for {}: {} -> {next}",
                self.resource, self.phase
            )));
        }

        debug!("{}: {} -> {next}", self.resource, self.phase);
        self.phase = next;
        Ok(())
    }
}
