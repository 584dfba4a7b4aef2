//! Planning module for reconcile calls.
//!
//! This module compares desired and current state and decides, per
//! execution mode, whether a change is reported, applied, or skipped.

mod diff;
mod plan;

pub use diff::{Diff, DiffEngine, DiffType, ResourceDiff};
pub use plan::{ExecutionMode, Phase, PhaseTracker, PlannedAction, ReconcilePlan};
