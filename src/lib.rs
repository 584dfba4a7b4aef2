// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is reported
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness
#![warn(unused_imports)]              // Unused imports are reported
#![warn(unused_variables)]            // Unused variables are reported
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// Test code may unwrap and panic freely.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Converge Units
//!
//! Idempotent state reconcilers for a configuration-management engine.
//!
//! ## Overview
//!
//! Each invocation converges exactly one resource:
//!
//! - A **text file** whose content must match a declared string byte for byte
//! - A **cloud instance** (Yandex Cloud) that must exist under a given name
//!
//! Both follow the same flow: load the desired state, probe the current
//! state, diff, then either report the change (check mode) or apply it, and
//! emit a structured result with a before/after diff.
//!
//! ## Modules
//!
//! - [`config`]: Desired-state types, task documents and validation
//! - [`filesystem`]: File store backends (local, in-memory)
//! - [`yc`]: `yc` CLI client and provisioning
//! - [`planner`]: Diff computation and phase tracking
//! - [`reconciler`]: File and instance reconcilers
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! check_mode: false
//! task:
//!   module: instance
//!   args:
//!     name: demo
//!     folder_id: b1g0000000000000000
//!     zone: ru-central1-a
//!     subnet_id: e9b0000000000000000
//!     image_id: fd80000000000000000
//!     cores: 2
//!     memory_gb: 2
//!     ssh_key: ~/.ssh/id_ed25519.pub
//! ```
//!
//! An instance that already exists is left untouched even if its size
//! differs from the task: reconciliation covers existence only.

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod planner;
pub mod reconciler;
pub mod yc;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{DesiredFileState, DesiredInstanceSpec, InputValidator, Invocation, TaskParser};
pub use error::{ConvergeError, Result};
pub use filesystem::{FileStore, LocalFileStore, MemoryFileStore};
pub use planner::{DiffEngine, ExecutionMode, Phase};
pub use reconciler::{
    FileContentReconciler, InstanceReconciler, ReconcileResult, TaskOutcome, reconcile_task,
};
pub use yc::{ObservedInstance, ProvisionerClient, YcCli, YcProvisioner};
