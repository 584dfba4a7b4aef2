//! Error types for the converge reconcilers.
//!
//! Every failure carries enough context to diagnose it without re-running in
//! verbose mode: the file path or instance name, and for provisioner failures
//! the raw output of the external tool.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::yc::CommandOutput;

/// The main error type for the converge reconcilers.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// Malformed path or instance spec.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Task document or environment configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Permission or IO failure on the target file.
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// External provisioner failures.
    #[error("Provisioner error: {0}")]
    Provisioner(#[from] ProvisionerError),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InputError {
    /// The target path is empty or not absolute.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A field of the desired state failed validation.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// Field path that failed validation.
        field: String,
        /// Description of the failure.
        message: String,
    },
}

/// Task document and environment configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The task file was not found.
    #[error("Task file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The task file could not be parsed.
    #[error("Failed to parse task: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },
}

/// Filesystem errors on the reconciled file.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Reading the current content failed.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Creating a parent directory failed.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or replacing the file failed.
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// External provisioner errors.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// The CLI binary could not be launched.
    #[error(
        "Cannot {operation} instance '{name}': {binary} CLI not found. Install it and run `yc init` (or configure a service account) first"
    )]
    BinaryNotFound {
        /// Binary that was looked up.
        binary: String,
        /// Instance name being reconciled.
        name: String,
        /// Call that needed the binary.
        operation: ProvisionerOperation,
    },

    /// Looking up the instance failed.
    #[error("Failed to look up instance '{name}': {message}")]
    QueryFailed {
        /// Instance name being looked up.
        name: String,
        /// Description of the failure.
        message: String,
        /// Raw tool output, when the tool ran.
        output: Option<CommandOutput>,
    },

    /// Creating the instance failed or returned unusable output.
    #[error("Failed to create instance '{name}': {message}")]
    CreateFailed {
        /// Instance name being created.
        name: String,
        /// Description of the failure.
        message: String,
        /// Raw tool output, when the tool ran.
        output: Option<CommandOutput>,
    },
}

/// Provisioner call an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionerOperation {
    /// Looking up an instance by name.
    Query,
    /// Creating an instance.
    Create,
}

impl fmt::Display for ProvisionerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("look up"),
            Self::Create => f.write_str("create"),
        }
    }
}

/// Result type alias for converge operations.
pub type Result<T> = std::result::Result<T, ConvergeError>;

impl ConvergeError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the error taxonomy name reported to the hosting engine.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInputError",
            Self::Config(_) => "ConfigError",
            Self::Filesystem(_) => "FilesystemError",
            Self::Provisioner(
                ProvisionerError::CreateFailed { .. }
                | ProvisionerError::BinaryNotFound {
                    operation: ProvisionerOperation::Create,
                    ..
                },
            ) => "ProvisionerCreateError",
            Self::Provisioner(_) => "ProvisionerQueryError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Returns the raw output of the external tool, if this error carries one.
    #[must_use]
    pub const fn tool_output(&self) -> Option<&CommandOutput> {
        match self {
            Self::Provisioner(
                ProvisionerError::QueryFailed { output, .. }
                | ProvisionerError::CreateFailed { output, .. },
            ) => output.as_ref(),
            _ => None,
        }
    }
}

impl InputError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ProvisionerError {
    /// Creates a query error, optionally carrying the tool output.
    #[must_use]
    pub fn query(
        name: impl Into<String>,
        message: impl Into<String>,
        output: Option<CommandOutput>,
    ) -> Self {
        Self::QueryFailed {
            name: name.into(),
            message: message.into(),
            output,
        }
    }

    /// Creates a create error, optionally carrying the tool output.
    #[must_use]
    pub fn create(
        name: impl Into<String>,
        message: impl Into<String>,
        output: Option<CommandOutput>,
    ) -> Self {
        Self::CreateFailed {
            name: name.into(),
            message: message.into(),
            output,
        }
    }
}
