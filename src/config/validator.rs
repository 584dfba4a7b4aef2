//! Validation of desired state before any probe or mutation.

use crate::error::{ConvergeError, InputError, Result};
use tracing::debug;

use super::spec::{CoreFraction, DesiredFileState, DesiredInstanceSpec, InstanceState};

/// Maximum instance name length accepted by the cloud.
const MAX_NAME_LEN: usize = 63;

/// Validator for desired state.
#[derive(Debug, Default)]
pub struct InputValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl InputValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a desired file state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the path is empty or not absolute.
    pub fn validate_file(&self, desired: &DesiredFileState) -> Result<ValidationResult> {
        let reason = if desired.path.as_os_str().is_empty() {
            Some("path cannot be empty")
        } else if !desired.path.is_absolute() {
            Some("path must be absolute")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ConvergeError::InvalidInput(InputError::InvalidPath {
                path: desired.path.clone(),
                reason: reason.to_string(),
            }));
        }

        Ok(ValidationResult::default())
    }

    /// Validates a desired instance spec.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_instance(&self, spec: &DesiredInstanceSpec) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_identity(spec, &mut result);
        Self::validate_location(spec, &mut result);
        Self::validate_sizing(spec, &mut result);
        Self::collect_warnings(spec, &mut result);

        if let Some(first_error) = result.errors.first() {
            return Err(ConvergeError::InvalidInput(InputError::validation(
                first_error.field.clone(),
                first_error.message.clone(),
            )));
        }

        debug!(
            "Instance spec '{}' passed validation ({} warnings)",
            spec.name,
            result.warnings.len()
        );
        Ok(result)
    }

    fn validate_identity(spec: &DesiredInstanceSpec, result: &mut ValidationResult) {
        // Only `present` exists today; the match breaks when a new state is added.
        match spec.state {
            InstanceState::Present => {}
        }

        if spec.name.is_empty() {
            result.push_error("name", "Instance name cannot be empty");
        } else if !is_valid_name(&spec.name) {
            result.push_error(
                "name",
                format!(
                    "Instance name '{}' is invalid. Must be 1-{MAX_NAME_LEN} lowercase letters, digits or hyphens, starting with a letter.",
                    spec.name
                ),
            );
        }
    }

    fn validate_location(spec: &DesiredInstanceSpec, result: &mut ValidationResult) {
        let required = [
            ("folder_id", &spec.folder_id),
            ("zone", &spec.zone),
            ("subnet_id", &spec.subnet_id),
            ("image_id", &spec.image_id),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                result.push_error(field, format!("{field} is required"));
            }
        }
    }

    fn validate_sizing(spec: &DesiredInstanceSpec, result: &mut ValidationResult) {
        let sizes = [
            ("cores", spec.cores),
            ("memory_gb", spec.memory_gb),
            ("disk_gb", spec.disk_gb),
        ];

        for (field, value) in sizes {
            if value < 1 {
                result.push_error(field, format!("{field} must be >= 1"));
            }
        }
    }

    fn collect_warnings(spec: &DesiredInstanceSpec, result: &mut ValidationResult) {
        if !spec.nat {
            result
                .warnings
                .push(String::from("nat: disabled, no public IP address will be reported"));
        }

        if spec.ssh_key.is_none() {
            result
                .warnings
                .push(String::from("ssh_key: not set, the instance will not accept SSH logins"));
        }

        if spec.preemptible && spec.core_fraction == CoreFraction::Hundred {
            result.warnings.push(String::from(
                "preemptible: a full-core preemptible instance may be stopped at any time",
            ));
        }
    }
}

/// Checks the cloud naming rules: lowercase letter first, then lowercase
/// letters, digits or hyphens, no trailing hyphen.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    let mut chars = name.chars();

    if let Some(first) = chars.next()
        && !first.is_ascii_lowercase()
    {
        return false;
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
