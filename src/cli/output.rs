//! Output formatting for CLI commands.
//!
//! Results go to stdout; JSON is the format the hosting engine consumes.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::error::{ConvergeError, Result};
use crate::planner::{Diff, Phase};
use crate::reconciler::{FileFields, InstanceFields, ReconcileResult, TaskOutcome};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Instance row for table display.
#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Public IP")]
    ip_address: String,
    #[tabled(rename = "Internal IP")]
    internal_ip: String,
}

/// Failure document for JSON output.
#[derive(Serialize)]
struct FailureJson<'a> {
    failed: bool,
    msg: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rc: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<&'a str>,
}

/// Validation report for JSON output.
#[derive(Serialize)]
struct ValidationJson<'a> {
    valid: bool,
    module: &'a str,
    warnings: &'a [String],
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a reconcile outcome.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the outcome cannot be serialized, e.g. a
    /// path that is not valid UTF-8.
    pub fn format_outcome(&self, outcome: &TaskOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).map_err(|e| {
                ConvergeError::internal(format!(
                    "failed to serialize result (changed: {}, phase: {}): {e}",
                    outcome.changed(),
                    outcome.phase()
                ))
            }),
            OutputFormat::Text => Ok(match outcome {
                TaskOutcome::File(result) => Self::format_file_text(result),
                TaskOutcome::Instance(result) => Self::format_instance_text(result),
            }),
        }
    }

    /// Formats a failure.
    #[must_use]
    pub fn format_failure(&self, err: &ConvergeError) -> String {
        let output = err.tool_output();

        match self.format {
            OutputFormat::Json => {
                let failure = FailureJson {
                    failed: true,
                    msg: err.to_string(),
                    kind: err.kind(),
                    rc: output.and_then(|o| o.exit_code),
                    stdout: output.map(|o| o.stdout.as_str()),
                    stderr: output.map(|o| o.stderr.as_str()),
                };
                serde_json::to_string_pretty(&failure).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut text = format!("{} {} ({})\n", "✗".red(), err, err.kind());
                if let Some(output) = output {
                    let stderr = output.stderr.trim();
                    if !stderr.is_empty() {
                        let _ = writeln!(text, "\n{}", "stderr:".dimmed());
                        for line in stderr.lines() {
                            let _ = writeln!(text, "   {line}");
                        }
                    }
                }
                text
            }
        }
    }

    /// Formats the result of validating a task document.
    #[must_use]
    pub fn format_validation(&self, module: &str, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson {
                valid: result.is_valid(),
                module,
                warnings: &result.warnings,
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut text = format!("{} {module} task is valid\n", "✓".green());
                if !result.warnings.is_empty() {
                    let _ = writeln!(text, "\n{}", "Warnings:".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(text, "   - {warning}");
                    }
                }
                text
            }
        }
    }

    fn format_file_text(result: &ReconcileResult<FileFields>) -> String {
        let path = result.resource.path.display().to_string();
        let mut text = format!(
            "{} {}\n   size: {} bytes, sha256: {}\n",
            Self::status_marker(result.changed, result.phase),
            path.bold(),
            result.resource.size,
            result.resource.checksum
        );

        if let Some(diff) = &result.diff {
            text.push('\n');
            text.push_str(&Self::format_diff(diff));
        }
        text
    }

    fn format_instance_text(result: &ReconcileResult<InstanceFields>) -> String {
        let fields = &result.resource;
        let mut text = format!(
            "{} instance {}\n\n",
            Self::status_marker(result.changed, result.phase),
            fields.name.bold()
        );

        let row = InstanceRow {
            name: fields.name.clone(),
            id: fields.id.clone().unwrap_or_else(|| String::from("-")),
            status: fields
                .status
                .map_or_else(|| String::from("-"), |s| s.to_string()),
            ip_address: fields.ip_address.clone().unwrap_or_else(|| String::from("-")),
            internal_ip: fields.internal_ip.clone().unwrap_or_else(|| String::from("-")),
        };
        text.push_str(&Table::new([row]).to_string());
        text.push('\n');
        text
    }

    fn status_marker(changed: bool, phase: Phase) -> String {
        match (changed, phase) {
            (false, _) => format!("{} ok", "✓".green()),
            (true, Phase::CheckReported) => format!("{} would change", "~".yellow()),
            (true, _) => format!("{} changed", "+".yellow()),
        }
    }

    fn format_diff(diff: &Diff) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{}", format!("--- {}", diff.before_header).red());
        let _ = writeln!(text, "{}", format!("+++ {}", diff.after_header).green());
        for line in diff.before.lines() {
            let _ = writeln!(text, "{}", format!("-{line}").red());
        }
        for line in diff.after.lines() {
            let _ = writeln!(text, "{}", format!("+{line}").green());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionerError;
    use crate::yc::CommandOutput;
    use std::path::PathBuf;

    fn file_outcome(changed: bool) -> TaskOutcome {
        TaskOutcome::File(ReconcileResult {
            changed,
            diff: changed.then(|| Diff {
                before: String::new(),
                after: String::from("hello"),
                before_header: String::from("/tmp/hello.txt"),
                after_header: String::from("/tmp/hello.txt"),
            }),
            resource: FileFields {
                path: PathBuf::from("/tmp/hello.txt"),
                size: 5,
                checksum: String::from("2cf24dba"),
            },
            phase: if changed { Phase::Applied } else { Phase::Unchanged },
        })
    }

    #[test]
    fn test_json_outcome() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_outcome(&file_outcome(true)).unwrap()).unwrap();

        assert_eq!(json["changed"], true);
        assert_eq!(json["path"], "/tmp/hello.txt");
        assert_eq!(json["size"], 5);
        assert_eq!(json["diff"]["after"], "hello");
        assert_eq!(json["diff"]["before"], "");
    }

    #[cfg(unix)]
    #[test]
    fn test_unserializable_path_is_a_failure() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let formatter = OutputFormatter::new(OutputFormat::Json);
        let mut outcome = file_outcome(true);
        if let TaskOutcome::File(result) = &mut outcome {
            result.resource.path = PathBuf::from(OsStr::from_bytes(b"/tmp/\xff.txt"));
        }

        let err = formatter.format_outcome(&outcome).unwrap_err();
        assert_eq!(err.kind(), "InternalError");
        assert!(err.to_string().contains("changed: true"));

        let failure: serde_json::Value =
            serde_json::from_str(&formatter.format_failure(&err)).unwrap();
        assert_eq!(failure["failed"], true);
    }

    #[test]
    fn test_json_failure_carries_tool_output() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let err: ConvergeError = ProvisionerError::create(
            "demo",
            "exit status 1",
            Some(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: String::from("ERROR: quota exceeded"),
            }),
        )
        .into();

        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_failure(&err)).unwrap();

        assert_eq!(json["failed"], true);
        assert_eq!(json["kind"], "ProvisionerCreateError");
        assert_eq!(json["rc"], 1);
        assert_eq!(json["stderr"], "ERROR: quota exceeded");
    }

    #[test]
    fn test_json_failure_without_tool_output() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let err = ConvergeError::internal("boom");

        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_failure(&err)).unwrap();

        assert_eq!(json["kind"], "InternalError");
        assert!(json.get("stderr").is_none());
    }

    #[test]
    fn test_text_outcome_shows_diff() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);

        let changed = formatter.format_outcome(&file_outcome(true)).unwrap();
        assert!(changed.contains("changed"));
        assert!(changed.contains("+hello"));

        let unchanged = formatter.format_outcome(&file_outcome(false)).unwrap();
        assert!(unchanged.contains("ok"));
        assert!(!unchanged.contains("+++"));
    }
}
