//! Process client for the `yc` CLI.
//!
//! Runs one CLI invocation at a time and captures its output. Authentication
//! is whatever the CLI itself is configured with.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::ProvisionerConfig;

use super::types::CommandOutput;

/// Placeholder for `ssh-keys` metadata in logged command lines.
const REDACTED_SSH_KEYS: &str = "ssh-keys=<redacted>";

/// `yc` CLI client.
#[derive(Debug, Clone)]
pub struct YcCli {
    /// Binary to run.
    binary: PathBuf,
    /// Optional CLI profile.
    profile: Option<String>,
}

impl YcCli {
    /// Creates a client for the given binary.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            profile: None,
        }
    }

    /// Creates a client from the provisioner configuration.
    #[must_use]
    pub fn from_config(config: &ProvisionerConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            profile: config.profile.clone(),
        }
    }

    /// Sets the CLI profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Returns the binary being run.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Returns the full argument list, profile first.
    fn full_args<'a>(&'a self, args: &'a [String]) -> Vec<&'a str> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if let Some(profile) = &self.profile {
            full.push("--profile");
            full.push(profile);
        }
        full.extend(args.iter().map(String::as_str));
        full
    }

    /// Renders a command line for logging, hiding SSH key metadata.
    #[must_use]
    pub fn render(&self, args: &[String]) -> String {
        let rendered: Vec<&str> = self
            .full_args(args)
            .into_iter()
            .map(|arg| {
                if arg.starts_with("ssh-keys=") {
                    REDACTED_SSH_KEYS
                } else {
                    arg
                }
            })
            .collect();

        format!("{} {}", self.binary.display(), rendered.join(" "))
    }

    /// Runs the CLI and captures its output.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::success`].
    ///
    /// # Errors
    ///
    /// Returns the IO error if the process cannot be spawned.
    pub async fn execute(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        debug!("Running: {}", self.render(args));

        let output = Command::new(&self.binary)
            .args(self.full_args(args))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "{} exited with {:?} ({} bytes of output)",
            self.binary.display(),
            result.exit_code,
            result.stdout.len()
        );

        Ok(result)
    }
}
