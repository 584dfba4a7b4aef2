//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{CoreFraction, DesiredInstanceSpec, DiskType, InstanceState, PlatformId};

/// Converge - idempotent file and cloud instance reconcilers.
#[derive(Parser, Debug)]
#[command(name = "converge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Result format (text, json).
    #[arg(long, global = true, default_value = "json", env = "CONVERGE_OUTPUT")]
    pub output: OutputFormat,

    /// Log format on stderr (text, json).
    #[arg(long, global = true, default_value = "text", env = "CONVERGE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ensure a text file has exactly the given content.
    File {
        /// Absolute path of the file.
        #[arg(long)]
        path: PathBuf,

        /// Desired content.
        #[arg(long)]
        content: String,

        /// Report the change without writing.
        #[arg(long)]
        check: bool,
    },

    /// Ensure a cloud instance with the given name exists.
    Instance {
        /// Instance specification.
        #[command(flatten)]
        spec: InstanceArgs,

        /// Report the change without creating anything.
        #[arg(long)]
        check: bool,

        /// Seconds to poll for a public address after creation (0 disables).
        #[arg(long, default_value = "0", env = "CONVERGE_WAIT_ADDRESS_SECS")]
        wait_address_secs: u64,
    },

    /// Reconcile the task described in a YAML or JSON document.
    Run {
        /// Path to the task document.
        task: PathBuf,

        /// Force check mode regardless of the document.
        #[arg(long)]
        check: bool,

        /// Seconds to poll for a public address after creation (0 disables).
        #[arg(long, default_value = "0", env = "CONVERGE_WAIT_ADDRESS_SECS")]
        wait_address_secs: u64,
    },

    /// Parse and validate a task document without touching anything.
    Validate {
        /// Path to the task document.
        task: PathBuf,
    },
}

/// Instance specification flags.
#[derive(Args, Debug, Clone)]
pub struct InstanceArgs {
    /// Instance name.
    #[arg(long)]
    pub name: String,

    /// Folder ID.
    #[arg(long, env = "CONVERGE_YC_FOLDER_ID")]
    pub folder_id: Option<String>,

    /// Availability zone.
    #[arg(long, env = "CONVERGE_YC_ZONE")]
    pub zone: Option<String>,

    /// Subnet ID of the primary interface.
    #[arg(long, env = "CONVERGE_YC_SUBNET_ID")]
    pub subnet_id: Option<String>,

    /// Boot disk image ID.
    #[arg(long, env = "CONVERGE_YC_IMAGE_ID")]
    pub image_id: Option<String>,

    /// Platform (standard-v1, standard-v2, standard-v3).
    #[arg(long, default_value = "standard-v2")]
    pub platform_id: PlatformId,

    /// Number of vCPUs.
    #[arg(long, default_value = "2")]
    pub cores: u32,

    /// RAM in GB.
    #[arg(long, default_value = "2")]
    pub memory_gb: u32,

    /// Boot disk size in GB.
    #[arg(long, default_value = "10")]
    pub disk_gb: u32,

    /// Boot disk type (network-hdd, network-ssd, network-ssd-nonreplicated).
    #[arg(long, default_value = "network-hdd")]
    pub disk_type: DiskType,

    /// Guaranteed vCPU share in percent (5, 20, 50, 100).
    #[arg(long, default_value = "5")]
    pub core_fraction: CoreFraction,

    /// Create a preemptible instance.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preemptible: bool,

    /// Attach a public IPv4 address.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub nat: bool,

    /// SSH public key file (`/...` or `~/...`) or literal `user:ssh-... key`.
    #[arg(long, env = "CONVERGE_SSH_KEY")]
    pub ssh_key: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for the hosting engine.
    #[default]
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    #[default]
    Text,
    /// One JSON object per log event.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl InstanceArgs {
    /// Converts the flags into a desired spec. Missing location fields stay
    /// empty and are rejected by validation.
    #[must_use]
    pub fn into_spec(self) -> DesiredInstanceSpec {
        DesiredInstanceSpec {
            state: InstanceState::Present,
            name: self.name,
            folder_id: self.folder_id.unwrap_or_default(),
            zone: self.zone.unwrap_or_default(),
            subnet_id: self.subnet_id.unwrap_or_default(),
            image_id: self.image_id.unwrap_or_default(),
            platform_id: self.platform_id,
            cores: self.cores,
            memory_gb: self.memory_gb,
            disk_gb: self.disk_gb,
            disk_type: self.disk_type,
            core_fraction: self.core_fraction,
            preemptible: self.preemptible,
            nat: self.nat,
            ssh_key: self.ssh_key,
        }
    }
}
