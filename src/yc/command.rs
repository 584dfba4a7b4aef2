//! Argument builders for `yc compute instance` commands.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{CoreFraction, DesiredInstanceSpec, DiskType, PlatformId};

/// User prepended to literal keys that carry no user part.
const DEFAULT_SSH_USER: &str = "yc-user";

/// Placeholder for secrets in rendered command lines.
const REDACTED: &str = "<redacted>";

/// Where the SSH public key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SshKeySource {
    /// Public key file, passed with `--ssh-key`.
    File(PathBuf),
    /// Literal `user:key` entry, passed as `ssh-keys` metadata.
    Literal(String),
}

impl SshKeySource {
    /// Classifies a raw `ssh_key` value.
    ///
    /// Values starting with `/` or `~/` are key files, `~` being expanded with
    /// `home`. Anything else is a literal key.
    #[must_use]
    pub fn parse(raw: &str, home: Option<&Path>) -> Self {
        let raw = raw.trim();

        if raw.starts_with('/') {
            return Self::File(PathBuf::from(raw));
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return Self::File(
                home.map_or_else(|| PathBuf::from(raw), |home| home.join(rest)),
            );
        }

        let first_word = raw.split_whitespace().next().unwrap_or_default();
        if first_word.contains(':') {
            Self::Literal(raw.to_string())
        } else {
            Self::Literal(format!("{DEFAULT_SSH_USER}:{raw}"))
        }
    }
}

impl fmt::Debug for SshKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Literal(_) => f.debug_tuple("Literal").field(&REDACTED).finish(),
        }
    }
}

/// Arguments of `yc compute instance list`.
#[must_use]
pub fn list_instances_args(folder_id: &str) -> Vec<String> {
    [
        "compute",
        "instance",
        "list",
        "--folder-id",
        folder_id,
        "--format",
        "json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Command to create an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceCommand {
    /// Instance name.
    pub name: String,
    /// Folder ID.
    pub folder_id: String,
    /// Availability zone.
    pub zone: String,
    /// Platform.
    pub platform_id: PlatformId,
    /// vCPU count.
    pub cores: u32,
    /// RAM in GB.
    pub memory_gb: u32,
    /// Guaranteed vCPU share.
    pub core_fraction: CoreFraction,
    /// Boot disk size in GB.
    pub disk_gb: u32,
    /// Boot disk type.
    pub disk_type: DiskType,
    /// Boot disk image.
    pub image_id: String,
    /// Subnet of the primary interface.
    pub subnet_id: String,
    /// Attach a public address.
    pub nat: bool,
    /// Preemptible instance.
    pub preemptible: bool,
    /// SSH key.
    pub ssh_key: Option<SshKeySource>,
}

impl CreateInstanceCommand {
    /// Builds the command from a desired spec.
    pub fn from_spec(spec: &DesiredInstanceSpec, home: Option<&Path>) -> Self {
        Self {
            name: spec.name.clone(),
            folder_id: spec.folder_id.clone(),
            zone: spec.zone.clone(),
            platform_id: spec.platform_id,
            cores: spec.cores,
            memory_gb: spec.memory_gb,
            core_fraction: spec.core_fraction,
            disk_gb: spec.disk_gb,
            disk_type: spec.disk_type,
            image_id: spec.image_id.clone(),
            subnet_id: spec.subnet_id.clone(),
            nat: spec.nat,
            preemptible: spec.preemptible,
            ssh_key: spec
                .ssh_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .map(|key| SshKeySource::parse(key, home)),
        }
    }

    /// Returns the CLI arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.build_args(false)
    }

    /// Returns the CLI arguments with secrets replaced, for logging.
    #[must_use]
    pub fn to_redacted_args(&self) -> Vec<String> {
        self.build_args(true)
    }

    fn build_args(&self, redact: bool) -> Vec<String> {
        let mut args: Vec<String> = ["compute", "instance", "create"]
            .into_iter()
            .map(String::from)
            .collect();

        let mut push = |flag: &str, value: String| {
            args.push(flag.to_string());
            args.push(value);
        };

        push("--name", self.name.clone());
        push("--folder-id", self.folder_id.clone());
        push("--zone", self.zone.clone());
        push("--platform-id", self.platform_id.to_string());
        push("--cores", self.cores.to_string());
        push("--memory", format!("{}GB", self.memory_gb));
        push("--core-fraction", self.core_fraction.to_string());
        push(
            "--create-boot-disk",
            format!(
                "size={}GB,type={},image-id={}",
                self.disk_gb, self.disk_type, self.image_id
            ),
        );

        let mut nic = format!("subnet-id={}", self.subnet_id);
        if self.nat {
            nic.push_str(",nat-ip-version=ipv4");
        }
        push("--network-interface", nic);

        match &self.ssh_key {
            Some(SshKeySource::File(path)) => push("--ssh-key", path.display().to_string()),
            Some(SshKeySource::Literal(entry)) => {
                let entry = if redact { REDACTED } else { entry.as_str() };
                push("--metadata", format!("ssh-keys={entry}"));
            }
            None => {}
        }

        if self.preemptible {
            args.push(String::from("--preemptible"));
        }

        args.push(String::from("--format"));
        args.push(String::from("json"));
        args
    }
}

impl fmt::Display for CreateInstanceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "yc {}", self.to_redacted_args().join(" "))
    }
}
