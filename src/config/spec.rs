//! Desired-state types for the reconcilers.
//!
//! These structs map to the `args` section of a task document and fully
//! describe what a single invocation should converge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A task document as handed over by the hosting engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    /// Report the would-be change without mutating anything.
    #[serde(default)]
    pub check_mode: bool,
    /// The resource declaration to reconcile.
    pub task: TaskArgs,
}

/// Resource declaration, tagged by reconciler module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "module", content = "args", rename_all = "snake_case")]
pub enum TaskArgs {
    /// Text file content.
    File(DesiredFileState),
    /// Cloud virtual machine.
    Instance(DesiredInstanceSpec),
}

/// Desired content of a text file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesiredFileState {
    /// Absolute path of the file to create or overwrite.
    pub path: PathBuf,
    /// Exact content; compared byte for byte.
    pub content: String,
}

/// Desired state of an instance. Only `present` is supported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    /// The instance must exist.
    #[default]
    Present,
}

/// Platform (CPU generation) of an instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformId {
    /// Intel Broadwell.
    StandardV1,
    /// Intel Cascade Lake.
    #[default]
    StandardV2,
    /// Intel Ice Lake.
    StandardV3,
}

/// Boot disk type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DiskType {
    /// Network HDD.
    #[default]
    NetworkHdd,
    /// Network SSD.
    NetworkSsd,
    /// Non-replicated network SSD.
    NetworkSsdNonreplicated,
}

/// Guaranteed vCPU share in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum CoreFraction {
    /// 5% of a core.
    #[default]
    Five,
    /// 20% of a core.
    Twenty,
    /// 50% of a core.
    Fifty,
    /// A full core.
    Hundred,
}

/// Desired specification of a cloud instance.
///
/// `name` is the only identity key. Every other field is used at creation
/// time only: an existing instance whose spec differs is left as it is.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesiredInstanceSpec {
    /// Desired state.
    #[serde(default)]
    pub state: InstanceState,
    /// Instance name, unique within the folder.
    #[serde(default)]
    pub name: String,
    /// Folder that contains the instance.
    #[serde(default)]
    pub folder_id: String,
    /// Availability zone (e.g. `ru-central1-a`).
    #[serde(default)]
    pub zone: String,
    /// Subnet of the primary network interface.
    #[serde(default)]
    pub subnet_id: String,
    /// Boot disk image.
    #[serde(default)]
    pub image_id: String,
    /// Platform (CPU generation).
    #[serde(default)]
    pub platform_id: PlatformId,
    /// Number of vCPUs.
    #[serde(default = "default_cores")]
    pub cores: u32,
    /// RAM size in GB.
    #[serde(default = "default_memory_gb")]
    pub memory_gb: u32,
    /// Boot disk size in GB.
    #[serde(default = "default_disk_gb")]
    pub disk_gb: u32,
    /// Boot disk type.
    #[serde(default)]
    pub disk_type: DiskType,
    /// Guaranteed vCPU performance.
    #[serde(default)]
    pub core_fraction: CoreFraction,
    /// Create a preemptible instance.
    #[serde(default = "default_true")]
    pub preemptible: bool,
    /// Attach a public IPv4 address via NAT.
    #[serde(default = "default_true")]
    pub nat: bool,
    /// SSH public key: a path to a key file or a literal `user:ssh-rsa ...`.
    #[serde(default)]
    pub ssh_key: Option<String>,
}

/// Settings of the external provisioner CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// CLI binary to run.
    pub binary: PathBuf,
    /// Optional CLI profile.
    pub profile: Option<String>,
    /// Seconds to poll for a public address after creation; 0 disables.
    pub address_wait_secs: u64,
}

// Default value functions

const fn default_cores() -> u32 {
    2
}

const fn default_memory_gb() -> u32 {
    2
}

const fn default_disk_gb() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yc"),
            profile: None,
            address_wait_secs: 0,
        }
    }
}

impl fmt::Debug for DesiredInstanceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredInstanceSpec")
            .field("state", &self.state)
            .field("name", &self.name)
            .field("folder_id", &self.folder_id)
            .field("zone", &self.zone)
            .field("subnet_id", &self.subnet_id)
            .field("image_id", &self.image_id)
            .field("platform_id", &self.platform_id)
            .field("cores", &self.cores)
            .field("memory_gb", &self.memory_gb)
            .field("disk_gb", &self.disk_gb)
            .field("disk_type", &self.disk_type)
            .field("core_fraction", &self.core_fraction)
            .field("preemptible", &self.preemptible)
            .field("nat", &self.nat)
            .field("ssh_key", &self.ssh_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl DesiredInstanceSpec {
    /// Creates a spec with the default sizing.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        folder_id: impl Into<String>,
        zone: impl Into<String>,
        subnet_id: impl Into<String>,
        image_id: impl Into<String>,
    ) -> Self {
        Self {
            state: InstanceState::Present,
            name: name.into(),
            folder_id: folder_id.into(),
            zone: zone.into(),
            subnet_id: subnet_id.into(),
            image_id: image_id.into(),
            platform_id: PlatformId::default(),
            cores: default_cores(),
            memory_gb: default_memory_gb(),
            disk_gb: default_disk_gb(),
            disk_type: DiskType::default(),
            core_fraction: CoreFraction::default(),
            preemptible: true,
            nat: true,
            ssh_key: None,
        }
    }
}

// Enum string conversions

impl PlatformId {
    /// Returns the identifier understood by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StandardV1 => "standard-v1",
            Self::StandardV2 => "standard-v2",
            Self::StandardV3 => "standard-v3",
        }
    }
}

impl DiskType {
    /// Returns the identifier understood by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkHdd => "network-hdd",
            Self::NetworkSsd => "network-ssd",
            Self::NetworkSsdNonreplicated => "network-ssd-nonreplicated",
        }
    }
}

impl CoreFraction {
    /// Returns the share in percent.
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CoreFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.percent())
    }
}

impl FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard-v1" => Ok(Self::StandardV1),
            "standard-v2" => Ok(Self::StandardV2),
            "standard-v3" => Ok(Self::StandardV3),
            other => Err(format!(
                "Invalid platform: {other}. Expected: standard-v1, standard-v2, or standard-v3"
            )),
        }
    }
}

impl FromStr for DiskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network-hdd" => Ok(Self::NetworkHdd),
            "network-ssd" => Ok(Self::NetworkSsd),
            "network-ssd-nonreplicated" => Ok(Self::NetworkSsdNonreplicated),
            other => Err(format!(
                "Invalid disk type: {other}. Expected: network-hdd, network-ssd, or network-ssd-nonreplicated"
            )),
        }
    }
}

impl TryFrom<u8> for CoreFraction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            20 => Ok(Self::Twenty),
            50 => Ok(Self::Fifty),
            100 => Ok(Self::Hundred),
            other => Err(format!("core_fraction must be one of 5, 20, 50, 100 (got {other})")),
        }
    }
}

impl From<CoreFraction> for u8 {
    fn from(fraction: CoreFraction) -> Self {
        fraction.percent()
    }
}

impl FromStr for CoreFraction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u8>()
            .map_err(|_| format!("Invalid core fraction: {s}"))?;
        Self::try_from(value)
    }
}
