//! Yandex Cloud CLI types and data structures.
//!
//! This module defines the subset of `yc compute instance ... --format json`
//! output the reconciler relies on, and the observed state derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw result of one CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Returns a short description of the failure for error messages.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        let status = self
            .exit_code
            .map_or_else(|| String::from("terminated by signal"), |code| format!("exit status {code}"));

        if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        }
    }
}

/// A compute instance as printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YcInstance {
    /// Unique instance identifier.
    #[serde(default)]
    pub id: String,
    /// Instance name.
    #[serde(default)]
    pub name: String,
    /// Folder that contains the instance.
    #[serde(default)]
    pub folder_id: String,
    /// Availability zone.
    #[serde(default)]
    pub zone_id: String,
    /// Current status.
    #[serde(default)]
    pub status: InstanceStatus,
    /// Network interfaces, primary first.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

/// Network interface of an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Subnet the interface is attached to.
    #[serde(default)]
    pub subnet_id: String,
    /// IPv4 addressing.
    #[serde(default)]
    pub primary_v4_address: Option<PrimaryAddress>,
}

/// Primary IPv4 address of an interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryAddress {
    /// Internal address.
    #[serde(default)]
    pub address: Option<String>,
    /// One-to-one NAT, present when a public address is attached.
    #[serde(default)]
    pub one_to_one_nat: Option<OneToOneNat>,
}

/// Public address mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneToOneNat {
    /// Public address, absent while it is being allocated.
    #[serde(default)]
    pub address: Option<String>,
}

/// Instance status enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    /// Instance is being provisioned.
    Provisioning,
    /// Instance is running.
    Running,
    /// Instance is stopping.
    Stopping,
    /// Instance is stopped.
    Stopped,
    /// Instance is starting.
    Starting,
    /// Instance is restarting.
    Restarting,
    /// Instance is being updated.
    Updating,
    /// Instance is in an error state.
    Error,
    /// Instance crashed.
    Crashed,
    /// Instance is being deleted.
    Deleting,
    /// Status not reported or not recognized.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Observed state of an existing instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedInstance {
    /// Instance ID.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Availability zone.
    pub zone: String,
    /// Current status.
    pub status: InstanceStatus,
    /// Public NAT address of the primary interface.
    pub ip_address: Option<String>,
    /// Internal address of the primary interface.
    pub internal_ip: Option<String>,
}

impl YcInstance {
    /// Returns the public NAT address of the primary interface.
    #[must_use]
    pub fn public_ip(&self) -> Option<&str> {
        self.primary_address()
            .and_then(|addr| addr.one_to_one_nat.as_ref())
            .and_then(|nat| nat.address.as_deref())
            .filter(|ip| !ip.is_empty())
    }

    /// Returns the internal address of the primary interface.
    #[must_use]
    pub fn internal_ip(&self) -> Option<&str> {
        self.primary_address()
            .and_then(|addr| addr.address.as_deref())
            .filter(|ip| !ip.is_empty())
    }

    fn primary_address(&self) -> Option<&PrimaryAddress> {
        self.network_interfaces
            .first()
            .and_then(|nic| nic.primary_v4_address.as_ref())
    }
}

impl From<&YcInstance> for ObservedInstance {
    fn from(instance: &YcInstance) -> Self {
        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            zone: instance.zone_id.clone(),
            status: instance.status,
            ip_address: instance.public_ip().map(String::from),
            internal_ip: instance.internal_ip().map(String::from),
        }
    }
}

impl InstanceStatus {
    /// Returns the status as printed by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Starting => "STARTING",
            Self::Restarting => "RESTARTING",
            Self::Updating => "UPDATING",
            Self::Error => "ERROR",
            Self::Crashed => "CRASHED",
            Self::Deleting => "DELETING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_INSTANCE: &str = r#"{
        "id": "fhm0b28lgbv4s1m2e0hv",
        "folder_id": "b1g0000000000000000",
        "created_at": "2024-03-01T10:00:00Z",
        "name": "demo",
        "zone_id": "ru-central1-a",
        "platform_id": "standard-v2",
        "status": "RUNNING",
        "network_interfaces": [
            {
                "index": "0",
                "subnet_id": "e9b0000000000000000",
                "primary_v4_address": {
                    "address": "10.128.0.12",
                    "one_to_one_nat": {
                        "address": "51.250.10.20",
                        "ip_version": "IPV4"
                    }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_instance_addresses() {
        let instance: YcInstance = serde_json::from_str(RUNNING_INSTANCE).unwrap();

        assert_eq!(instance.id, "fhm0b28lgbv4s1m2e0hv");
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.public_ip(), Some("51.250.10.20"));
        assert_eq!(instance.internal_ip(), Some("10.128.0.12"));
    }

    #[test]
    fn test_parse_instance_without_nat() {
        let json = r#"{
            "id": "fhm1",
            "name": "internal-only",
            "zone_id": "ru-central1-b",
            "status": "PROVISIONING",
            "network_interfaces": [
                {"primary_v4_address": {"address": "10.129.0.3"}}
            ]
        }"#;
        let instance: YcInstance = serde_json::from_str(json).unwrap();

        assert!(instance.public_ip().is_none());
        assert_eq!(instance.internal_ip(), Some("10.129.0.3"));

        let observed = ObservedInstance::from(&instance);
        assert_eq!(observed.zone, "ru-central1-b");
        assert_eq!(observed.status, InstanceStatus::Provisioning);
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        let json = r#"{"id": "fhm2", "name": "x", "status": "HIBERNATING"}"#;
        let instance: YcInstance = serde_json::from_str(json).unwrap();

        assert_eq!(instance.status, InstanceStatus::Unknown);
        assert!(instance.network_interfaces.is_empty());
        assert!(instance.public_ip().is_none());
    }

    #[test]
    fn test_failure_summary() {
        let output = CommandOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::from("ERROR: permission denied\n"),
        };
        assert!(!output.success());
        assert_eq!(output.failure_summary(), "exit status 1: ERROR: permission denied");

        let killed = CommandOutput::default();
        assert_eq!(killed.failure_summary(), "terminated by signal");
    }
}
