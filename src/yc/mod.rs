//! Yandex Cloud provisioner integration.
//!
//! This module provides:
//! - The [`ProvisionerClient`] seam used by the instance reconciler
//! - A `yc` CLI process client
//! - Create command construction
//! - Address polling after creation

mod client;
mod command;
mod observer;
mod provisioner;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::YcCli;
pub use command::{CreateInstanceCommand, SshKeySource, list_instances_args};
pub use observer::AddressObserver;
pub use provisioner::{ProvisionerClient, YcProvisioner};
pub use types::{
    CommandOutput, InstanceStatus, NetworkInterface, ObservedInstance, OneToOneNat,
    PrimaryAddress, YcInstance,
};
