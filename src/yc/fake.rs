//! Recording fake provisioner for tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::DesiredInstanceSpec;
use crate::error::{ProvisionerError, Result};

use super::provisioner::ProvisionerClient;
use super::types::{CommandOutput, InstanceStatus, ObservedInstance};

/// Public address handed out by the fake.
pub const FAKE_PUBLIC_IP: &str = "203.0.113.10";

/// Internal address handed out by the fake.
pub const FAKE_INTERNAL_IP: &str = "10.128.0.10";

/// In-memory provisioner that records every call.
#[derive(Debug, Default)]
pub struct FakeProvisioner {
    instances: Mutex<Vec<ObservedInstance>>,
    created: Mutex<Vec<DesiredInstanceSpec>>,
    finds: AtomicUsize,
    address_after: Option<usize>,
    fail_find: bool,
    fail_create: bool,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing instance.
    pub fn with_instance(self, instance: ObservedInstance) -> Self {
        self.instances.lock().unwrap().push(instance);
        self
    }

    /// Created instances get no public address until `finds` lookups were made.
    pub const fn assign_address_after(mut self, finds: usize) -> Self {
        self.address_after = Some(finds);
        self
    }

    pub const fn failing_find(mut self) -> Self {
        self.fail_find = true;
        self
    }

    pub const fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn find_calls(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn created_specs(&self) -> Vec<DesiredInstanceSpec> {
        self.created.lock().unwrap().clone()
    }
}

/// Builds a running instance as the fake would report it.
pub fn running_instance(name: &str, zone: &str) -> ObservedInstance {
    ObservedInstance {
        id: format!("fhm-{name}"),
        name: name.to_string(),
        zone: zone.to_string(),
        status: InstanceStatus::Running,
        ip_address: Some(String::from(FAKE_PUBLIC_IP)),
        internal_ip: Some(String::from(FAKE_INTERNAL_IP)),
    }
}

#[async_trait]
impl ProvisionerClient for FakeProvisioner {
    async fn find(
        &self,
        name: &str,
        _folder_id: &str,
        _zone: &str,
    ) -> Result<Option<ObservedInstance>> {
        let count = self.finds.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_find {
            return Err(ProvisionerError::query(name, "lookup refused", None).into());
        }

        let mut instances = self.instances.lock().unwrap();
        let Some(instance) = instances.iter_mut().find(|i| i.name == name) else {
            return Ok(None);
        };

        if self.address_after.is_some_and(|after| count >= after) {
            instance.ip_address = Some(String::from(FAKE_PUBLIC_IP));
            instance.status = InstanceStatus::Running;
        }
        Ok(Some(instance.clone()))
    }

    async fn create(&self, spec: &DesiredInstanceSpec) -> Result<ObservedInstance> {
        self.created.lock().unwrap().push(spec.clone());

        if self.fail_create {
            let output = CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: String::from("ERROR: quota exceeded"),
            };
            return Err(
                ProvisionerError::create(&spec.name, output.failure_summary(), Some(output)).into(),
            );
        }

        let mut instance = running_instance(&spec.name, &spec.zone);
        if self.address_after.is_some() || !spec.nat {
            instance.ip_address = None;
            instance.status = InstanceStatus::Provisioning;
        }

        self.instances.lock().unwrap().push(instance.clone());
        Ok(instance)
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}
