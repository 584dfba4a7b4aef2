//! Instance provisioner backed by the `yc` CLI.
//!
//! The reconciler only sees the [`ProvisionerClient`] trait: look up by name
//! and create. The CLI owns the instance lifecycle.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{DesiredInstanceSpec, ProvisionerConfig};
use crate::error::{ProvisionerError, ProvisionerOperation, Result};

use super::client::YcCli;
use super::command::{CreateInstanceCommand, list_instances_args};
use super::types::{CommandOutput, ObservedInstance, YcInstance};

/// Trait for external instance provisioners.
#[async_trait]
pub trait ProvisionerClient: Send + Sync {
    /// Looks up an instance by name in a folder.
    ///
    /// Returns `None` if no instance has that name.
    async fn find(
        &self,
        name: &str,
        folder_id: &str,
        zone: &str,
    ) -> Result<Option<ObservedInstance>>;

    /// Creates an instance. Called at most once per reconciliation.
    async fn create(&self, spec: &DesiredInstanceSpec) -> Result<ObservedInstance>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// Provisioner that shells out to `yc compute instance`.
#[derive(Debug, Clone)]
pub struct YcProvisioner {
    /// CLI client.
    cli: YcCli,
    /// Home directory used to expand `~/` in key paths.
    home: Option<PathBuf>,
}

impl YcProvisioner {
    /// Creates a provisioner using the given CLI client.
    #[must_use]
    pub fn new(cli: YcCli) -> Self {
        Self {
            cli,
            home: dirs::home_dir(),
        }
    }

    /// Creates a provisioner from the provisioner configuration.
    #[must_use]
    pub fn from_config(config: &ProvisionerConfig) -> Self {
        Self::new(YcCli::from_config(config))
    }

    /// Overrides the home directory used for `~/` expansion.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Runs the CLI, mapping a missing binary to [`ProvisionerError::BinaryNotFound`].
    async fn run(
        &self,
        args: &[String],
        name: &str,
        operation: ProvisionerOperation,
    ) -> Result<CommandOutput> {
        let binary = self.cli.binary().display().to_string();

        match self.cli.execute(args).await {
            Ok(output) => Ok(output),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ProvisionerError::BinaryNotFound {
                binary,
                name: name.to_string(),
                operation,
            }
            .into()),
            Err(e) => {
                let message = format!("failed to run {binary}: {e}");
                Err(match operation {
                    ProvisionerOperation::Query => ProvisionerError::query(name, message, None),
                    ProvisionerOperation::Create => ProvisionerError::create(name, message, None),
                }
                .into())
            }
        }
    }
}

#[async_trait]
impl ProvisionerClient for YcProvisioner {
    async fn find(
        &self,
        name: &str,
        folder_id: &str,
        zone: &str,
    ) -> Result<Option<ObservedInstance>> {
        debug!("Looking up instance {name} in folder {folder_id}");

        let output = self
            .run(&list_instances_args(folder_id), name, ProvisionerOperation::Query)
            .await?;

        if !output.success() {
            let message = output.failure_summary();
            return Err(ProvisionerError::query(name, message, Some(output)).into());
        }

        let instances: Vec<YcInstance> = if output.stdout.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(&output.stdout) {
                Ok(instances) => instances,
                Err(e) => {
                    return Err(ProvisionerError::query(
                        name,
                        format!("unparseable list output: {e}"),
                        Some(output),
                    )
                    .into());
                }
            }
        };

        let Some(instance) = instances.iter().find(|i| i.name == name) else {
            debug!("Instance {name} not found among {} instances", instances.len());
            return Ok(None);
        };

        if !zone.is_empty() && instance.zone_id != zone {
            warn!(
                "Instance {name} exists in zone {} instead of {zone}; treating it as existing",
                instance.zone_id
            );
        }

        debug!("Found instance {name} (ID: {})", instance.id);
        Ok(Some(ObservedInstance::from(instance)))
    }

    async fn create(&self, spec: &DesiredInstanceSpec) -> Result<ObservedInstance> {
        let command = CreateInstanceCommand::from_spec(spec, self.home.as_deref());
        info!("Creating instance: {}", spec.name);
        debug!("{command}");

        let name = spec.name.as_str();
        let output = self
            .run(&command.to_args(), name, ProvisionerOperation::Create)
            .await?;

        if !output.success() {
            let message = output.failure_summary();
            return Err(ProvisionerError::create(name, message, Some(output)).into());
        }

        let instance: YcInstance = match serde_json::from_str(&output.stdout) {
            Ok(instance) => instance,
            Err(e) => {
                return Err(ProvisionerError::create(
                    name,
                    format!("unparseable create output: {e}"),
                    Some(output),
                )
                .into());
            }
        };

        if instance.id.is_empty() {
            return Err(ProvisionerError::create(
                name,
                "create output carries no instance id",
                Some(output),
            )
            .into());
        }

        let mut observed = ObservedInstance::from(&instance);
        if observed.name.is_empty() {
            observed.name = spec.name.clone();
        }
        if observed.zone.is_empty() {
            observed.zone = spec.zone.clone();
        }

        info!("Created instance: {} (ID: {})", observed.name, observed.id);
        Ok(observed)
    }

    fn backend_type(&self) -> &'static str {
        "yc"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ConvergeError;
    use crate::yc::InstanceStatus;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    const LIST_OUTPUT: &str = r#"[
  {"id": "fhmaaa", "name": "other", "zone_id": "ru-central1-a", "status": "STOPPED"},
  {"id": "fhmbbb", "name": "demo", "zone_id": "ru-central1-b", "status": "RUNNING",
   "network_interfaces": [{"primary_v4_address": {"address": "10.0.0.5",
     "one_to_one_nat": {"address": "51.250.1.2", "ip_version": "IPV4"}}}]}
]"#;

    const CREATE_OUTPUT: &str = r#"{"id": "fhmnew", "name": "demo", "zone_id": "ru-central1-a",
  "status": "RUNNING",
  "network_interfaces": [{"primary_v4_address": {"address": "10.0.0.9",
    "one_to_one_nat": {"address": "51.250.9.9", "ip_version": "IPV4"}}}]}"#;

    /// Writes a fake `yc` that prints canned output and records its arguments.
    fn fake_yc(dir: &Path, list: &str, create: &str, exit_code: i32) -> PathBuf {
        let list_file = dir.join("list.json");
        let create_file = dir.join("create.json");
        std::fs::write(&list_file, list).expect("write list fixture");
        std::fs::write(&create_file, create).expect("write create fixture");

        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{calls}'\n\
             case \"$*\" in\n\
             *'instance list'*) cat '{list}' ;;\n\
             *'instance create'*) cat '{create}' ;;\n\
             esac\n\
             if [ {code} -ne 0 ]; then echo 'ERROR: operation failed' >&2; fi\n\
             exit {code}\n",
            calls = dir.join("calls.log").display(),
            list = list_file.display(),
            create = create_file.display(),
            code = exit_code,
        );

        let path = dir.join("yc");
        std::fs::write(&path, script).expect("write fake yc");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake yc");
        path
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    fn spec() -> DesiredInstanceSpec {
        DesiredInstanceSpec::new("demo", "b1gfolder", "ru-central1-a", "e9bsubnet", "fd8image")
    }

    #[tokio::test]
    async fn test_find_existing_instance() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), LIST_OUTPUT, "", 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let found = provisioner
            .find("demo", "b1gfolder", "ru-central1-a")
            .await
            .unwrap()
            .expect("instance should be found");

        assert_eq!(found.id, "fhmbbb");
        assert_eq!(found.zone, "ru-central1-b");
        assert_eq!(found.status, InstanceStatus::Running);
        assert_eq!(found.ip_address.as_deref(), Some("51.250.1.2"));
        assert_eq!(found.internal_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(
            calls(temp.path()),
            vec![String::from("compute instance list --folder-id b1gfolder --format json")]
        );
    }

    #[tokio::test]
    async fn test_find_absent_instance() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", "", 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let found = provisioner.find("demo", "b1gfolder", "").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_failure_carries_output() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "", "", 1);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let err = provisioner.find("demo", "b1gfolder", "").await.unwrap_err();

        assert_eq!(err.kind(), "ProvisionerQueryError");
        let output = err.tool_output().expect("output attached");
        assert_eq!(output.exit_code, Some(1));
        assert!(output.stderr.contains("operation failed"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let temp = TempDir::new().unwrap();
        let provisioner = YcProvisioner::new(YcCli::new(temp.path().join("no-such-yc")));

        let err = provisioner.find("demo", "b1gfolder", "").await.unwrap_err();
        assert!(matches!(
            &err,
            ConvergeError::Provisioner(ProvisionerError::BinaryNotFound {
                name,
                operation: ProvisionerOperation::Query,
                ..
            }) if name == "demo"
        ));
        assert_eq!(err.kind(), "ProvisionerQueryError");
        assert!(err.to_string().contains("'demo'"));
    }

    #[tokio::test]
    async fn test_missing_binary_on_create() {
        let temp = TempDir::new().unwrap();
        let provisioner = YcProvisioner::new(YcCli::new(temp.path().join("no-such-yc")));

        let err = provisioner.create(&spec()).await.unwrap_err();

        assert_eq!(err.kind(), "ProvisionerCreateError");
        assert!(err.to_string().contains("create instance 'demo'"));
        assert!(err.tool_output().is_none());
    }

    #[tokio::test]
    async fn test_create_parses_response() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", CREATE_OUTPUT, 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc).with_profile("ci"));

        let created = provisioner.create(&spec()).await.unwrap();

        assert_eq!(created.id, "fhmnew");
        assert_eq!(created.ip_address.as_deref(), Some("51.250.9.9"));

        let calls = calls(temp.path());
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("--profile ci compute instance create --name demo"));
        assert!(calls[0].contains("--create-boot-disk size=10GB,type=network-hdd,image-id=fd8image"));
    }

    #[tokio::test]
    async fn test_create_passes_expanded_key_file() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", CREATE_OUTPUT, 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc)).with_home("/home/ops");
        let mut spec = spec();
        spec.ssh_key = Some(String::from("~/.ssh/id_rsa.pub"));

        provisioner.create(&spec).await.unwrap();

        assert!(calls(temp.path())[0].contains("--ssh-key /home/ops/.ssh/id_rsa.pub"));
    }

    #[tokio::test]
    async fn test_create_failure_is_create_error() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", "", 1);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let err = provisioner.create(&spec()).await.unwrap_err();

        assert_eq!(err.kind(), "ProvisionerCreateError");
        assert!(err.to_string().contains("'demo'"));
        assert!(err.tool_output().is_some());
    }

    #[tokio::test]
    async fn test_create_unparseable_output() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", "done.", 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let err = provisioner.create(&spec()).await.unwrap_err();
        assert_eq!(err.kind(), "ProvisionerCreateError");
        assert_eq!(err.tool_output().map(|o| o.stdout.as_str()), Some("done."));
    }

    #[tokio::test]
    async fn test_create_output_without_id() {
        let temp = TempDir::new().unwrap();
        let yc = fake_yc(temp.path(), "[]", r#"{"name": "demo"}"#, 0);
        let provisioner = YcProvisioner::new(YcCli::new(yc));

        let err = provisioner.create(&spec()).await.unwrap_err();
        assert!(err.to_string().contains("no instance id"));
    }
}
