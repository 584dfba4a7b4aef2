//! Task document parser.
//!
//! Loads invocation documents from YAML (or JSON) files, fills instance
//! defaults from the environment and reads provisioner settings.

use crate::error::{ConfigError, ConvergeError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{DesiredInstanceSpec, Invocation, ProvisionerConfig, TaskArgs};

/// Environment variable selecting the CLI binary.
pub const ENV_YC_BIN: &str = "CONVERGE_YC_BIN";

/// Environment variable selecting the CLI profile.
pub const ENV_YC_PROFILE: &str = "CONVERGE_YC_PROFILE";

/// Environment default for an empty `folder_id`.
pub const ENV_YC_FOLDER_ID: &str = "CONVERGE_YC_FOLDER_ID";

/// Environment default for an empty `zone`.
pub const ENV_YC_ZONE: &str = "CONVERGE_YC_ZONE";

/// Environment default for an empty `subnet_id`.
pub const ENV_YC_SUBNET_ID: &str = "CONVERGE_YC_SUBNET_ID";

/// Environment default for an empty `image_id`.
pub const ENV_YC_IMAGE_ID: &str = "CONVERGE_YC_IMAGE_ID";

/// Parser for task documents.
#[derive(Debug, Default)]
pub struct TaskParser {
    /// Base path for locating the `.env` file.
    base_path: Option<PathBuf>,
}

impl TaskParser {
    /// Creates a new task parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory the `.env` file is looked up in.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a task document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Invocation> {
        let path = path.as_ref();
        info!("Loading task from: {}", path.display());

        if !path.exists() {
            return Err(ConvergeError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvergeError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse(&content, Some(path))
    }

    /// Parses a task document from a YAML or JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn parse(&self, content: &str, source: Option<&Path>) -> Result<Invocation> {
        debug!("Parsing task document");

        let invocation: Invocation = serde_yaml::from_str(content).map_err(|e| {
            ConvergeError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!(
            "Parsed {} task (check_mode: {})",
            invocation.task.module_name(),
            invocation.check_mode
        );
        Ok(invocation)
    }

    /// Loads a task document and fills empty instance fields from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<Invocation> {
        let mut invocation = self.load_file(path)?;

        if let TaskArgs::Instance(spec) = &mut invocation.task {
            apply_env_defaults(spec, |key| std::env::var(key).ok());
        }

        Ok(invocation)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConvergeError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Reads provisioner settings from the environment.
    #[must_use]
    pub fn provisioner_config() -> ProvisionerConfig {
        let mut config = ProvisionerConfig::default();
        if let Ok(binary) = std::env::var(ENV_YC_BIN) {
            config.binary = PathBuf::from(binary);
        }
        config.profile = std::env::var(ENV_YC_PROFILE).ok();
        config
    }
}

/// Fills empty location fields of a spec from an environment lookup.
///
/// Values already present in the task always win.
pub fn apply_env_defaults(
    spec: &mut DesiredInstanceSpec,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let fields = [
        (ENV_YC_FOLDER_ID, &mut spec.folder_id),
        (ENV_YC_ZONE, &mut spec.zone),
        (ENV_YC_SUBNET_ID, &mut spec.subnet_id),
        (ENV_YC_IMAGE_ID, &mut spec.image_id),
    ];

    for (key, field) in fields {
        if field.is_empty()
            && let Some(value) = lookup(key)
        {
            debug!("Filling {key} from environment");
            *field = value;
        }
    }
}

impl TaskArgs {
    /// Returns the reconciler module name of this task.
    #[must_use]
    pub const fn module_name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Instance(_) => "instance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputValidator;
    use crate::config::spec::CoreFraction;
    use std::collections::HashMap;

    #[test]
    fn test_parse_file_task() {
        let yaml = r#"
task:
  module: file
  args:
    path: /tmp/hello.txt
    content: "Hello from role default"
"#;
        let invocation = TaskParser::new().parse(yaml, None).unwrap();
        assert!(!invocation.check_mode);

        let TaskArgs::File(file) = invocation.task else {
            panic!("expected file task");
        };
        assert_eq!(file.path, PathBuf::from("/tmp/hello.txt"));
        assert_eq!(file.content, "Hello from role default");
    }

    #[test]
    fn test_parse_instance_task_applies_defaults() {
        let yaml = r"
check_mode: true
task:
  module: instance
  args:
    name: demo
    folder_id: b1gexample
    zone: ru-central1-a
    subnet_id: e9bexample
    image_id: fd8example
    core_fraction: 100
";
        let invocation = TaskParser::new().parse(yaml, None).unwrap();
        assert!(invocation.check_mode);

        let TaskArgs::Instance(spec) = invocation.task else {
            panic!("expected instance task");
        };
        assert_eq!(spec.name, "demo");
        assert_eq!(spec.cores, 2);
        assert_eq!(spec.disk_gb, 10);
        assert_eq!(spec.core_fraction, CoreFraction::Hundred);
        assert!(spec.preemptible);
        assert!(spec.ssh_key.is_none());
    }

    #[test]
    fn test_parse_json_task() {
        let json = r#"{"check_mode": false, "task": {"module": "file", "args": {"path": "/srv/a.txt", "content": ""}}}"#;
        let invocation = TaskParser::new().parse(json, None).unwrap();
        assert_eq!(invocation.task.module_name(), "file");
    }

    #[test]
    fn test_parse_rejects_bad_core_fraction() {
        let yaml = r"
task:
  module: instance
  args:
    name: demo
    core_fraction: 30
";
        let result = TaskParser::new().parse(yaml, None);
        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_module() {
        let yaml = r"
task:
  module: user
  args:
    name: alice
";
        assert!(TaskParser::new().parse(yaml, None).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = TaskParser::new().load_file("/nonexistent/task.yaml");
        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_env_defaults_fill_only_empty_fields() {
        let mut spec = DesiredInstanceSpec::new("demo", "", "ru-central1-b", "", "fd8");
        let env: HashMap<&str, &str> = HashMap::from([
            ("CONVERGE_YC_FOLDER_ID", "b1genv"),
            ("CONVERGE_YC_ZONE", "ru-central1-a"),
            ("CONVERGE_YC_SUBNET_ID", "e9benv"),
        ]);

        apply_env_defaults(&mut spec, |key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(spec.folder_id, "b1genv");
        assert_eq!(spec.zone, "ru-central1-b");
        assert_eq!(spec.subnet_id, "e9benv");
        assert_eq!(spec.image_id, "fd8");
    }

    #[test]
    fn test_env_defaults_map_each_key_to_its_field() {
        let mut spec = DesiredInstanceSpec::new("demo", "", "", "", "");
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_YC_FOLDER_ID, "b1genv"),
            (ENV_YC_ZONE, "ru-central1-d"),
            (ENV_YC_SUBNET_ID, "e9benv"),
            (ENV_YC_IMAGE_ID, "fd8env"),
        ]);

        apply_env_defaults(&mut spec, |key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(spec.folder_id, "b1genv");
        assert_eq!(spec.zone, "ru-central1-d");
        assert_eq!(spec.subnet_id, "e9benv");
        assert_eq!(spec.image_id, "fd8env");
    }

    #[test]
    fn test_env_defaults_leave_unset_keys_empty() {
        let mut spec = DesiredInstanceSpec::new("demo", "", "", "", "");

        apply_env_defaults(&mut spec, |key| {
            (key == ENV_YC_IMAGE_ID).then(|| String::from("fd8env"))
        });

        assert!(spec.folder_id.is_empty());
        assert!(spec.zone.is_empty());
        assert!(spec.subnet_id.is_empty());
        assert_eq!(spec.image_id, "fd8env");
    }

    #[test]
    fn test_missing_name_is_invalid_input() {
        let yaml = r"
task:
  module: instance
  args:
    folder_id: b1g
";
        let invocation = TaskParser::new().parse(yaml, None).unwrap();
        let TaskArgs::Instance(spec) = invocation.task else {
            panic!("expected instance task");
        };
        assert!(spec.name.is_empty());

        let err = InputValidator::new().validate_instance(&spec).unwrap_err();
        assert_eq!(err.kind(), "InvalidInputError");
        assert!(err.to_string().contains("name"));
    }
}
