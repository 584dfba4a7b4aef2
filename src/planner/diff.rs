//! Diff engine for comparing desired vs current state.
//!
//! Files are compared byte for byte. Instances are compared on existence
//! only, since every other field is used at creation time.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::config::DesiredInstanceSpec;
use crate::yc::ObservedInstance;

/// Engine for computing diffs between desired and current states.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

/// Before/after rendering of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// State before the change; empty if the resource was absent.
    pub before: String,
    /// State after the change.
    pub after: String,
    /// Label of the before side.
    pub before_header: String,
    /// Label of the after side.
    pub after_header: String,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Resource needs to be created.
    Create,
    /// Resource content needs to be replaced.
    Update,
    /// Resource is unchanged.
    NoChange,
}

/// Difference for a single resource.
#[derive(Debug, Clone)]
pub struct ResourceDiff {
    /// Resource name (path or instance name).
    pub name: String,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Before/after rendering, present unless unchanged.
    pub diff: Option<Diff>,
}

impl ResourceDiff {
    /// Returns true if the resource must change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.diff_type != DiffType::NoChange
    }
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compares current file bytes with the desired content.
    #[must_use]
    pub fn file_diff(&self, path: &Path, current: Option<&[u8]>, desired: &str) -> ResourceDiff {
        let name = path.display().to_string();

        let diff_type = match current {
            None => DiffType::Create,
            Some(bytes) if bytes == desired.as_bytes() => DiffType::NoChange,
            Some(_) => DiffType::Update,
        };
        debug!("File {name}: {diff_type:?}");

        let diff = (diff_type != DiffType::NoChange).then(|| Diff {
            before: current
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default(),
            after: desired.to_string(),
            before_header: name.clone(),
            after_header: name.clone(),
        });

        ResourceDiff {
            name,
            diff_type,
            diff,
        }
    }

    /// Compares an instance spec with the observed instance, on existence only.
    #[must_use]
    pub fn instance_diff(
        &self,
        spec: &DesiredInstanceSpec,
        current: Option<&ObservedInstance>,
    ) -> ResourceDiff {
        let diff_type = if current.is_some() {
            DiffType::NoChange
        } else {
            DiffType::Create
        };
        debug!("Instance {}: {diff_type:?}", spec.name);

        let diff = (diff_type == DiffType::Create).then(|| Diff {
            before: String::from("state: absent\n"),
            after: render_instance(spec),
            before_header: format!("instance {}", spec.name),
            after_header: format!("instance {}", spec.name),
        });

        ResourceDiff {
            name: spec.name.clone(),
            diff_type,
            diff,
        }
    }
}

/// Renders the creation-time fields of a spec, one per line.
fn render_instance(spec: &DesiredInstanceSpec) -> String {
    format!(
        "name: {}\nstate: present\nfolder_id: {}\nzone: {}\nplatform_id: {}\ncores: {}\n\
         memory_gb: {}\ncore_fraction: {}\ndisk_gb: {}\ndisk_type: {}\nimage_id: {}\n\
         subnet_id: {}\npreemptible: {}\nnat: {}\n",
        spec.name,
        spec.folder_id,
        spec.zone,
        spec.platform_id,
        spec.cores,
        spec.memory_gb,
        spec.core_fraction,
        spec.disk_gb,
        spec.disk_type,
        spec.image_id,
        spec.subnet_id,
        spec.preemptible,
        spec.nat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yc::InstanceStatus;

    #[test]
    fn test_file_diff_missing_file() {
        let engine = DiffEngine::new();
        let diff = engine.file_diff(Path::new("/tmp/hello.txt"), None, "hello");

        assert_eq!(diff.diff_type, DiffType::Create);
        assert!(diff.has_changes());
        let rendered = diff.diff.unwrap();
        assert_eq!(rendered.before, "");
        assert_eq!(rendered.after, "hello");
        assert_eq!(rendered.before_header, "/tmp/hello.txt");
    }

    #[test]
    fn test_file_diff_same_content() {
        let engine = DiffEngine::new();
        let diff = engine.file_diff(Path::new("/tmp/a"), Some(b"same"), "same");

        assert_eq!(diff.diff_type, DiffType::NoChange);
        assert!(diff.diff.is_none());
    }

    #[test]
    fn test_file_diff_is_byte_exact() {
        let engine = DiffEngine::new();
        let diff = engine.file_diff(Path::new("/tmp/a"), Some(b"line\n"), "line");

        assert_eq!(diff.diff_type, DiffType::Update);
        let rendered = diff.diff.unwrap();
        assert_eq!(rendered.before, "line\n");
        assert_eq!(rendered.after, "line");
    }

    #[test]
    fn test_instance_diff_existence_only() {
        let engine = DiffEngine::new();
        let mut spec = DesiredInstanceSpec::new("demo", "b1g", "ru-central1-a", "e9b", "fd8");

        let create = engine.instance_diff(&spec, None);
        assert_eq!(create.diff_type, DiffType::Create);
        let rendered = create.diff.unwrap();
        assert_eq!(rendered.before, "state: absent\n");
        assert!(rendered.after.contains("cores: 2\n"));
        assert!(rendered.after.contains("platform_id: standard-v2\n"));

        spec.cores = 16;
        let existing = ObservedInstance {
            id: String::from("fhm1"),
            name: String::from("demo"),
            zone: String::from("ru-central1-a"),
            status: InstanceStatus::Stopped,
            ip_address: None,
            internal_ip: None,
        };
        let unchanged = engine.instance_diff(&spec, Some(&existing));
        assert_eq!(unchanged.diff_type, DiffType::NoChange);
        assert!(!unchanged.has_changes());
    }
}
