//! Manifest loading - the declared desired state
//!
//! `drift.toml` is the operator-facing manifest: where the device snapshot
//! lives, which SNMP groups are expected, and optionally the image the
//! device should run. Parsing stops at raw entries; schema validation and
//! normalization happen when entries become declarations.

use anyhow::{Context, Result};
use reconcile::{Declaration, Ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::resource::{image, snmp_group};

/// The drift manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub device: DeviceSection,

    /// Expected SNMP groups
    #[serde(default)]
    pub snmp_group: Vec<SnmpGroupEntry>,

    /// Desired software image, if managed
    #[serde(default)]
    pub image: Option<ImageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSection {
    /// Path to the device state snapshot, relative to the manifest
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpGroupEntry {
    pub group: String,
    #[serde(default = "default_ensure")]
    pub ensure: Ensure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(default = "default_image_name")]
    pub name: String,
    pub source_uri: String,
    pub version: String,
    #[serde(default)]
    pub force_upgrade: Option<bool>,
    #[serde(default)]
    pub delete_boot_image: Option<bool>,
}

fn default_ensure() -> Ensure {
    Ensure::Present
}

fn default_image_name() -> String {
    image::IDENTITY.to_string()
}

/// Declarations built from a manifest, grouped by kind
#[derive(Debug, Default)]
pub struct DeclarationSet {
    pub snmp_groups: Vec<Declaration>,
    pub images: Vec<Declaration>,
}

impl DeclarationSet {
    pub fn total(&self) -> usize {
        self.snmp_groups.len() + self.images.len()
    }
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in manifest: {}", path.display()))
    }

    /// Resolve the snapshot path against the manifest's own location.
    pub fn snapshot_path(&self, manifest_path: &Path) -> PathBuf {
        if self.device.snapshot.is_absolute() {
            self.device.snapshot.clone()
        } else {
            manifest_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&self.device.snapshot)
        }
    }

    /// Validate every entry and build finalized declarations.
    ///
    /// Fails on the first invalid entry, naming it.
    pub fn declarations(&self) -> Result<DeclarationSet> {
        let mut set = DeclarationSet::default();

        for entry in &self.snmp_group {
            let decl = snmp_group::declaration(&entry.group, entry.ensure)
                .with_context(|| format!("invalid snmp_group entry {:?}", entry.group))?;
            set.snmp_groups.push(decl);
        }

        if let Some(entry) = &self.image {
            let decl = image::declaration(
                &entry.name,
                &entry.source_uri,
                &entry.version,
                entry.force_upgrade,
                entry.delete_boot_image,
            )
            .with_context(|| format!("invalid image entry {:?}", entry.name))?;
            set.images.push(decl);
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[device]
snapshot = "device.json"

[[snmp_group]]
group = "network-admin"

[[snmp_group]]
group = "legacy-ops"
ensure = "absent"

[image]
source_uri = "bootflash:nxos.7.0.3.I5.2.bin"
version = "7.0(3)I5(1)"
force_upgrade = true
"#;

    fn write_manifest(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_parse_sample_manifest() {
        let file = write_manifest(SAMPLE);
        let manifest = Manifest::load(file.path()).unwrap();

        assert_eq!(manifest.snmp_group.len(), 2);
        assert_eq!(manifest.snmp_group[0].ensure, Ensure::Present);
        assert_eq!(manifest.snmp_group[1].ensure, Ensure::Absent);

        let image = manifest.image.as_ref().unwrap();
        assert_eq!(image.name, "image");
        assert_eq!(image.force_upgrade, Some(true));
        assert_eq!(image.delete_boot_image, None);
    }

    #[test]
    fn test_declarations_are_finalized() {
        let file = write_manifest(SAMPLE);
        let manifest = Manifest::load(file.path()).unwrap();
        let set = manifest.declarations().unwrap();

        assert_eq!(set.total(), 3);
        assert_eq!(set.snmp_groups[0].identity(), "network-admin");
        assert_eq!(set.snmp_groups[1].ensure(), Ensure::Absent);

        let image = &set.images[0];
        assert_eq!(image.param("force_upgrade"), Some(&json!(true)));
        assert_eq!(image.param("delete_boot_image"), Some(&json!(false)));
        assert_eq!(
            image.param("source_uri"),
            Some(&json!({ "location": "bootflash:", "file": "nxos.7.0.3.I5.2.bin" }))
        );
    }

    #[test]
    fn test_invalid_version_names_entry() {
        let file = write_manifest(
            r#"
[device]
snapshot = "device.json"

[image]
source_uri = "bootflash:nxos.bin"
version = "7.0_bad"
"#,
        );
        let manifest = Manifest::load(file.path()).unwrap();
        let err = manifest.declarations().unwrap_err();
        assert!(format!("{err:#}").contains("image"));
    }

    #[test]
    fn test_snapshot_path_resolution() {
        let file = write_manifest(SAMPLE);
        let manifest = Manifest::load(file.path()).unwrap();

        let resolved = manifest.snapshot_path(file.path());
        assert_eq!(resolved.parent(), file.path().parent());

        let mut absolute = manifest.clone();
        absolute.device.snapshot = PathBuf::from("/var/lib/drift/device.json");
        assert_eq!(
            absolute.snapshot_path(file.path()),
            PathBuf::from("/var/lib/drift/device.json")
        );
    }

    #[test]
    fn test_missing_manifest_fails_with_path() {
        let err = Manifest::load(Path::new("/nonexistent/drift.toml")).unwrap_err();
        assert!(err.to_string().contains("drift.toml"));
    }
}
