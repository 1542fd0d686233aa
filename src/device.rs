//! Snapshot-backed device client
//!
//! Transport to a live device (NXAPI, SNMP sessions) lives behind the
//! `DeviceClient` seam and is not part of this tool. `SnapshotDevice`
//! serves discovery and point checks from a JSON snapshot of device state
//! on disk, which is what plan/apply/status run against.

use anyhow::{Context, Result};
use reconcile::{DeviceClient, Error};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::resource::{image, snmp_group};

/// Observed image state on the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageState {
    pub version: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// The full device state a snapshot captures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub snmp_groups: Vec<String>,
    #[serde(default)]
    pub image: Option<ImageState>,
}

/// DeviceClient over an on-disk state snapshot
#[derive(Debug, Clone)]
pub struct SnapshotDevice {
    snapshot: DeviceSnapshot,
}

impl SnapshotDevice {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read device snapshot: {}", path.display()))?;
        let snapshot: DeviceSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Invalid device snapshot: {}", path.display()))?;
        log::debug!(
            "Loaded device snapshot from {} ({} group(s))",
            path.display(),
            snapshot.snmp_groups.len()
        );
        Ok(Self { snapshot })
    }

    pub fn from_snapshot(snapshot: DeviceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl DeviceClient for SnapshotDevice {
    fn list(&self, kind: &str) -> reconcile::Result<Vec<String>> {
        match kind {
            snmp_group::KIND => Ok(self.snapshot.snmp_groups.clone()),
            image::KIND => Ok(self
                .snapshot
                .image
                .iter()
                .map(|_| image::IDENTITY.to_string())
                .collect()),
            other => Err(Error::Discovery {
                kind: other.to_string(),
                message: "unknown resource kind".to_string(),
            }),
        }
    }

    fn properties(&self, kind: &str, _identity: &str) -> reconcile::Result<BTreeMap<String, Value>> {
        let mut properties = BTreeMap::new();
        if kind == image::KIND
            && let Some(state) = &self.snapshot.image
        {
            properties.insert("version".to_string(), Value::String(state.version.clone()));
        }
        Ok(properties)
    }

    fn exists(&self, kind: &str, identity: &str) -> reconcile::Result<bool> {
        match kind {
            snmp_group::KIND => Ok(self.snapshot.snmp_groups.iter().any(|g| g == identity)),
            image::KIND => Ok(self.snapshot.image.is_some() && identity == image::IDENTITY),
            _ => Err(Error::Device {
                identity: identity.to_string(),
                message: format!("unknown resource kind {kind:?}"),
            }),
        }
    }

    // No create/destroy overrides: the trait defaults refuse enforcement,
    // matching the observe-only capabilities of both shipped kinds.
}
