//! Operator-facing commands

pub mod apply;
pub mod plan;
pub mod status;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};

use crate::config::{DeclarationSet, Manifest};
use crate::device::SnapshotDevice;
use crate::paths;

/// Everything a reconciliation-driving command needs loaded up front
pub(crate) struct Loaded {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub declarations: DeclarationSet,
    pub device: SnapshotDevice,
}

pub(crate) fn load(manifest_flag: Option<&Path>) -> Result<Loaded> {
    let manifest_path = paths::manifest_path(manifest_flag)?;
    let manifest = Manifest::load(&manifest_path)?;
    let declarations = manifest
        .declarations()
        .with_context(|| format!("in manifest {}", manifest_path.display()))?;
    let device = SnapshotDevice::load(&manifest.snapshot_path(&manifest_path))?;

    Ok(Loaded {
        manifest_path,
        manifest,
        declarations,
        device,
    })
}

/// Human-facing name for a resource kind
pub(crate) fn kind_title(kind: &str) -> &str {
    match kind {
        "snmp_group" => "SNMP groups",
        "image" => "Software image",
        other => other,
    }
}
