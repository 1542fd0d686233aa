//! Validate the manifest without touching a device

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Manifest;
use crate::paths;
use crate::resource::{image, snmp_group};
use crate::ui;
use crate::Context;

pub fn run(_ctx: &Context, manifest_flag: Option<&Path>) -> Result<()> {
    let manifest_path = paths::manifest_path(manifest_flag)?;
    let manifest = Manifest::load(&manifest_path)?;

    let mut errors = 0usize;
    let mut checked = 0usize;

    for entry in &manifest.snmp_group {
        checked += 1;
        if let Err(e) = snmp_group::declaration(&entry.group, entry.ensure) {
            ui::error(&format!("snmp_group {:?}: {e}", entry.group));
            errors += 1;
        }
    }

    if let Some(entry) = &manifest.image {
        checked += 1;
        if let Err(e) = image::declaration(
            &entry.name,
            &entry.source_uri,
            &entry.version,
            entry.force_upgrade,
            entry.delete_boot_image,
        ) {
            ui::error(&format!("image {:?}: {e}", entry.name));
            errors += 1;
        }
    }

    if errors > 0 {
        bail!("{errors} of {checked} declaration(s) invalid");
    }

    ui::success(&format!(
        "{checked} declaration(s) valid ({})",
        manifest_path.display()
    ));
    Ok(())
}
