//! Manifest location resolution
//!
//! Order: explicit `--manifest` flag (clap also maps `DRIFT_MANIFEST` onto
//! it), then the user config directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "drift.toml";

/// Resolve the manifest path to load.
pub fn manifest_path(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        log::debug!("Using manifest from flag/env: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let path = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("drift")
        .join(MANIFEST_FILE);
    log::debug!("Using default manifest: {}", path.display());
    Ok(path)
}
