//! Show declared resources and their live state

use anyhow::Result;
use colored::Colorize;
use reconcile::{Declaration, Ensure, Provider};
use std::path::Path;

use crate::resource::{image, snmp_group};
use crate::ui;
use crate::Context;

pub fn run(_ctx: &Context, manifest_flag: Option<&Path>) -> Result<()> {
    let mut loaded = super::load(manifest_flag)?;

    ui::header("Drift Status");
    ui::kv("manifest", &loaded.manifest_path.display().to_string());
    ui::kv(
        "snapshot",
        &loaded
            .manifest
            .snapshot_path(&loaded.manifest_path)
            .display()
            .to_string(),
    );

    let groups = Provider::new(
        snmp_group::schema(),
        loaded.device.clone(),
        snmp_group::capabilities(),
    );
    let discovered = groups.discover_all()?;
    groups.prefetch(&mut loaded.declarations.snmp_groups)?;

    ui::section("SNMP groups");
    for decl in &loaded.declarations.snmp_groups {
        show_presence(decl);
    }
    for instance in &discovered {
        let declared = loaded
            .declarations
            .snmp_groups
            .iter()
            .any(|d| d.identity() == instance.identity);
        if !declared {
            ui::dim(&format!("{} (unmanaged)", instance.identity));
        }
    }

    let images = Provider::new(image::schema(), loaded.device, image::capabilities());
    images.prefetch(&mut loaded.declarations.images)?;

    if !loaded.declarations.images.is_empty() {
        ui::section("Software image");
        for decl in &loaded.declarations.images {
            show_image(decl);
        }
    }

    Ok(())
}

fn show_presence(decl: &Declaration) {
    let current = if decl.is_matched() {
        Ensure::Present
    } else {
        Ensure::Absent
    };
    if current == decl.ensure() {
        println!("  {} {:<24} {}", "✓".green(), decl.identity(), current);
    } else {
        println!(
            "  {} {:<24} {}",
            "~".yellow(),
            decl.identity(),
            format!("{} (want {})", current, decl.ensure()).dimmed()
        );
    }
}

fn show_image(decl: &Declaration) {
    let desired = decl
        .property("version")
        .and_then(|v| v.as_str())
        .unwrap_or("?");
    let current = decl
        .matched()
        .and_then(|i| i.properties.get("version"))
        .and_then(|v| v.as_str());

    match current {
        Some(current) if current == desired => {
            println!("  {} {:<24} {}", "✓".green(), decl.identity(), current);
        }
        Some(current) => {
            println!(
                "  {} {:<24} {}",
                "~".yellow(),
                decl.identity(),
                format!("{current} (want {desired})").dimmed()
            );
        }
        None => {
            println!(
                "  {} {:<24} {}",
                "~".yellow(),
                decl.identity(),
                format!("not installed (want {desired})").dimmed()
            );
        }
    }
}
