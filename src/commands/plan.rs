//! Preview drift between declared and live state

use anyhow::Result;
use colored::Colorize;
use reconcile::{compute_drift, Drift, DriftSummary, Ensure, Provider};
use std::collections::BTreeMap;
use std::path::Path;

use crate::resource::{image, snmp_group};
use crate::Context;

pub fn run(ctx: &Context, manifest_flag: Option<&Path>) -> Result<()> {
    let mut loaded = super::load(manifest_flag)?;
    let drifts = gather(&mut loaded)?;

    if !ctx.quiet {
        display_drift(&drifts);
    }
    Ok(())
}

/// Render drift rows grouped by resource kind.
pub fn display_drift(drifts: &[Drift]) {
    if drifts.is_empty() {
        println!();
        println!("  {} No drift detected", "✓".green());
        return;
    }

    let mut by_kind: BTreeMap<&str, Vec<&Drift>> = BTreeMap::new();
    for drift in drifts {
        by_kind.entry(drift.kind.as_str()).or_default().push(drift);
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Drift".bold()
    );
    println!("│");

    for (kind, kind_drifts) in &by_kind {
        println!("│ {}", super::kind_title(kind).bold());

        for drift in kind_drifts {
            let symbol = match (drift.current, drift.desired) {
                (Ensure::Absent, Ensure::Present) => "+".green(),
                (Ensure::Present, Ensure::Absent) => "-".red(),
                _ => "~".yellow(),
            };

            let detail = if drift.is_addition() {
                "(missing on device)".to_string()
            } else if drift.is_removal() {
                "(present on device)".to_string()
            } else {
                drift
                    .properties
                    .iter()
                    .map(|p| {
                        format!(
                            "{}: {} → {}",
                            p.name,
                            p.current
                                .as_ref()
                                .and_then(|v| v.as_str().map(ToString::to_string))
                                .unwrap_or_else(|| "unknown".to_string()),
                            p.desired.as_str().unwrap_or("?")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            println!("│   {} {:<24} {}", symbol, drift.identity, detail.dimmed());
        }
        println!("│");
    }

    let summary = DriftSummary::from_drifts(drifts);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} drifted ({} to add, {} to remove, {} to change)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.removals.to_string().red(),
        summary.changes.to_string().yellow()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Drift rows for a loaded manifest; shared by plan and apply.
pub(crate) fn gather(loaded: &mut super::Loaded) -> Result<Vec<Drift>> {
    let groups = Provider::new(
        snmp_group::schema(),
        loaded.device.clone(),
        snmp_group::capabilities(),
    );
    groups.prefetch(&mut loaded.declarations.snmp_groups)?;

    let images = Provider::new(
        image::schema(),
        loaded.device.clone(),
        image::capabilities(),
    );
    images.prefetch(&mut loaded.declarations.images)?;

    let mut drifts = compute_drift(&loaded.declarations.snmp_groups);
    drifts.extend(compute_drift(&loaded.declarations.images));
    Ok(drifts)
}
