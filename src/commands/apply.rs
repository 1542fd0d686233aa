//! Converge live state to declared state

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Confirm;
use reconcile::{
    reconcile, Outcome, ProgressCallback, Provider, ReconcileOptions, ReconcileSummary,
};
use std::path::Path;

use crate::resource::{image, snmp_group};
use crate::ui;
use crate::Context;

pub fn run(
    ctx: &Context,
    manifest_flag: Option<&Path>,
    dry_run: bool,
    yes: bool,
    jobs: usize,
) -> Result<()> {
    let mut loaded = super::load(manifest_flag)?;

    // Preview before touching anything.
    let drifts = super::plan::gather(&mut loaded)?;
    if !ctx.quiet {
        super::plan::display_drift(&drifts);
    }

    if drifts.is_empty() {
        return Ok(());
    }

    if !dry_run && !yes {
        let proceed = Confirm::new()
            .with_prompt(format!("Reconcile {} resource(s)?", drifts.len()))
            .default(false)
            .interact()?;
        if !proceed {
            ui::warn("Aborted");
            return Ok(());
        }
    }

    let opts = ReconcileOptions { dry_run, jobs };
    let mut progress = CliProgress {
        quiet: ctx.quiet,
        verbose: ctx.verbose > 0,
    };
    let mut summary = ReconcileSummary::default();

    let groups = Provider::new(
        snmp_group::schema(),
        loaded.device.clone(),
        snmp_group::capabilities(),
    );
    summary.merge(&reconcile(
        &groups,
        &mut loaded.declarations.snmp_groups,
        &opts,
        &mut progress,
    )?);

    let images = Provider::new(image::schema(), loaded.device, image::capabilities());
    summary.merge(&reconcile(
        &images,
        &mut loaded.declarations.images,
        &opts,
        &mut progress,
    )?);

    if !ctx.quiet {
        display_summary(&summary);
    }

    if !summary.is_success() {
        bail!("{} resource(s) failed to converge", summary.failed);
    }
    Ok(())
}

fn display_summary(summary: &ReconcileSummary) {
    println!();
    ui::kv("in sync", &summary.converged.to_string());
    ui::kv("changed", &summary.total_changes().to_string());
    if summary.skipped > 0 {
        ui::kv("skipped", &summary.skipped.to_string());
    }
    if summary.failed > 0 {
        ui::kv("failed", &summary.failed.to_string().red().to_string());
    } else {
        ui::success("Converged");
    }
}

/// Renders per-resource outcomes as the pass runs
struct CliProgress {
    quiet: bool,
    verbose: bool,
}

impl ProgressCallback for CliProgress {
    fn on_pass_start(&mut self, kind: &str, count: usize) {
        if !self.quiet && count > 0 {
            ui::section(super::kind_title(kind));
        }
    }

    fn on_resource_start(&mut self, _identity: &str) {}

    fn on_resource_complete(&mut self, identity: &str, outcome: &Outcome) {
        if self.quiet {
            return;
        }
        match outcome {
            Outcome::NoChange => {
                if self.verbose {
                    ui::dim(&format!("{identity} (in sync)"));
                }
            }
            Outcome::Created => ui::success(&format!("{identity} created")),
            Outcome::Modified => ui::success(&format!("{identity} converged")),
            Outcome::Removed => ui::success(&format!("{identity} removed")),
            Outcome::Skipped { reason } => ui::dim(&format!("{identity} skipped ({reason})")),
            Outcome::Failed { error } => ui::error(&format!("{identity}: {error}")),
        }
    }

    fn on_pass_complete(&mut self, _summary: &ReconcileSummary) {}
}
