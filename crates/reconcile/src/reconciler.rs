//! Reconciliation pass driver
//!
//! Drives one kind's declarations through a full pass: one batched
//! prefetch, then per declaration a point check and a no-op or enforcement
//! decision. Per-resource failures are isolated - one bad resource never
//! blocks convergence of the rest. Discovery failure aborts the pass.

use crate::declaration::Declaration;
use crate::provider::{DeviceClient, Provider};
use crate::types::{Ensure, Outcome, ReconcileSummary};
use crate::Result;
use rayon::prelude::*;

/// Options for a reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Don't enforce anything, only report what would change
    pub dry_run: bool,
    /// Number of declarations driven concurrently (device client permitting)
    pub jobs: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
        }
    }
}

/// Progress callback for reconciliation passes.
///
/// Decouples rendering from the engine; implement to drive a UI.
pub trait ProgressCallback: Send {
    /// Called once per pass, before the batched discovery
    fn on_pass_start(&mut self, kind: &str, count: usize);

    /// Called when one declaration starts reconciling
    fn on_resource_start(&mut self, identity: &str);

    /// Called when one declaration's outcome is known
    fn on_resource_complete(&mut self, identity: &str, outcome: &Outcome);

    /// Called once per pass, after all declarations settle
    fn on_pass_complete(&mut self, summary: &ReconcileSummary);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_pass_start(&mut self, _kind: &str, _count: usize) {}
    fn on_resource_start(&mut self, _identity: &str) {}
    fn on_resource_complete(&mut self, _identity: &str, _outcome: &Outcome) {}
    fn on_pass_complete(&mut self, _summary: &ReconcileSummary) {}
}

/// Run one reconciliation pass for a kind.
///
/// Discovery happens exactly once and its snapshots are shared read-only
/// across all declarations, bounding device round trips to one per kind
/// plus the per-declaration point checks. With `jobs > 1`, independent
/// identities are driven concurrently; snapshots are immutable and each
/// declaration is private to its own task.
pub fn reconcile<C: DeviceClient>(
    provider: &Provider<C>,
    declarations: &mut [Declaration],
    opts: &ReconcileOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ReconcileSummary> {
    progress.on_pass_start(provider.kind(), declarations.len());

    provider.prefetch(declarations)?;

    let outcomes = if opts.jobs > 1 && declarations.len() > 1 {
        reconcile_parallel(provider, declarations, opts, progress)
    } else {
        reconcile_sequential(provider, declarations, opts, progress)
    };

    let mut summary = ReconcileSummary::default();
    for outcome in &outcomes {
        summary.add_outcome(outcome);
    }
    progress.on_pass_complete(&summary);
    Ok(summary)
}

fn reconcile_sequential<C: DeviceClient>(
    provider: &Provider<C>,
    declarations: &mut [Declaration],
    opts: &ReconcileOptions,
    progress: &mut dyn ProgressCallback,
) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(declarations.len());
    for declaration in declarations.iter_mut() {
        progress.on_resource_start(declaration.identity());
        let outcome = reconcile_one(provider, declaration, opts.dry_run);
        progress.on_resource_complete(declaration.identity(), &outcome);
        outcomes.push(outcome);
    }
    outcomes
}

fn reconcile_parallel<C: DeviceClient>(
    provider: &Provider<C>,
    declarations: &mut [Declaration],
    opts: &ReconcileOptions,
    progress: &mut dyn ProgressCallback,
) -> Vec<Outcome> {
    // The progress callback is not thread-safe; collect first, report after.
    let outcomes: Vec<Outcome> = match rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
    {
        Ok(pool) => pool.install(|| {
            declarations
                .par_iter_mut()
                .map(|declaration| reconcile_one(provider, declaration, opts.dry_run))
                .collect()
        }),
        Err(e) => {
            log::warn!("thread pool unavailable ({e}), reconciling sequentially");
            declarations
                .iter_mut()
                .map(|declaration| reconcile_one(provider, declaration, opts.dry_run))
                .collect()
        }
    };

    for (declaration, outcome) in declarations.iter().zip(&outcomes) {
        progress.on_resource_complete(declaration.identity(), outcome);
    }
    outcomes
}

/// Reconcile a single declaration against confirmed device state
fn reconcile_one<C: DeviceClient>(
    provider: &Provider<C>,
    declaration: &mut Declaration,
    dry_run: bool,
) -> Outcome {
    let present = match provider.exists(declaration) {
        Ok(present) => present,
        Err(e) => {
            return Outcome::Failed {
                error: e.to_string(),
            };
        }
    };

    match declaration.ensure() {
        Ensure::Present => {
            if present && declaration.properties_converged() {
                return Outcome::NoChange;
            }
            if dry_run {
                return Outcome::Skipped {
                    reason: "dry run".to_string(),
                };
            }
            provider
                .enforce_present(declaration)
                .unwrap_or_else(|e| Outcome::Failed {
                    error: e.to_string(),
                })
        }
        Ensure::Absent => {
            if !present {
                return Outcome::NoChange;
            }
            if dry_run {
                return Outcome::Skipped {
                    reason: "dry run".to_string(),
                };
            }
            provider
                .enforce_absent(declaration)
                .unwrap_or_else(|e| Outcome::Failed {
                    error: e.to_string(),
                })
        }
    }
}
