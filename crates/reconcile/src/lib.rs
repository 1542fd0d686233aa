//! # Reconcile
//!
//! A framework for declarative network-device state management.
//!
//! Callers declare desired state for device resources; the framework
//! validates and normalizes the declarations, discovers live state through
//! a batched device query, matches desired to actual by identity, and
//! decides per resource whether anything must change.
//!
//! ## Core Concepts
//!
//! - **Schema**: the declarable shape of a resource kind - identity
//!   patterns, parameters, properties, validators and mungers
//! - **Declaration**: caller-supplied desired state for one identity
//! - **Instance**: an immutable snapshot of one live resource, captured
//!   during discovery
//! - **Provider**: the per-kind matching engine over a [`DeviceClient`]
//! - **Reconciler**: drives a whole pass and aggregates outcomes
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     reconcile, Capabilities, Declaration, DeviceClient, Provider,
//!     ReconcileOptions, NoProgress, Schema,
//! };
//!
//! let schema = Schema::new("snmp_group", "group");
//! let provider = Provider::new(schema, client, Capabilities::observe_only());
//!
//! let mut declarations = vec![
//!     Declaration::from_title(provider.schema(), "network-admin")?,
//! ];
//!
//! let summary = reconcile(
//!     &provider,
//!     &mut declarations,
//!     &ReconcileOptions::default(),
//!     &mut NoProgress,
//! )?;
//! ```
//!
//! ## Device Clients
//!
//! [`DeviceClient`] is the only seam to a real device. Implementations own
//! transport, sessions, timeouts and retries; kinds without a creation or
//! deletion primitive simply keep the trait's default refusals and declare
//! [`Capabilities::observe_only`]. This keeps capability policy explicit
//! and per kind instead of scattered through enforcement methods.

pub mod declaration;
pub mod drift;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use declaration::Declaration;
pub use drift::{compute_drift, Drift, DriftSummary, PropertyDrift};
pub use error::{Action, Error, Result, Scope};
pub use provider::{Capabilities, DeviceClient, Provider};
pub use reconciler::{reconcile, NoProgress, ProgressCallback, ReconcileOptions};
pub use schema::{identity, IdentityAttrs, ParamSpec, Schema, TitleRule};
pub use types::{Ensure, Instance, Outcome, ReconcileSummary};
