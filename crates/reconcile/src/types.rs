//! Core types for device-state reconciliation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Presence of a resource, desired or observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// Resource exists on the device
    Present,
    /// Resource does not exist on the device
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Observed state of one live resource, captured during discovery.
///
/// Instances are constructed fresh on every discovery pass and never
/// mutated afterwards; matching reads them as snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique key of the resource within its kind
    pub identity: String,
    /// Observed presence (discovery only ever sees present resources)
    pub ensure: Ensure,
    /// Kind-specific observed properties
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Instance {
    /// Snapshot of a present resource with no observed properties
    pub fn present(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ensure: Ensure::Present,
            properties: BTreeMap::new(),
        }
    }

    /// Snapshot of a present resource with observed properties
    pub fn with_properties(identity: impl Into<String>, properties: BTreeMap<String, Value>) -> Self {
        Self {
            identity: identity.into(),
            ensure: Ensure::Present,
            properties,
        }
    }
}

/// Result of reconciling one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Live state already matched desired state
    NoChange,
    /// Resource was created on the device
    Created,
    /// An existing resource was converged to declared properties
    Modified,
    /// Resource was removed from the device
    Removed,
    /// Reconciliation failed for this resource
    Failed { error: String },
    /// Reconciliation was skipped
    Skipped { reason: String },
}

impl Outcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the outcome represents a device change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// Summary of a reconciliation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub converged: usize,
}

impl ReconcileSummary {
    /// Total number of device changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Check if the pass was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of declarations processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.converged
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ReconcileSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.removed += other.removed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.converged += other.converged;
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NoChange => self.converged += 1,
            Outcome::Created => self.created += 1,
            Outcome::Modified => self.modified += 1,
            Outcome::Removed => self.removed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(Outcome::NoChange.is_success());
        assert!(Outcome::Created.is_success());
        assert!(
            !Outcome::Failed {
                error: "boom".into()
            }
            .is_success()
        );
    }

    #[test]
    fn test_outcome_change() {
        assert!(Outcome::Created.is_change());
        assert!(Outcome::Removed.is_change());
        assert!(!Outcome::NoChange.is_change());
        assert!(
            !Outcome::Skipped {
                reason: "dry run".into()
            }
            .is_change()
        );
    }

    #[test]
    fn test_summary_accounting() {
        let mut summary = ReconcileSummary::default();
        summary.add_outcome(&Outcome::Created);
        summary.add_outcome(&Outcome::NoChange);
        summary.add_outcome(&Outcome::Failed {
            error: "device error".into(),
        });

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.total_changes(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_summary_merge() {
        let mut a = ReconcileSummary {
            created: 1,
            converged: 2,
            ..Default::default()
        };
        let b = ReconcileSummary {
            removed: 1,
            failed: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.total(), 5);
        assert_eq!(a.total_changes(), 2);
    }
}
