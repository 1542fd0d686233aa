//! Drift computation - declared state vs prefetched snapshots
//!
//! Pure comparison used by plan/status rendering. Runs after a prefetch
//! and never touches the device.

use crate::declaration::Declaration;
use crate::types::Ensure;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One property whose live value differs from the declared value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDrift {
    pub name: String,
    /// Observed value, if discovery captured one
    pub current: Option<Value>,
    pub desired: Value,
}

/// Divergence between one declaration and the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drift {
    pub identity: String,
    pub kind: String,
    pub current: Ensure,
    pub desired: Ensure,
    /// Property-level differences, populated when both sides are present
    pub properties: Vec<PropertyDrift>,
}

impl Drift {
    /// Compute the drift for one prefetched declaration.
    ///
    /// Returns `None` when live state already matches the declaration.
    pub fn from_declaration(declaration: &Declaration) -> Option<Self> {
        let current = match declaration.matched() {
            Some(_) => Ensure::Present,
            None => Ensure::Absent,
        };
        let desired = declaration.ensure();

        let properties = if current == Ensure::Present && desired == Ensure::Present {
            property_drift(declaration)
        } else {
            Vec::new()
        };

        if current == desired && properties.is_empty() {
            return None;
        }

        Some(Self {
            identity: declaration.identity().to_string(),
            kind: declaration.kind().to_string(),
            current,
            desired,
            properties,
        })
    }

    /// Resource must be brought into existence
    pub fn is_addition(&self) -> bool {
        self.current == Ensure::Absent && self.desired == Ensure::Present
    }

    /// Resource must be removed
    pub fn is_removal(&self) -> bool {
        self.current == Ensure::Present && self.desired == Ensure::Absent
    }

    /// Resource exists but properties diverge
    pub fn is_change(&self) -> bool {
        !self.properties.is_empty()
    }
}

fn property_drift(declaration: &Declaration) -> Vec<PropertyDrift> {
    let observed = declaration.matched().map(|i| &i.properties);
    declaration
        .properties()
        .iter()
        .filter_map(|(name, desired)| {
            let current = observed.and_then(|p| p.get(name));
            if current == Some(desired) {
                None
            } else {
                Some(PropertyDrift {
                    name: name.clone(),
                    current: current.cloned(),
                    desired: desired.clone(),
                })
            }
        })
        .collect()
}

/// Compute drift rows for a batch of prefetched declarations
pub fn compute_drift(declarations: &[Declaration]) -> Vec<Drift> {
    declarations
        .iter()
        .filter_map(Drift::from_declaration)
        .collect()
}

/// Drift summary statistics
#[derive(Debug, Clone, Default)]
pub struct DriftSummary {
    pub additions: usize,
    pub removals: usize,
    pub changes: usize,
}

impl DriftSummary {
    pub fn from_drifts(drifts: &[Drift]) -> Self {
        let mut summary = Self::default();
        for drift in drifts {
            if drift.is_addition() {
                summary.additions += 1;
            } else if drift.is_removal() {
                summary.removals += 1;
            } else {
                summary.changes += 1;
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.additions + self.removals + self.changes
    }

    pub fn has_drift(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Capabilities, DeviceClient, Provider};
    use crate::schema::Schema;
    use crate::Result;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct FixedDevice {
        identities: Vec<String>,
        versions: BTreeMap<String, String>,
    }

    impl DeviceClient for FixedDevice {
        fn list(&self, _kind: &str) -> Result<Vec<String>> {
            Ok(self.identities.clone())
        }

        fn properties(&self, _kind: &str, identity: &str) -> Result<BTreeMap<String, Value>> {
            let mut properties = BTreeMap::new();
            if let Some(version) = self.versions.get(identity) {
                properties.insert("version".to_string(), json!(version));
            }
            Ok(properties)
        }

        fn exists(&self, _kind: &str, identity: &str) -> Result<bool> {
            Ok(self.identities.iter().any(|i| i == identity))
        }
    }

    fn prefetched(device: FixedDevice, mut decls: Vec<Declaration>) -> Vec<Declaration> {
        let provider = Provider::new(
            Schema::new("image", "name"),
            device,
            Capabilities::observe_only(),
        );
        provider.prefetch(&mut decls).unwrap();
        decls
    }

    #[test]
    fn test_no_drift_when_converged() {
        let schema = Schema::new("image", "name");
        let device = FixedDevice {
            identities: vec!["image".into()],
            versions: BTreeMap::from([("image".into(), "7.0(3)I5(1)".into())]),
        };
        let decls = prefetched(
            device,
            vec![Declaration::new(&schema, "image").with_property("version", json!("7.0(3)I5(1)"))],
        );

        assert!(compute_drift(&decls).is_empty());
    }

    #[test]
    fn test_missing_resource_is_addition() {
        let schema = Schema::new("image", "name");
        let decls = prefetched(
            FixedDevice {
                identities: vec![],
                versions: BTreeMap::new(),
            },
            vec![Declaration::new(&schema, "image")],
        );

        let drifts = compute_drift(&decls);
        assert_eq!(drifts.len(), 1);
        assert!(drifts[0].is_addition());
        assert_eq!(drifts[0].identity, "image");
    }

    #[test]
    fn test_unwanted_resource_is_removal() {
        let schema = Schema::new("image", "name");
        let decls = prefetched(
            FixedDevice {
                identities: vec!["image".into()],
                versions: BTreeMap::new(),
            },
            vec![Declaration::new(&schema, "image").with_ensure(Ensure::Absent)],
        );

        let drifts = compute_drift(&decls);
        assert_eq!(drifts.len(), 1);
        assert!(drifts[0].is_removal());
    }

    #[test]
    fn test_version_divergence_is_change() {
        let schema = Schema::new("image", "name");
        let device = FixedDevice {
            identities: vec!["image".into()],
            versions: BTreeMap::from([("image".into(), "7.0(3)I5(1)".into())]),
        };
        let decls = prefetched(
            device,
            vec![Declaration::new(&schema, "image").with_property("version", json!("7.0(3)I7(3)"))],
        );

        let drifts = compute_drift(&decls);
        assert_eq!(drifts.len(), 1);
        assert!(drifts[0].is_change());
        assert_eq!(drifts[0].properties.len(), 1);
        assert_eq!(drifts[0].properties[0].current, Some(json!("7.0(3)I5(1)")));
        assert_eq!(drifts[0].properties[0].desired, json!("7.0(3)I7(3)"));
    }

    #[test]
    fn test_summary_counts() {
        let drifts = vec![
            Drift {
                identity: "a".into(),
                kind: "snmp_group".into(),
                current: Ensure::Absent,
                desired: Ensure::Present,
                properties: vec![],
            },
            Drift {
                identity: "b".into(),
                kind: "snmp_group".into(),
                current: Ensure::Present,
                desired: Ensure::Absent,
                properties: vec![],
            },
        ];
        let summary = DriftSummary::from_drifts(&drifts);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.removals, 1);
        assert_eq!(summary.total(), 2);
        assert!(summary.has_drift());
    }
}
