//! Reconciling provider - bridges declarations to live device state
//!
//! A [`Provider`] owns one resource kind's schema, a [`DeviceClient`] for
//! that kind, and the kind's enforcement [`Capabilities`]. Discovery is one
//! batched round trip per pass; the resulting snapshots are matched onto
//! declarations by identity and every later decision reads them.

use crate::declaration::Declaration;
use crate::error::{Action, Error, Result};
use crate::schema::Schema;
use crate::types::{Ensure, Instance, Outcome};
use serde_json::Value;
use std::collections::BTreeMap;

/// Device access contract for one or more resource kinds.
///
/// Implementations own transport, sessions, timeouts and retries; the
/// provider's contract is simply "blocking call returns or raises".
pub trait DeviceClient: Send + Sync {
    /// Enumerate all live identities of a kind in one round trip
    fn list(&self, kind: &str) -> Result<Vec<String>>;

    /// Observed properties for one identity, fetched during discovery.
    ///
    /// Kinds without observable properties keep the default.
    fn properties(&self, _kind: &str, _identity: &str) -> Result<BTreeMap<String, Value>> {
        Ok(BTreeMap::new())
    }

    /// Point check for a single identity
    fn exists(&self, kind: &str, identity: &str) -> Result<bool>;

    /// Bring a declared resource into existence on the device
    fn create(&self, declaration: &Declaration) -> Result<()> {
        Err(Error::Unsupported {
            identity: declaration.identity().to_string(),
            action: Action::Create,
        })
    }

    /// Remove a declared resource from the device
    fn destroy(&self, declaration: &Declaration) -> Result<()> {
        Err(Error::Unsupported {
            identity: declaration.identity().to_string(),
            action: Action::Destroy,
        })
    }
}

/// Enforcement directions a resource kind supports.
///
/// Fixed per kind when the provider is constructed; checked up front in
/// each enforcement call rather than scattered through the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub create: bool,
    pub destroy: bool,
}

impl Capabilities {
    /// Kind is discovered and compared, never created or destroyed
    pub fn observe_only() -> Self {
        Self {
            create: false,
            destroy: false,
        }
    }

    /// Kind supports enforcement in both directions
    pub fn full() -> Self {
        Self {
            create: true,
            destroy: true,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::Destroy => self.destroy,
        }
    }
}

/// The matching engine for one resource kind
pub struct Provider<C> {
    schema: Schema,
    client: C,
    capabilities: Capabilities,
}

impl<C: DeviceClient> Provider<C> {
    pub fn new(schema: Schema, client: C, capabilities: Capabilities) -> Self {
        Self {
            schema,
            client,
            capabilities,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn kind(&self) -> &'static str {
        self.schema.kind()
    }

    /// Discover all live instances of this kind in one batched call.
    ///
    /// Snapshot construction failures for one identity are skipped, not
    /// fatal to the batch; a failure of the enumeration itself aborts the
    /// pass for this kind.
    pub fn discover_all(&self) -> Result<Vec<Instance>> {
        let kind = self.kind();
        let identities = self.client.list(kind).map_err(|e| Error::Discovery {
            kind: kind.to_string(),
            message: e.to_string(),
        })?;

        let mut instances = Vec::with_capacity(identities.len());
        for identity in identities {
            if identity.trim().is_empty() {
                log::debug!("skipping blank identity in {kind} enumeration");
                continue;
            }
            match self.client.properties(kind, &identity) {
                Ok(properties) => {
                    instances.push(Instance::with_properties(identity, properties));
                }
                Err(e) => {
                    log::debug!("skipping {kind} instance {identity}: {e}");
                }
            }
        }
        Ok(instances)
    }

    /// Discover once and associate snapshots to declarations by identity.
    ///
    /// Exact string equality only; declarations with no discovered
    /// counterpart stay unassociated. Previous observations are cleared
    /// first, so a prefetch always starts a fresh pass.
    pub fn prefetch(&self, declarations: &mut [Declaration]) -> Result<()> {
        let instances = self.discover_all()?;
        log::debug!("discovered {} {} instance(s)", instances.len(), self.kind());

        for declaration in declarations.iter_mut() {
            declaration.reset_observations();
            if let Some(instance) = instances
                .iter()
                .find(|i| i.identity == declaration.identity())
            {
                declaration.attach(instance.clone());
            }
        }
        Ok(())
    }

    /// Re-check one declaration's presence via a point query.
    ///
    /// Does not trust the discovery snapshot. Records the observed ensure
    /// and the checked identity on the declaration; a client error is a
    /// reconciliation failure, never silently treated as absent.
    pub fn exists(&self, declaration: &mut Declaration) -> Result<bool> {
        let present = self
            .client
            .exists(self.kind(), declaration.identity())
            .map_err(|e| match e {
                Error::Device { .. } => e,
                other => Error::Device {
                    identity: declaration.identity().to_string(),
                    message: other.to_string(),
                },
            })?;

        if present {
            declaration.record_check(Ensure::Present);
        } else {
            log::debug!(
                "{} instance {} not found",
                self.kind(),
                declaration.identity()
            );
            declaration.record_check(Ensure::Absent);
        }
        Ok(present)
    }

    /// Attempt to converge the device toward a present declaration.
    ///
    /// Reports [`Error::Unsupported`] when this kind has no creation
    /// primitive - a well-defined refusal, never a silent success.
    pub fn enforce_present(&self, declaration: &Declaration) -> Result<Outcome> {
        if !self.capabilities.allows(Action::Create) {
            return Err(Error::Unsupported {
                identity: declaration.identity().to_string(),
                action: Action::Create,
            });
        }
        self.client.create(declaration)?;
        Ok(match declaration.observed_ensure() {
            Some(Ensure::Present) => Outcome::Modified,
            _ => Outcome::Created,
        })
    }

    /// Attempt to converge the device toward an absent declaration.
    pub fn enforce_absent(&self, declaration: &Declaration) -> Result<Outcome> {
        if !self.capabilities.allows(Action::Destroy) {
            return Err(Error::Unsupported {
                identity: declaration.identity().to_string(),
                action: Action::Destroy,
            });
        }
        self.client.destroy(declaration)?;
        Ok(Outcome::Removed)
    }
}
