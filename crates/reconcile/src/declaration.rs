//! Declarations - caller-supplied desired state for one resource
//!
//! A [`Declaration`] pairs an identity with desired parameters, properties
//! and presence. It also carries the observation slots a reconciliation
//! pass writes into (the matched discovery snapshot and the result of the
//! last point check); those are private to one pass and never persist.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{Ensure, Instance};
use serde_json::Value;
use std::collections::BTreeMap;

/// Desired state for one resource instance
#[derive(Debug, Clone)]
pub struct Declaration {
    kind: String,
    identity: String,
    ensure: Ensure,
    params: BTreeMap<String, Value>,
    props: BTreeMap<String, Value>,

    // Per-pass observations, cleared by reset_observations()
    matched: Option<Instance>,
    observed_ensure: Option<Ensure>,
    checked_identity: Option<String>,
}

impl Declaration {
    /// Declare a resource by explicit identity, desired present.
    pub fn new(schema: &Schema, identity: impl Into<String>) -> Self {
        Self {
            kind: schema.kind().to_string(),
            identity: identity.into(),
            ensure: Ensure::Present,
            params: BTreeMap::new(),
            props: BTreeMap::new(),
            matched: None,
            observed_ensure: None,
            checked_identity: None,
        }
    }

    /// Declare a resource from a free-form title.
    ///
    /// The title is parsed through the schema's identity rules; the namevar
    /// attribute becomes the identity and every other extracted attribute
    /// is stored as a raw parameter, overridable by later `set_param` calls.
    pub fn from_title(schema: &Schema, title: &str) -> Result<Self> {
        let attrs = schema.parse_title(title)?;
        let identity = attrs
            .get(schema.namevar())
            .cloned()
            .ok_or_else(|| Error::PatternMismatch {
                title: title.to_string(),
            })?;

        let mut decl = Self::new(schema, identity);
        for (name, value) in attrs {
            if name != schema.namevar() {
                decl.params.insert(name, Value::String(value));
            }
        }
        Ok(decl)
    }

    /// Set the desired presence (builder style)
    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// Set a raw parameter value (builder style)
    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Set a raw property value (builder style)
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.props.insert(name.to_string(), value);
        self
    }

    pub fn set_param(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.props.insert(name.to_string(), value);
    }

    /// Apply defaults, validate raw values, and normalize them.
    ///
    /// Runs before any device interaction. Defaults are filled in only for
    /// parameters the user left unset, then every value (defaulted or not)
    /// is validated and munged through the schema. Fails on the first
    /// offending field.
    pub fn finalize(&mut self, schema: &Schema) -> Result<()> {
        for spec in schema.params() {
            if !self.params.contains_key(spec.name())
                && let Some(default) = spec.default()
            {
                self.params.insert(spec.name().to_string(), default.clone());
            }
        }

        for (name, value) in &mut self.params {
            schema.validate(name, value)?;
            *value = schema.munge(name, value)?;
        }
        for (name, value) in &mut self.props {
            schema.validate(name, value)?;
            *value = schema.munge(name, value)?;
        }
        Ok(())
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.props
    }

    /// The discovery snapshot associated by the last prefetch, if any
    pub fn matched(&self) -> Option<&Instance> {
        self.matched.as_ref()
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    /// Presence recorded by the last point check, if any
    pub fn observed_ensure(&self) -> Option<Ensure> {
        self.observed_ensure
    }

    /// Identity the last point check ran against, if any
    pub fn checked_identity(&self) -> Option<&str> {
        self.checked_identity.as_deref()
    }

    /// Whether every declared property matches the matched snapshot.
    ///
    /// Vacuously true with no declared properties; false when properties
    /// are declared but no snapshot is associated (unknown live values are
    /// treated as drift, not convergence).
    pub fn properties_converged(&self) -> bool {
        if self.props.is_empty() {
            return true;
        }
        match &self.matched {
            Some(instance) => self
                .props
                .iter()
                .all(|(name, desired)| instance.properties.get(name) == Some(desired)),
            None => false,
        }
    }

    pub(crate) fn attach(&mut self, instance: Instance) {
        self.matched = Some(instance);
    }

    pub(crate) fn record_check(&mut self, ensure: Ensure) {
        self.observed_ensure = Some(ensure);
        self.checked_identity = Some(self.identity.clone());
    }

    /// Drop all per-pass observations. No state crosses passes.
    pub fn reset_observations(&mut self) {
        self.matched = None;
        self.observed_ensure = None;
        self.checked_identity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamSpec;
    use serde_json::json;

    fn schema_with_default() -> Schema {
        Schema::new("image", "name")
            .with_param(ParamSpec::new("force").with_default(json!(false)))
            .with_property(ParamSpec::new("version"))
    }

    #[test]
    fn test_from_title_uses_namevar() {
        let schema = Schema::new("snmp_group", "group");
        let decl = Declaration::from_title(&schema, "network-admin").unwrap();
        assert_eq!(decl.identity(), "network-admin");
        assert_eq!(decl.kind(), "snmp_group");
        assert_eq!(decl.ensure(), Ensure::Present);
    }

    #[test]
    fn test_finalize_applies_default_only_when_unset() {
        let schema = schema_with_default();

        let mut decl = Declaration::new(&schema, "image");
        decl.finalize(&schema).unwrap();
        assert_eq!(decl.param("force"), Some(&json!(false)));

        let mut decl = Declaration::new(&schema, "image").with_param("force", json!(true));
        decl.finalize(&schema).unwrap();
        assert_eq!(decl.param("force"), Some(&json!(true)));
    }

    #[test]
    fn test_finalize_validates_defaults_like_user_input() {
        // A default that fails its own validator must be rejected too.
        let schema = Schema::new("kind", "name").with_param(
            ParamSpec::new("flag")
                .with_default(json!("not-a-bool"))
                .with_validator(|v| {
                    if v.is_boolean() {
                        Ok(())
                    } else {
                        Err(Error::Validation {
                            field: "flag".into(),
                            value: v.to_string(),
                            constraint: "must be true or false".into(),
                        })
                    }
                }),
        );

        let mut decl = Declaration::new(&schema, "x");
        assert!(decl.finalize(&schema).is_err());
    }

    #[test]
    fn test_finalize_rejects_unknown_parameter() {
        let schema = schema_with_default();
        let mut decl = Declaration::new(&schema, "image").with_param("bogus", json!(1));
        let err = decl.finalize(&schema).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_properties_converged() {
        let schema = schema_with_default();
        let mut decl =
            Declaration::new(&schema, "image").with_property("version", json!("7.0(3)I5(1)"));

        // Declared property, no snapshot: drift.
        assert!(!decl.properties_converged());

        let mut properties = BTreeMap::new();
        properties.insert("version".to_string(), json!("7.0(3)I5(1)"));
        decl.attach(Instance::with_properties("image", properties));
        assert!(decl.properties_converged());

        decl.set_property("version", json!("7.0(3)I7(3)"));
        assert!(!decl.properties_converged());
    }

    #[test]
    fn test_reset_observations() {
        let schema = schema_with_default();
        let mut decl = Declaration::new(&schema, "image");
        decl.attach(Instance::present("image"));
        decl.record_check(Ensure::Present);

        assert!(decl.is_matched());
        assert_eq!(decl.checked_identity(), Some("image"));

        decl.reset_observations();
        assert!(!decl.is_matched());
        assert!(decl.observed_ensure().is_none());
        assert!(decl.checked_identity().is_none());
    }
}
