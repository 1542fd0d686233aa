//! Resource schemas - the declarable shape of a resource kind
//!
//! A [`Schema`] defines how a kind's declarations look: how identities are
//! parsed out of free-form titles, which parameters and properties exist,
//! and how each value is validated and normalized. Schemas hold pure logic
//! only; nothing here touches a device.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identity attributes extracted from a title
pub type IdentityAttrs = BTreeMap<String, String>;

/// Maps one captured group onto a named attribute value
pub type Extractor = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Predicate over a raw, pre-munge value
pub type Validator = Box<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// Pure normalization transform applied after validation succeeds.
///
/// Mungers must be idempotent: normalizing already-normalized input returns
/// it unchanged, because re-application can occur across passes.
pub type Munger = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// One title-parsing rule: a pattern plus per-group attribute extractors
pub struct TitleRule {
    pattern: Regex,
    attrs: Vec<(String, Extractor)>,
}

impl TitleRule {
    /// Create a rule whose capture groups map positionally onto `attrs`.
    pub fn new(pattern: &str, attrs: Vec<(String, Extractor)>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::Schema {
            message: format!("bad title pattern {pattern:?}: {e}"),
        })?;
        Ok(Self { pattern, attrs })
    }

    /// Rule matching any single-token title, mapping it verbatim onto `attr`
    pub fn single_token(attr: &str) -> Result<Self> {
        Self::new(r"^(\S+)$", vec![(attr.to_string(), identity())])
    }

    fn parse(&self, title: &str) -> Option<IdentityAttrs> {
        let caps = self.pattern.captures(title)?;
        let mut attrs = IdentityAttrs::new();
        for (i, (name, extract)) in self.attrs.iter().enumerate() {
            let group = caps.get(i + 1)?.as_str();
            attrs.insert(name.clone(), extract(group));
        }
        Some(attrs)
    }
}

impl fmt::Debug for TitleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleRule")
            .field("pattern", &self.pattern.as_str())
            .field("attrs", &self.attrs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// The identity transform, for simple one-token rules
pub fn identity() -> Extractor {
    Box::new(|s| s.to_string())
}

/// Specification of one parameter or property
pub struct ParamSpec {
    name: String,
    default: Option<Value>,
    validate: Option<Validator>,
    munge: Option<Munger>,
}

impl ParamSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
            validate: None,
            munge: None,
        }
    }

    /// Default applied only when the user supplies no value.
    ///
    /// Defaults go through the same validate/munge pipeline as user input.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_validator(
        mut self,
        validate: impl Fn(&Value) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(validate));
        self
    }

    pub fn with_munger(
        mut self,
        munge: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.munge = Some(Box::new(munge));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("default", &self.default)
            .finish()
    }
}

/// The declarable shape of one resource kind
#[derive(Debug)]
pub struct Schema {
    kind: &'static str,
    namevar: &'static str,
    title_rules: Vec<TitleRule>,
    params: Vec<ParamSpec>,
    props: Vec<ParamSpec>,
}

impl Schema {
    /// Create a schema for `kind` whose identity attribute is `namevar`.
    pub fn new(kind: &'static str, namevar: &'static str) -> Self {
        Self {
            kind,
            namevar,
            title_rules: Vec::new(),
            params: Vec::new(),
            props: Vec::new(),
        }
    }

    /// Add a title rule. Rules are tried in declared order; the implicit
    /// single-token fallback always runs last.
    pub fn with_title_rule(mut self, rule: TitleRule) -> Self {
        self.title_rules.push(rule);
        self
    }

    /// Add a parameter (immutable-at-apply-time input)
    pub fn with_param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Add a property (mutable device state to converge to)
    pub fn with_property(mut self, spec: ParamSpec) -> Self {
        self.props.push(spec);
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn namevar(&self) -> &'static str {
        self.namevar
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn properties(&self) -> &[ParamSpec] {
        &self.props
    }

    /// Parse a free-form title into identity attributes.
    ///
    /// Declared rules are tried in order, first match wins; a single-token
    /// fallback onto the namevar runs last, so any single-token title
    /// parses. Fails with [`Error::PatternMismatch`] when nothing matches.
    pub fn parse_title(&self, title: &str) -> Result<IdentityAttrs> {
        for rule in &self.title_rules {
            if let Some(attrs) = rule.parse(title) {
                return Ok(attrs);
            }
        }
        TitleRule::single_token(self.namevar)?
            .parse(title)
            .ok_or_else(|| Error::PatternMismatch {
                title: title.to_string(),
            })
    }

    /// Validate a raw parameter or property value.
    ///
    /// Runs on the pre-munge value. Unknown names are rejected so typos in
    /// a manifest surface before any device interaction.
    pub fn validate(&self, name: &str, raw: &Value) -> Result<()> {
        let spec = self.spec(name)?;
        match &spec.validate {
            Some(validate) => validate(raw),
            None => Ok(()),
        }
    }

    /// Normalize a validated value. Identity transform when the spec
    /// declares no munger.
    pub fn munge(&self, name: &str, value: &Value) -> Result<Value> {
        let spec = self.spec(name)?;
        match &spec.munge {
            Some(munge) => munge(value),
            None => Ok(value.clone()),
        }
    }

    fn spec(&self, name: &str) -> Result<&ParamSpec> {
        self.params
            .iter()
            .chain(self.props.iter())
            .find(|s| s.name == name)
            .ok_or_else(|| Error::Validation {
                field: name.to_string(),
                value: String::new(),
                constraint: format!("not a parameter or property of {}", self.kind),
            })
    }

    /// Whether `name` is declared as a property (vs a parameter)
    pub fn is_property(&self, name: &str) -> bool {
        self.props.iter().any(|s| s.name == name)
    }
}
