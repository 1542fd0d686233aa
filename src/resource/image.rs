//! Software image resource kind
//!
//! Manages the image version a device should run. A single instance named
//! `image` declares the desired version plus the location of the image to
//! install. The combined `source_uri` string is decomposed at declaration
//! time into the `{location, file}` pair the device API expects. No create
//! or delete primitive exists for images in this core, so enforcement
//! reports a refusal; the version property is still discovered and drift
//! on it is reported.

use reconcile::{Capabilities, Declaration, Error, ParamSpec, Schema};
use serde_json::{json, Value};

pub const KIND: &str = "image";

/// The single accepted instance name
pub const IDENTITY: &str = "image";

const VERSION_CHARSET: &str = "may only contain 0-9, a-z, A-Z, (, ) and .";

pub fn schema() -> Schema {
    Schema::new(KIND, "name")
        .with_param(
            ParamSpec::new("source_uri")
                .with_validator(validate_source_uri)
                .with_munger(munge_source_uri),
        )
        .with_param(
            ParamSpec::new("force_upgrade")
                .with_default(json!(false))
                .with_validator(|v| validate_flag("force_upgrade", v)),
        )
        .with_param(
            ParamSpec::new("delete_boot_image")
                .with_default(json!(false))
                .with_validator(|v| validate_flag("delete_boot_image", v)),
        )
        .with_property(ParamSpec::new("version").with_validator(validate_version))
}

pub fn capabilities() -> Capabilities {
    Capabilities::observe_only()
}

/// Build a finalized image declaration from manifest fields.
pub fn declaration(
    name: &str,
    source_uri: &str,
    version: &str,
    force_upgrade: Option<bool>,
    delete_boot_image: Option<bool>,
) -> reconcile::Result<Declaration> {
    if name != IDENTITY {
        log::warn!("only {IDENTITY:?} is accepted as a valid name");
    }

    let schema = schema();
    let mut decl = Declaration::from_title(&schema, name)?
        .with_param("source_uri", json!(source_uri))
        .with_property("version", json!(version));
    if let Some(force) = force_upgrade {
        decl.set_param("force_upgrade", json!(force));
    }
    if let Some(delete) = delete_boot_image {
        decl.set_param("delete_boot_image", json!(delete));
    }
    decl.finalize(&schema)?;
    Ok(decl)
}

/// Accepts `<location>:<image>` or `<location>/.../<image>`.
fn validate_source_uri(value: &Value) -> reconcile::Result<()> {
    // Already-normalized declarations re-validate as objects.
    if value.is_object() {
        return Ok(());
    }

    let reject = |raw: &str| Error::Validation {
        field: "source_uri".to_string(),
        value: raw.to_string(),
        constraint: "must match format <uri>:<image>".to_string(),
    };

    let uri = value.as_str().ok_or_else(|| reject(&value.to_string()))?;
    if uri.chars().any(char::is_whitespace) {
        return Err(reject(uri));
    }

    let well_formed = match (uri.split_once(':'), uri.split_once('/')) {
        (Some((location, file)), _) => !location.is_empty() && !file.is_empty(),
        (None, Some(_)) => {
            let first = uri.split('/').next().unwrap_or_default();
            let last = uri.rsplit('/').next().unwrap_or_default();
            !first.is_empty() && !last.is_empty()
        }
        (None, None) => false,
    };

    if well_formed { Ok(()) } else { Err(reject(uri)) }
}

/// Decompose a combined source string into `{location, file}`.
///
/// The device API takes the location and the image name as two separate
/// arguments. With a path separator the first segment is the location and
/// the final segment the file; otherwise the string splits on the location
/// delimiter, which stays part of the location. Already-decomposed values
/// pass through unchanged.
fn munge_source_uri(value: &Value) -> reconcile::Result<Value> {
    if value.is_object() {
        return Ok(value.clone());
    }

    let uri = value.as_str().ok_or_else(|| Error::Validation {
        field: "source_uri".to_string(),
        value: value.to_string(),
        constraint: "must match format <uri>:<image>".to_string(),
    })?;

    let (location, file) = if uri.contains('/') {
        let location = uri.split('/').next().unwrap_or_default();
        let file = uri.rsplit('/').next().unwrap_or_default();
        (location.to_string(), file.to_string())
    } else {
        let location = uri.split(':').next().unwrap_or_default();
        let file = uri.rsplit(':').next().unwrap_or_default();
        (format!("{location}:"), file.to_string())
    };

    Ok(json!({ "location": location, "file": file }))
}

fn validate_flag(field: &str, value: &Value) -> reconcile::Result<()> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(Error::Validation {
            field: field.to_string(),
            value: value.to_string(),
            constraint: "must be true or false".to_string(),
        })
    }
}

fn validate_version(value: &Value) -> reconcile::Result<()> {
    let reject = |raw: String, constraint: &str| Error::Validation {
        field: "version".to_string(),
        value: raw,
        constraint: constraint.to_string(),
    };

    let version = match value.as_str() {
        Some(version) => version,
        None => return Err(reject(value.to_string(), "must be a string")),
    };
    if version.is_empty() {
        return Err(reject(version.to_string(), "must not be empty"));
    }
    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '.'))
    {
        return Err(reject(version.to_string(), VERSION_CHARSET));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{Action, Provider, Result};
    use std::collections::BTreeMap;

    struct ImageDevice {
        version: &'static str,
    }

    impl reconcile::DeviceClient for ImageDevice {
        fn list(&self, _kind: &str) -> Result<Vec<String>> {
            Ok(vec![IDENTITY.to_string()])
        }

        fn properties(&self, _kind: &str, _identity: &str) -> Result<BTreeMap<String, Value>> {
            Ok(BTreeMap::from([(
                "version".to_string(),
                json!(self.version),
            )]))
        }

        fn exists(&self, _kind: &str, identity: &str) -> Result<bool> {
            Ok(identity == IDENTITY)
        }
    }

    #[test]
    fn test_source_uri_split_on_delimiter() {
        let munged = munge_source_uri(&json!("bootflash:nxos.7.0.3.I5.2.bin")).unwrap();
        assert_eq!(
            munged,
            json!({ "location": "bootflash:", "file": "nxos.7.0.3.I5.2.bin" })
        );
    }

    #[test]
    fn test_source_uri_split_on_path_separator() {
        let munged = munge_source_uri(&json!("bootflash/images/nxos.bin")).unwrap();
        assert_eq!(munged, json!({ "location": "bootflash", "file": "nxos.bin" }));
    }

    #[test]
    fn test_source_uri_triple_slash_form() {
        let munged = munge_source_uri(&json!("bootflash:///nxos.7.0.3.I5.1.bin")).unwrap();
        assert_eq!(
            munged,
            json!({ "location": "bootflash:", "file": "nxos.7.0.3.I5.1.bin" })
        );
    }

    #[test]
    fn test_munge_is_idempotent_on_both_branches() {
        for uri in ["bootflash:nxos.7.0.3.I5.2.bin", "bootflash/images/nxos.bin"] {
            let once = munge_source_uri(&json!(uri)).unwrap();
            let twice = munge_source_uri(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_source_uri_requires_delimiter() {
        let err = validate_source_uri(&json!("bootflash")).unwrap_err();
        assert!(err.to_string().contains("<uri>:<image>"));

        assert!(validate_source_uri(&json!("bootflash:nxos.bin")).is_ok());
        assert!(validate_source_uri(&json!("bootflash/images/nxos.bin")).is_ok());
    }

    #[test]
    fn test_source_uri_rejects_whitespace() {
        assert!(validate_source_uri(&json!("bootflash: nxos.bin")).is_err());
    }

    #[test]
    fn test_version_accepts_allowed_charset() {
        for version in ["7.0(3)I5(1)", "9.3.10", "nxos64cs", "10.2(3t)"] {
            assert!(validate_version(&json!(version)).is_ok(), "{version}");
        }
    }

    #[test]
    fn test_version_rejects_outside_charset() {
        for version in ["7.0(3)I5(1)!", "9.3 10", "a-b", "7,0"] {
            let err = validate_version(&json!(version)).unwrap_err();
            assert!(err.to_string().contains("0-9, a-z, A-Z"), "{version}");
        }
    }

    #[test]
    fn test_version_rejects_empty_and_null() {
        assert!(validate_version(&json!("")).is_err());
        assert!(validate_version(&Value::Null).is_err());
    }

    #[test]
    fn test_declaration_defaults_and_munge() {
        let decl = declaration(
            IDENTITY,
            "bootflash:nxos.7.0.3.I5.2.bin",
            "7.0(3)I5(1)",
            None,
            None,
        )
        .unwrap();

        assert_eq!(decl.identity(), IDENTITY);
        assert_eq!(decl.param("force_upgrade"), Some(&json!(false)));
        assert_eq!(decl.param("delete_boot_image"), Some(&json!(false)));
        assert_eq!(
            decl.param("source_uri"),
            Some(&json!({ "location": "bootflash:", "file": "nxos.7.0.3.I5.2.bin" }))
        );
        assert_eq!(decl.property("version"), Some(&json!("7.0(3)I5(1)")));
    }

    #[test]
    fn test_declaration_rejects_bad_version() {
        let err = declaration(IDENTITY, "bootflash:nxos.bin", "7.0|bad", None, None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_upgrade_enforcement_not_supported() {
        // Desired version differs from the running one; enforcement is
        // requested but this kind has no create primitive.
        let provider = Provider::new(schema(), ImageDevice { version: "7.0(3)I2(5)" }, capabilities());
        let mut decls =
            vec![declaration(IDENTITY, "bootflash:nxos.bin", "7.0(3)I5(1)", None, None).unwrap()];
        provider.prefetch(&mut decls).unwrap();

        assert!(!decls[0].properties_converged());
        let err = provider.enforce_present(&decls[0]).unwrap_err();
        match err {
            Error::Unsupported { identity, action } => {
                assert_eq!(identity, IDENTITY);
                assert_eq!(action, Action::Create);
            }
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn test_version_drift_detected_via_discovery() {
        let provider = Provider::new(schema(), ImageDevice { version: "7.0(3)I5(1)" }, capabilities());
        let mut decls =
            vec![declaration(IDENTITY, "bootflash:nxos.bin", "7.0(3)I5(1)", None, None).unwrap()];
        provider.prefetch(&mut decls).unwrap();

        assert!(decls[0].is_matched());
        assert!(decls[0].properties_converged());
    }
}
