//! Error types for reconciliation.
//!
//! Errors are categorized by blast radius so callers can decide what a
//! failure takes down: a single declaration, a single live resource, or the
//! whole pass for a resource kind. Each variant carries enough context
//! (field, identity, attempted action) for direct user reporting.

use std::fmt;
use thiserror::Error;

/// Enforcement direction attempted against a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bring the resource into existence on the device
    Create,
    /// Remove the resource from the device
    Destroy,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// How far an error reaches.
///
/// Determines isolation during a reconciliation pass: declaration and
/// resource scoped errors block only the offending entry, pass scoped
/// errors abort processing of the whole kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Local to one declaration; raised before any device interaction
    Declaration,
    /// Local to one live resource; other resources keep converging
    Resource,
    /// Fatal for the kind's whole pass
    Pass,
}

/// Errors that can occur while validating declarations or reconciling
/// them against a device.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared parameter or property failed its format predicate
    #[error("invalid value {value:?} for {field}: {constraint}")]
    Validation {
        /// Name of the offending parameter or property
        field: String,
        /// The raw value that was rejected
        value: String,
        /// The constraint the value was expected to satisfy
        constraint: String,
    },

    /// A title matched no identity-extraction rule
    #[error("title {title:?} matched no identity pattern")]
    PatternMismatch {
        /// The title that could not be parsed
        title: String,
    },

    /// The device client failed during batched enumeration
    #[error("discovery failed for {kind}: {message}")]
    Discovery {
        /// Resource kind being enumerated
        kind: String,
        /// Detail from the failed enumeration
        message: String,
    },

    /// Enforcement attempted in a direction the kind does not support
    #[error("{action} not supported for {identity}; resource left unchanged")]
    Unsupported {
        /// Identity of the resource the enforcement targeted
        identity: String,
        /// The attempted enforcement direction
        action: Action,
    },

    /// Transport or runtime error from a point check or enforcement call
    #[error("device error for {identity}: {message}")]
    Device {
        /// Identity of the resource the call targeted
        identity: String,
        /// Detail from the failed device call
        message: String,
    },

    /// A resource kind's schema definition is malformed
    #[error("invalid schema definition: {message}")]
    Schema {
        /// What is wrong with the definition
        message: String,
    },
}

impl Error {
    /// Get the blast radius of this error.
    pub fn scope(&self) -> Scope {
        match self {
            Error::Validation { .. } | Error::PatternMismatch { .. } => Scope::Declaration,
            Error::Unsupported { .. } | Error::Device { .. } => Scope::Resource,
            Error::Discovery { .. } | Error::Schema { .. } => Scope::Pass,
        }
    }

    /// Whether this error aborts the whole pass for its kind.
    pub fn is_pass_fatal(&self) -> bool {
        self.scope() == Scope::Pass
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_classification() {
        let err = Error::Validation {
            field: "version".into(),
            value: "7.0|bad".into(),
            constraint: "0-9, a-z, A-Z, (, ) and .".into(),
        };
        assert_eq!(err.scope(), Scope::Declaration);
        assert!(!err.is_pass_fatal());

        let err = Error::Device {
            identity: "network-admin".into(),
            message: "session closed".into(),
        };
        assert_eq!(err.scope(), Scope::Resource);

        let err = Error::Discovery {
            kind: "snmp_group".into(),
            message: "device unreachable".into(),
        };
        assert!(err.is_pass_fatal());
    }

    #[test]
    fn test_unsupported_names_identity_and_action() {
        let err = Error::Unsupported {
            identity: "image".into(),
            action: Action::Create,
        };
        let msg = err.to_string();
        assert!(msg.contains("image"));
        assert!(msg.contains("create"));
    }

    #[test]
    fn test_validation_names_field_and_constraint() {
        let err = Error::Validation {
            field: "source_uri".into(),
            value: "bootflash".into(),
            constraint: "must match format <uri>:<image>".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("source_uri"));
        assert!(msg.contains("<uri>:<image>"));
    }
}
