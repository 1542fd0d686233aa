//! SNMP group resource kind
//!
//! Groups on the device are side effects of other configuration; they are
//! discovered and compared, never created or destroyed here. Enforcement
//! in either direction reports a well-defined refusal naming the group.

use reconcile::{Capabilities, Declaration, Ensure, Schema};

pub const KIND: &str = "snmp_group";

/// Identity-only schema; any single-token title is the group name.
pub fn schema() -> Schema {
    Schema::new(KIND, "group")
}

pub fn capabilities() -> Capabilities {
    Capabilities::observe_only()
}

/// Build a finalized declaration for one group.
pub fn declaration(group: &str, ensure: Ensure) -> reconcile::Result<Declaration> {
    let schema = schema();
    let mut decl = Declaration::from_title(&schema, group)?.with_ensure(ensure);
    decl.finalize(&schema)?;
    Ok(decl)
}
