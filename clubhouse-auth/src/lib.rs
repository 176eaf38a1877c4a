//! Clubhouse Auth - role-based access control
//!
//! Role registry, the permission evaluator, the request-scoped
//! [`AuthContext`] and the view guard that drives UI controls.

pub mod context;
pub mod guard;
pub mod permissions;
pub mod roles;

pub use context::AuthContext;
pub use guard::{ControlSet, MemberListControls, PageGate, UserListControls, ViewGuard};
pub use permissions::{Capabilities, Capability, PermissionEvaluator, MANAGE, READ, WRITE};
pub use roles::{Role, RoleRegistry};

use std::sync::Arc;

/// Resolve the registry and capabilities from configuration.
///
/// Any inconsistency between the two is a startup error.
pub fn build_from_config(
    config: &clubhouse_core::AuthConfig,
) -> clubhouse_core::ClubResult<(PermissionEvaluator, Capabilities)> {
    let registry = Arc::new(RoleRegistry::from_config(config)?);
    let capabilities = Capabilities::resolve(&registry)?;

    tracing::debug!(
        roles = ?registry.labels(),
        lowest = registry.label(registry.lowest()),
        "Role registry resolved"
    );

    Ok((PermissionEvaluator::new(registry), capabilities))
}
