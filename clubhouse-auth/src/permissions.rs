//! Permission Evaluator
//!
//! Roles and capabilities share one ordered scale: a user may exercise a
//! capability when their role sits at or above the capability's threshold.

use crate::roles::{Role, RoleRegistry, AUTH_HINT};
use clubhouse_core::{config_error, ClubResult, User};
use serde::Serialize;
use std::{cmp::Ordering, sync::Arc};

pub const READ: &str = "read";
pub const WRITE: &str = "write";
pub const MANAGE: &str = "manage";

/// A named permission threshold, resolved against the registry at startup.
///
/// Capabilities cannot be built from request data; call sites name them
/// with string constants, and an unknown name fails before the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    name: &'static str,
    threshold: Role,
}

impl Capability {
    pub fn resolve(registry: &RoleRegistry, name: &'static str) -> ClubResult<Self> {
        let threshold = registry.role(name).ok_or_else(|| {
            config_error!(
                format!("capability '{}' does not match any configured role", name),
                "permissions",
                AUTH_HINT
            )
        })?;

        Ok(Self { name, threshold })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn threshold(&self) -> Role {
        self.threshold
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Capability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// The capabilities the application checks at its call sites
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub read: Capability,
    pub write: Capability,
    pub manage: Capability,
}

impl Capabilities {
    /// Fails with a configuration error if any of them is missing from the registry
    pub fn resolve(registry: &RoleRegistry) -> ClubResult<Self> {
        Ok(Self {
            read: Capability::resolve(registry, READ)?,
            write: Capability::resolve(registry, WRITE)?,
            manage: Capability::resolve(registry, MANAGE)?,
        })
    }
}

/// Decides whether a user may exercise a capability.
///
/// Pure and deterministic: the server middleware and the UI guard both go
/// through this one implementation.
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    registry: Arc<RoleRegistry>,
}

impl PermissionEvaluator {
    pub fn new(registry: Arc<RoleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// The user's role, or `None` if the stored label is not a known role
    pub fn role_of(&self, user: &User) -> Option<Role> {
        self.registry.role(&user.role)
    }

    /// Fails closed: no user, or a role outside the registry, grants nothing
    pub fn has_permission(&self, user: Option<&User>, capability: Capability) -> bool {
        user.and_then(|u| self.role_of(u))
            .map(|role| self.registry.compare(role, capability.threshold()) != Ordering::Less)
            .unwrap_or(false)
    }
}
