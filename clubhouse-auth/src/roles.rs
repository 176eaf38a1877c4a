//! Role Registry
//!
//! The canonical, totally ordered list of roles. Built once from
//! configuration and never mutated afterwards; share it behind an `Arc`.

use clubhouse_core::{config_error, AuthConfig, ClubResult};
use std::cmp::Ordering;
use std::collections::HashSet;

pub(crate) const AUTH_HINT: &str = "Check the [auth] section of your configuration file";

/// A role, identified by its position in the registry.
///
/// Only a [`RoleRegistry`] hands these out, so every `Role` in circulation
/// is known to be valid. Order roles with [`RoleRegistry::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Role {
    index: usize,
}

impl Role {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Ordered role labels. The first label is the least privileged and is the
/// role every user starts with on first sign-in.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Vec<String>,
}

impl RoleRegistry {
    /// Build a registry from labels ordered least to most privileged
    pub fn new<I, S>(roles: I) -> ClubResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();

        if roles.is_empty() {
            return Err(config_error!("auth.roles must list at least one role", "roles", AUTH_HINT));
        }

        let mut seen = HashSet::new();
        for role in &roles {
            if role.trim().is_empty() {
                return Err(config_error!("auth.roles contains an empty label", "roles", AUTH_HINT));
            }
            if !seen.insert(role.as_str()) {
                return Err(config_error!(
                    format!("auth.roles lists '{}' more than once", role),
                    "roles",
                    AUTH_HINT
                ));
            }
        }

        Ok(Self { roles })
    }

    pub fn from_config(config: &AuthConfig) -> ClubResult<Self> {
        Self::new(config.roles.iter().cloned())
    }

    /// Look up a stored role label. Unknown labels yield `None`.
    pub fn role(&self, label: &str) -> Option<Role> {
        self.roles
            .iter()
            .position(|r| r == label)
            .map(|index| Role { index })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.role(label).is_some()
    }

    pub fn label(&self, role: Role) -> &str {
        &self.roles[role.index]
    }

    pub fn compare(&self, a: Role, b: Role) -> Ordering {
        a.index.cmp(&b.index)
    }

    /// Least privileged role, assigned on first sign-in
    pub fn lowest(&self) -> Role {
        Role { index: 0 }
    }

    /// All labels, least privileged first
    pub fn labels(&self) -> &[String] {
        &self.roles
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        (0..self.roles.len()).map(|index| Role { index })
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self {
            roles: ["none", "read", "write", "manage", "admin"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_core::ClubError;

    #[test]
    fn test_compare_follows_declaration_order() {
        let registry = RoleRegistry::default();
        let read = registry.role("read").unwrap();
        let manage = registry.role("manage").unwrap();

        assert_eq!(registry.compare(read, manage), Ordering::Less);
        assert_eq!(registry.compare(manage, read), Ordering::Greater);
        assert_eq!(registry.compare(read, read), Ordering::Equal);
    }

    #[test]
    fn test_unknown_label_is_none() {
        let registry = RoleRegistry::default();
        assert!(registry.role("superuser").is_none());
        assert!(registry.role("Admin").is_none());
        assert!(!registry.contains(""));
    }

    #[test]
    fn test_lowest_is_first_label() {
        let registry = RoleRegistry::new(["guest", "editor", "owner"]).unwrap();

        assert_eq!(registry.label(registry.lowest()), "guest");
        assert_eq!(registry.iter().count(), 3);
        assert!(registry
            .iter()
            .all(|role| registry.compare(registry.lowest(), role) != Ordering::Greater));
    }

    #[test]
    fn test_invalid_registries_are_config_errors() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            RoleRegistry::new(empty),
            Err(ClubError::Config { .. })
        ));
        assert!(matches!(
            RoleRegistry::new(["read", "read"]),
            Err(ClubError::Config { .. })
        ));
        assert!(matches!(
            RoleRegistry::new(["read", " "]),
            Err(ClubError::Config { .. })
        ));
    }

    #[test]
    fn test_role_errors_point_at_auth_section() {
        match RoleRegistry::new(["read", "read"]) {
            Err(ClubError::Config { context, .. }) => {
                assert_eq!(context.recovery_suggestions, vec![AUTH_HINT.to_string()]);
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_matches_default() {
        let registry = RoleRegistry::from_config(&AuthConfig::default()).unwrap();
        assert_eq!(registry.labels(), RoleRegistry::default().labels());
        assert_eq!(registry.label(registry.lowest()), "none");
    }
}
