//! Auth Context
//!
//! The "current user" travels as an explicit request-scoped value instead of
//! a process-wide global. Both the server pipeline and the UI guard build
//! one and ask it questions.

use crate::permissions::{Capability, PermissionEvaluator};
use clubhouse_core::User;

/// Authorization information for a single request or page render
#[derive(Debug, Clone)]
pub struct AuthContext {
    user: Option<User>,
    evaluator: PermissionEvaluator,
}

impl AuthContext {
    /// A context with no resolved user; every capability check fails
    pub fn anonymous(evaluator: PermissionEvaluator) -> Self {
        Self {
            user: None,
            evaluator,
        }
    }

    pub fn signed_in(user: User, evaluator: PermissionEvaluator) -> Self {
        Self {
            user: Some(user),
            evaluator,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn into_user(self) -> Option<User> {
        self.user
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.evaluator.has_permission(self.user.as_ref(), capability)
    }

    /// The registry label of the user's role, if it is a known one
    pub fn role_label(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        let role = self.evaluator.role_of(user)?;
        Some(self.evaluator.registry().label(role))
    }

    /// Short description for log lines
    pub fn summary(&self) -> String {
        match &self.user {
            Some(user) => format!(
                "AuthContext[user={}, role={}]",
                user.id,
                self.role_label().unwrap_or("<unknown>")
            ),
            None => "AuthContext[anonymous]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Capabilities;
    use crate::roles::RoleRegistry;
    use std::sync::Arc;

    fn evaluator() -> PermissionEvaluator {
        PermissionEvaluator::new(Arc::new(RoleRegistry::default()))
    }

    fn user(role: &str) -> User {
        User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: Some("alice@example.org".to_string()),
            provider: Some("github".to_string()),
            avatar_url: None,
            role: role.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AuthContext::anonymous(evaluator());
        let caps = Capabilities::resolve(ctx.evaluator().registry()).unwrap();

        assert!(!ctx.is_signed_in());
        assert!(ctx.user_id().is_none());
        assert!(!ctx.can(caps.read));
        assert_eq!(ctx.summary(), "AuthContext[anonymous]");
    }

    #[test]
    fn test_signed_in_context_delegates_to_evaluator() {
        let ctx = AuthContext::signed_in(user("write"), evaluator());
        let caps = Capabilities::resolve(ctx.evaluator().registry()).unwrap();

        assert_eq!(ctx.user_id(), Some("u1"));
        assert_eq!(ctx.role_label(), Some("write"));
        assert!(ctx.can(caps.read));
        assert!(ctx.can(caps.write));
        assert!(!ctx.can(caps.manage));
        assert!(ctx.summary().contains("role=write"));
    }

    #[test]
    fn test_unknown_role_has_no_label() {
        let ctx = AuthContext::signed_in(user("owner"), evaluator());

        assert!(ctx.is_signed_in());
        assert!(ctx.role_label().is_none());
        assert!(ctx.summary().contains("<unknown>"));
    }
}
