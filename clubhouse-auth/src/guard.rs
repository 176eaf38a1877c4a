//! Client-Side Guard
//!
//! Decides which privileged controls and pages an admin UI should show.
//! Purely a presentation aid: the request pipeline in the web server is the
//! only place permissions are enforced.

use crate::context::AuthContext;
use crate::permissions::Capabilities;
use serde::Serialize;

/// Controls on the member list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberListControls {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_reorder: bool,
}

/// Controls on the user list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserListControls {
    pub can_change_role: bool,
    /// Labels offered by the role selector; empty when it is hidden
    pub role_options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageGate {
    Admin,
    AuditLog,
}

/// Everything the session endpoint reports to a UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlSet {
    pub signed_in: bool,
    pub role: Option<String>,
    pub members: MemberListControls,
    pub users: UserListControls,
    pub pages: Vec<PageGate>,
}

/// Guard bound to one request's [`AuthContext`]
#[derive(Debug, Clone, Copy)]
pub struct ViewGuard<'a> {
    context: &'a AuthContext,
    capabilities: Capabilities,
}

impl<'a> ViewGuard<'a> {
    pub fn new(context: &'a AuthContext, capabilities: Capabilities) -> Self {
        Self {
            context,
            capabilities,
        }
    }

    pub fn member_list(&self) -> MemberListControls {
        let write = self.context.can(self.capabilities.write);
        MemberListControls {
            can_edit: write,
            can_delete: write,
            can_reorder: write,
        }
    }

    pub fn user_list(&self) -> UserListControls {
        let can_change_role = self.context.can(self.capabilities.manage);
        let role_options = if can_change_role {
            self.context.evaluator().registry().labels().to_vec()
        } else {
            Vec::new()
        };

        UserListControls {
            can_change_role,
            role_options,
        }
    }

    pub fn allows(&self, page: PageGate) -> bool {
        match page {
            PageGate::Admin => self.context.can(self.capabilities.read),
            PageGate::AuditLog => self.context.can(self.capabilities.manage),
        }
    }

    pub fn controls(&self) -> ControlSet {
        let pages = [PageGate::Admin, PageGate::AuditLog]
            .into_iter()
            .filter(|page| self.allows(*page))
            .collect();

        ControlSet {
            signed_in: self.context.is_signed_in(),
            role: self.context.role_label().map(str::to_string),
            members: self.member_list(),
            users: self.user_list(),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionEvaluator;
    use crate::roles::RoleRegistry;
    use clubhouse_core::User;
    use std::sync::Arc;

    fn context(role: Option<&str>) -> (AuthContext, Capabilities) {
        let registry = Arc::new(RoleRegistry::default());
        let capabilities = Capabilities::resolve(&registry).unwrap();
        let evaluator = PermissionEvaluator::new(registry);

        let ctx = match role {
            Some(role) => AuthContext::signed_in(
                User {
                    id: "u1".to_string(),
                    username: "bob".to_string(),
                    email: None,
                    provider: None,
                    avatar_url: None,
                    role: role.to_string(),
                    created_at: chrono::Utc::now(),
                },
                evaluator,
            ),
            None => AuthContext::anonymous(evaluator),
        };

        (ctx, capabilities)
    }

    #[test]
    fn test_anonymous_sees_no_privileged_controls() {
        let (ctx, caps) = context(None);
        let controls = ViewGuard::new(&ctx, caps).controls();

        assert!(!controls.signed_in);
        assert_eq!(controls.members, MemberListControls::default());
        assert_eq!(controls.users, UserListControls::default());
        assert!(controls.pages.is_empty());
    }

    #[test]
    fn test_read_role_sees_admin_page_only() {
        let (ctx, caps) = context(Some("read"));
        let guard = ViewGuard::new(&ctx, caps);

        assert!(guard.allows(PageGate::Admin));
        assert!(!guard.allows(PageGate::AuditLog));
        assert!(!guard.member_list().can_edit);
        assert!(!guard.user_list().can_change_role);
    }

    #[test]
    fn test_write_role_can_edit_members_but_not_roles() {
        let (ctx, caps) = context(Some("write"));
        let guard = ViewGuard::new(&ctx, caps);

        let members = guard.member_list();
        assert!(members.can_edit && members.can_delete && members.can_reorder);
        assert!(!guard.user_list().can_change_role);
        assert!(guard.user_list().role_options.is_empty());
    }

    #[test]
    fn test_manage_role_gets_role_selector() {
        let (ctx, caps) = context(Some("manage"));
        let controls = ViewGuard::new(&ctx, caps).controls();

        assert_eq!(controls.role.as_deref(), Some("manage"));
        assert!(controls.users.can_change_role);
        assert_eq!(
            controls.users.role_options,
            vec!["none", "read", "write", "manage", "admin"]
        );
        assert_eq!(controls.pages, vec![PageGate::Admin, PageGate::AuditLog]);
    }

    #[test]
    fn test_corrupted_role_is_treated_like_anonymous() {
        let (ctx, caps) = context(Some("superuser"));
        let controls = ViewGuard::new(&ctx, caps).controls();

        assert!(controls.signed_in);
        assert!(controls.role.is_none());
        assert!(controls.pages.is_empty());
        assert!(!controls.members.can_edit);
    }

    #[test]
    fn test_control_set_serializes_snake_case() {
        let (ctx, caps) = context(Some("manage"));
        let json = serde_json::to_value(ViewGuard::new(&ctx, caps).controls()).unwrap();

        assert_eq!(json["members"]["can_reorder"], true);
        assert_eq!(json["pages"][1], "audit_log");
    }
}
