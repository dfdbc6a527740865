//! Per-request authorization context.

use super::account::Role;

/// The verified caller of a policy-layer operation.
///
/// Derived per-request from a verified credential; used only for
/// authorization decisions and never persisted.
#[derive(Debug, Clone)]
pub struct RequestingUser {
    pub uid: String,
    pub role: Role,
    pub seller_id: Option<String>,
    pub email: Option<String>,
}

impl RequestingUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Self-or-admin rule used by the profile/settings operations.
    pub fn may_act_on(&self, target_account_id: &str) -> bool {
        self.is_admin() || self.uid == target_account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str, role: Role) -> RequestingUser {
        RequestingUser {
            uid: uid.into(),
            role,
            seller_id: None,
            email: None,
        }
    }

    #[test]
    fn admin_may_act_on_anyone() {
        assert!(user("a", Role::Admin).may_act_on("b"));
    }

    #[test]
    fn non_admin_may_act_on_self_only() {
        let u = user("a", Role::User);
        assert!(u.may_act_on("a"));
        assert!(!u.may_act_on("b"));
    }
}
