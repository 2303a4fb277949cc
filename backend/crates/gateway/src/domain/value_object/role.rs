use serde::{Deserialize, Serialize};
use std::fmt;

/// Staff role, declared from least to most privileged
///
/// The derived `Ord` is the privilege order used by hierarchical authorization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Staff,
    Manager,
    Admin,
}

impl Role {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            User => "user",
            Staff => "staff",
            Manager => "manager",
            Admin => "admin",
        }
    }

    /// `true` when this role dominates `required` in privilege order
    #[inline]
    pub fn is_at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Parse a stored role code (case-insensitive)
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code.trim().to_ascii_lowercase().as_str() {
            "user" => Some(User),
            "staff" => Some(Staff),
            "manager" => Some(Manager),
            "admin" => Some(Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_code() {
        assert_eq!(Role::from_code("staff"), Some(Role::Staff));
        assert_eq!(Role::from_code("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::from_code("owner"), None);
    }

    #[test]
    fn test_role_order() {
        assert!(Role::Admin.is_at_least(Role::Manager));
        assert!(Role::Manager.is_at_least(Role::Manager));
        assert!(!Role::Staff.is_at_least(Role::Manager));
        assert!(!Role::User.is_at_least(Role::Staff));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"MANAGER\"");
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
