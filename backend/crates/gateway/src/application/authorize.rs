//! Authorization
//!
//! [`RoleResolver`] turns a verified session into an [`Identity`] with its
//! current role; [`Authorizer`] checks that role against an operation's
//! requirement under the configured [`AuthorizationPolicy`].
//!
//! Role lookup degrades to `USER` on any failure (fail-safe-low): the request
//! continues with the least privilege rather than being rejected outright.

use std::str::FromStr;
use std::sync::Arc;

use crate::domain::entity::identity::{Identity, VerifiedSession};
use crate::domain::repository::RoleRepository;
use crate::domain::value_object::role::Role;
use crate::error::{GatewayError, GatewayResult};

/// Role comparison policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationPolicy {
    /// Role must equal the required role
    ExactMatch,
    /// Role must be at least the required role (`USER < STAFF < MANAGER < ADMIN`)
    #[default]
    Hierarchical,
}

impl AuthorizationPolicy {
    pub fn permits(&self, actual: Role, required: Role) -> bool {
        match self {
            AuthorizationPolicy::ExactMatch => actual == required,
            AuthorizationPolicy::Hierarchical => actual.is_at_least(required),
        }
    }
}

impl FromStr for AuthorizationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact_match" => Ok(AuthorizationPolicy::ExactMatch),
            "hierarchical" => Ok(AuthorizationPolicy::Hierarchical),
            other => Err(format!("unknown authorization policy: {other}")),
        }
    }
}

/// Role resolver
pub struct RoleResolver<R>
where
    R: RoleRepository,
{
    role_repo: Arc<R>,
}

impl<R> RoleResolver<R>
where
    R: RoleRepository,
{
    pub fn new(role_repo: Arc<R>) -> Self {
        Self { role_repo }
    }

    /// Look up the current role; never fails
    pub async fn resolve(&self, session: &VerifiedSession) -> Identity {
        let identity_id = session.identity_id;

        let role = match self.role_repo.find_role_code(&identity_id).await {
            Ok(Some(code)) => Role::from_code(&code).unwrap_or_else(|| {
                tracing::warn!(%identity_id, code = %code, "Unknown role code, using USER");
                Role::User
            }),
            Ok(None) => {
                tracing::debug!(%identity_id, "No role assigned, using USER");
                Role::User
            }
            Err(e) => {
                tracing::warn!(%identity_id, error = %e, "Role lookup failed, using USER");
                Role::User
            }
        };

        Identity::new(identity_id, role)
    }
}

/// Authorizer
#[derive(Debug, Clone, Copy)]
pub struct Authorizer {
    policy: AuthorizationPolicy,
}

impl Authorizer {
    pub fn new(policy: AuthorizationPolicy) -> Self {
        Self { policy }
    }

    pub fn authorize(&self, identity: &Identity, required: Role) -> GatewayResult<()> {
        if self.policy.permits(identity.role, required) {
            Ok(())
        } else {
            Err(GatewayError::Forbidden {
                required,
                actual: identity.role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::identity_id::IdentityId;

    fn identity(role: Role) -> Identity {
        Identity::new(IdentityId::new(), role)
    }

    #[test]
    fn test_exact_match_rejects_higher_role() {
        let authorizer = Authorizer::new(AuthorizationPolicy::ExactMatch);
        assert!(authorizer.authorize(&identity(Role::Manager), Role::Manager).is_ok());
        assert!(matches!(
            authorizer.authorize(&identity(Role::Admin), Role::Manager),
            Err(GatewayError::Forbidden {
                required: Role::Manager,
                actual: Role::Admin
            })
        ));
    }

    #[test]
    fn test_hierarchical_accepts_higher_role() {
        let authorizer = Authorizer::new(AuthorizationPolicy::Hierarchical);
        assert!(authorizer.authorize(&identity(Role::Admin), Role::Manager).is_ok());
        assert!(authorizer.authorize(&identity(Role::Manager), Role::Staff).is_ok());
        assert!(authorizer.authorize(&identity(Role::User), Role::Manager).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "exact".parse::<AuthorizationPolicy>(),
            Ok(AuthorizationPolicy::ExactMatch)
        );
        assert_eq!(
            "Hierarchical".parse::<AuthorizationPolicy>(),
            Ok(AuthorizationPolicy::Hierarchical)
        );
        assert!("loose".parse::<AuthorizationPolicy>().is_err());
    }
}
