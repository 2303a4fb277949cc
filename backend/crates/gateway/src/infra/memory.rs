//! In-Memory Repository Implementations
//!
//! Backs the unit and router tests and embedders that run the gateway
//! without PostgreSQL. The API binary always uses the Postgres repositories.

use chrono::Duration;
use kernel::id::SessionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entity::session::Session;
use crate::domain::repository::{RoleRepository, SessionRepository};
use crate::domain::value_object::{identity_id::IdentityId, role::Role};
use crate::error::GatewayResult;

/// In-memory sessions and role assignments
#[derive(Clone, Default)]
pub struct MemoryGatewayRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    roles: Arc<RwLock<HashMap<IdentityId, String>>>,
}

impl MemoryGatewayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, session: Session) {
        self.sessions.write().insert(session.session_id, session);
    }

    /// Store a raw role code, valid or not
    pub fn set_role_code(&self, identity_id: IdentityId, code: impl Into<String>) {
        self.roles.write().insert(identity_id, code.into());
    }

    pub fn assign_role(&self, identity_id: IdentityId, role: Role) {
        self.set_role_code(identity_id, role.code());
    }

    /// Create an identity with `role` and a live session for it
    pub fn seed_identity(&self, role: Role, ttl: Duration) -> Session {
        let identity_id = IdentityId::new();
        self.assign_role(identity_id, role);
        let session = Session::new(identity_id, ttl);
        self.insert_session(session.clone());
        session
    }

    pub fn revoke_session(&self, session_id: SessionId) -> bool {
        match self.sessions.write().get_mut(&session_id) {
            Some(session) => {
                session.revoke();
                true
            }
            None => false,
        }
    }
}

impl SessionRepository for MemoryGatewayRepository {
    async fn find_by_id(&self, session_id: SessionId) -> GatewayResult<Option<Session>> {
        Ok(self.sessions.read().get(&session_id).cloned())
    }
}

impl RoleRepository for MemoryGatewayRepository {
    async fn find_role_code(&self, identity_id: &IdentityId) -> GatewayResult<Option<String>> {
        Ok(self.roles.read().get(identity_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_identity() {
        let repo = MemoryGatewayRepository::new();
        let session = repo.seed_identity(Role::Manager, Duration::hours(1));

        let found = repo.find_by_id(session.session_id).await.unwrap().unwrap();
        assert_eq!(found.identity_id, session.identity_id);
        assert_eq!(
            repo.find_role_code(&session.identity_id).await.unwrap().as_deref(),
            Some("manager")
        );
    }

    #[tokio::test]
    async fn test_revoke_session() {
        let repo = MemoryGatewayRepository::new();
        let session = repo.seed_identity(Role::Staff, Duration::hours(1));

        assert!(repo.revoke_session(session.session_id));
        assert!(repo.find_by_id(session.session_id).await.unwrap().unwrap().revoked);
        assert!(!repo.revoke_session(SessionId::new()));
    }
}
