//! Repository Traits
//!
//! Interfaces for session and role lookups. Implementations are in the
//! infrastructure layer.

use kernel::id::SessionId;

use crate::domain::entity::session::Session;
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::GatewayResult;

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Find session by ID (expired and revoked sessions included)
    async fn find_by_id(&self, session_id: SessionId) -> GatewayResult<Option<Session>>;
}

/// Role repository trait
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    /// Current role code for an identity, as stored
    ///
    /// The code is returned raw; mapping unknown codes is the resolver's job.
    async fn find_role_code(&self, identity_id: &IdentityId) -> GatewayResult<Option<String>>;
}
