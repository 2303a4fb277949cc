//! Identity Entity
//!
//! The caller as seen by the authorization gate. Built fresh for every
//! request; the role is looked up each time and never cached.

use kernel::id::SessionId;

use crate::domain::value_object::{identity_id::IdentityId, role::Role};

/// Output of credential verification, before the role is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedSession {
    pub session_id: SessionId,
    pub identity_id: IdentityId,
}

/// Authenticated caller with its current role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub role: Role,
}

impl Identity {
    pub fn new(id: IdentityId, role: Role) -> Self {
        Self { id, role }
    }
}
