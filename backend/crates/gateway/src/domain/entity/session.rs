//! Session Entity
//!
//! A server-side session referenced by the presented credential.
//! Issuing and refreshing sessions is done elsewhere; the gateway only reads them.

use chrono::{DateTime, Duration, Utc};
use kernel::id::SessionId;

use crate::domain::value_object::identity_id::IdentityId;

/// Session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4)
    pub session_id: SessionId,
    /// Owner of the session
    pub identity_id: IdentityId,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Revoked sessions stay in the table until cleanup
    pub revoked: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session valid for `ttl`
    pub fn new(identity_id: IdentityId, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            identity_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            revoked: false,
            created_at: now,
        }
    }

    /// Check if session has expired at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Live = not revoked and not expired
    pub fn is_live_at(&self, now_ms: i64) -> bool {
        !self.revoked && !self.is_expired_at(now_ms)
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_live() {
        let session = Session::new(IdentityId::new(), Duration::hours(1));
        assert!(session.is_live_at(Utc::now().timestamp_millis()));
    }

    #[test]
    fn test_expiry_boundary() {
        let mut session = Session::new(IdentityId::new(), Duration::hours(1));
        session.expires_at_ms = 1_000;
        assert!(!session.is_expired_at(999));
        assert!(session.is_expired_at(1_000));
    }

    #[test]
    fn test_revoked_session_is_not_live() {
        let mut session = Session::new(IdentityId::new(), Duration::hours(1));
        session.revoke();
        assert!(!session.is_live_at(Utc::now().timestamp_millis()));
    }
}
