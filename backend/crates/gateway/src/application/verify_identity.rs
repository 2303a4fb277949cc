//! Identity Verifier
//!
//! First gate: resolves the presented credential to a live session.
//! Fails closed on every error, including session-store failures.

use chrono::Utc;
use kernel::error::{kind::ErrorKind, store::StoreError};
use kernel::id::SessionId;
use platform::crypto::{constant_time_eq, from_base64_url, hmac_sha256, log_digest, to_base64_url};
use std::sync::Arc;

use crate::application::config::GatewayConfig;
use crate::domain::entity::identity::VerifiedSession;
use crate::domain::entity::request_context::RequestContext;
use crate::domain::repository::SessionRepository;
use crate::error::{GatewayError, GatewayResult};

/// Identity verifier
pub struct IdentityVerifier<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<GatewayConfig>,
}

impl<S> IdentityVerifier<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<GatewayConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Verify the request's credential and resolve it to a live session
    pub async fn verify(&self, context: &RequestContext) -> GatewayResult<VerifiedSession> {
        let token = context
            .identity_token()
            .ok_or(GatewayError::MissingCredential)?;

        let session_id = parse_session_token(token, &self.config.session_secret)
            .ok_or(GatewayError::InvalidCredential)?;

        let session = match self.session_repo.find_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!(
                    token = %log_digest(token),
                    "Credential references unknown session"
                );
                return Err(GatewayError::SessionNotFound);
            }
            Err(GatewayError::Store(e)) => return Err(GatewayError::SessionLookup(e)),
            Err(e) if e.kind() == ErrorKind::Authentication => return Err(e),
            Err(e) => return Err(GatewayError::SessionLookup(StoreError::new(e.to_string()))),
        };

        if !session.is_live_at(Utc::now().timestamp_millis()) {
            tracing::debug!(
                session_id = %session_id,
                revoked = session.revoked,
                "Session not live"
            );
            return Err(GatewayError::SessionExpired);
        }

        Ok(VerifiedSession {
            session_id,
            identity_id: session.identity_id,
        })
    }
}

/// Build a credential for a session: `<session-uuid>.<base64url(HMAC-SHA256)>`
pub fn issue_session_token(session_id: SessionId, secret: &[u8; 32]) -> String {
    let id = session_id.to_string();
    let signature = hmac_sha256(secret, id.as_bytes());
    format!("{}.{}", id, to_base64_url(&signature))
}

/// Verify a credential's signature and extract its session ID
fn parse_session_token(token: &str, secret: &[u8; 32]) -> Option<SessionId> {
    let (id_part, signature_part) = token.split_once('.')?;
    if signature_part.contains('.') {
        return None;
    }

    let provided = from_base64_url(signature_part).ok()?;
    let expected = hmac_sha256(secret, id_part.as_bytes());

    // Constant-time comparison
    if !constant_time_eq(&provided, &expected) {
        return None;
    }

    id_part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn test_token_roundtrip() {
        let session_id = SessionId::new();
        let token = issue_session_token(session_id, &SECRET);
        assert_eq!(parse_session_token(&token, &SECRET), Some(session_id));
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = issue_session_token(SessionId::new(), &SECRET);
        assert_eq!(parse_session_token(&token, &[8u8; 32]), None);
    }

    #[test]
    fn test_token_tampered_id() {
        let token = issue_session_token(SessionId::new(), &SECRET);
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", SessionId::new(), signature);
        assert_eq!(parse_session_token(&forged, &SECRET), None);
    }

    #[test]
    fn test_token_malformed() {
        assert_eq!(parse_session_token("", &SECRET), None);
        assert_eq!(parse_session_token("no-dot", &SECRET), None);
        assert_eq!(parse_session_token("a.b.c", &SECRET), None);
        assert_eq!(parse_session_token("abc.!!!", &SECRET), None);
    }
}
