//! Gateway Error Types
//!
//! Every failure the pipeline can observe, from any gate or from the
//! operation itself. These are folded into the canonical
//! `kernel::error::kind::ErrorKind` by the error translator.

use kernel::error::{app_error::AppError, kind::ErrorKind, store::StoreError};
use std::time::Duration;
use thiserror::Error;

use crate::application::translate::lookup_store_rule;
use crate::domain::value_object::role::Role;

/// Gateway result type alias
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error variants
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No credential on the request
    #[error("Missing credential")]
    MissingCredential,

    /// Credential is malformed or its signature does not verify
    #[error("Invalid credential")]
    InvalidCredential,

    /// Credential references no known session
    #[error("Session not found")]
    SessionNotFound,

    /// Session is expired or revoked
    #[error("Session expired or revoked")]
    SessionExpired,

    /// Session store failed during lookup (authentication fails closed)
    #[error("Session lookup failed: {0}")]
    SessionLookup(#[source] StoreError),

    /// Role does not satisfy the operation's requirement
    #[error("Role {actual} does not satisfy required role {required}")]
    Forbidden { required: Role, actual: Role },

    /// Quota exhausted for the current window
    #[error("Rate limit exceeded, retry after {retry_after_ms}ms")]
    RateLimited {
        limit: u32,
        retry_after_ms: i64,
        reset_at_ms: i64,
    },

    /// Operation produced no data
    #[error("Resource not found")]
    NotFound,

    /// Raw backing-store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Operation rejected with an already-canonical error
    #[error("Operation rejected: {0}")]
    Rejected(AppError),

    /// Operation exceeded its time budget
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Operation panicked
    #[error("Operation panicked: {0}")]
    Panicked(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Get the canonical ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::MissingCredential
            | GatewayError::InvalidCredential
            | GatewayError::SessionNotFound
            | GatewayError::SessionExpired
            | GatewayError::SessionLookup(_) => ErrorKind::Authentication,
            GatewayError::Forbidden { .. } => ErrorKind::Authorization,
            GatewayError::RateLimited { .. } => ErrorKind::RateLimitExceeded,
            GatewayError::NotFound => ErrorKind::NotFound,
            GatewayError::Store(err) => lookup_store_rule(err.code())
                .map(|rule| rule.kind)
                .unwrap_or(ErrorKind::DatabaseError),
            GatewayError::Rejected(err) => err.kind(),
            GatewayError::Timeout(_) => ErrorKind::DatabaseError,
            GatewayError::Panicked(_) | GatewayError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            GatewayError::SessionLookup(e) => {
                tracing::error!(error = %e, "Session store failed, rejecting request");
            }
            GatewayError::Store(e) => {
                tracing::error!(error = %e, code = ?e.code(), "Operation store error");
            }
            GatewayError::Timeout(after) => {
                tracing::error!(timeout = ?after, "Operation timed out");
            }
            GatewayError::Panicked(msg) => {
                tracing::error!(message = %msg, "Operation panicked");
            }
            GatewayError::Internal(msg) => {
                tracing::error!(message = %msg, "Gateway internal error");
            }
            GatewayError::InvalidCredential => {
                tracing::warn!("Invalid credential presented");
            }
            GatewayError::Forbidden { required, actual } => {
                tracing::warn!(%required, %actual, "Authorization denied");
            }
            GatewayError::RateLimited {
                limit,
                retry_after_ms,
                ..
            } => {
                tracing::warn!(limit, retry_after_ms, "Rate limit exceeded");
            }
            _ if self.kind().is_server_error() => {
                tracing::error!(error = %self, "Operation failed");
            }
            _ => {
                tracing::debug!(error = %self, "Gateway error");
            }
        }
    }
}

impl From<AppError> for GatewayError {
    fn from(err: AppError) -> Self {
        GatewayError::Rejected(err)
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        GatewayError::Store(StoreError::from(err))
    }
}
