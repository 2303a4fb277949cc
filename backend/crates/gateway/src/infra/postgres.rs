//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::SessionId;
use platform::rate_limit::{QuotaState, QuotaStore, QuotaStoreError, RateLimitConfig};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::session::Session;
use crate::domain::repository::{RoleRepository, SessionRepository};
use crate::domain::value_object::{identity_id::IdentityId, role::Role};
use crate::error::GatewayResult;

/// Rows removed by [`PgGatewayRepository::cleanup_expired`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub sessions: u64,
    pub quota_windows: u64,
}

/// PostgreSQL-backed gateway repository
#[derive(Clone)]
pub struct PgGatewayRepository {
    pool: PgPool,
}

impl PgGatewayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions and elapsed quota windows
    pub async fn cleanup_expired(&self) -> GatewayResult<CleanupReport> {
        let now_ms = Utc::now().timestamp_millis();

        let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at_ms < $1 OR revoked")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let quota_windows =
            sqlx::query("DELETE FROM quota_windows WHERE window_start_ms + window_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(CleanupReport {
            sessions,
            quota_windows,
        })
    }

    /// Persist a session (development seed and tests)
    pub async fn insert_session(&self, session: &Session) -> GatewayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id,
                identity_id,
                expires_at_ms,
                revoked,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.identity_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.revoked)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Assign a role to an identity, replacing any previous one
    pub async fn assign_role(&self, identity_id: &IdentityId, role: Role) -> GatewayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identity_roles (identity_id, role_code, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (identity_id) DO UPDATE SET
                role_code = EXCLUDED.role_code,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(identity_id.as_uuid())
        .bind(role.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgGatewayRepository {
    async fn find_by_id(&self, session_id: SessionId) -> GatewayResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                identity_id,
                expires_at_ms,
                revoked,
                created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgGatewayRepository {
    async fn find_role_code(&self, identity_id: &IdentityId) -> GatewayResult<Option<String>> {
        let code = sqlx::query_scalar::<_, String>(
            "SELECT role_code FROM identity_roles WHERE identity_id = $1",
        )
        .bind(identity_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }
}

// ============================================================================
// Quota Store Implementation
// ============================================================================

impl QuotaStore for PgGatewayRepository {
    /// Reset-or-increment in one statement; the row lock taken by the upsert
    /// serializes concurrent checks of the same key.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<QuotaState, QuotaStoreError> {
        let window_ms = config.window_ms();
        let limit = i32::try_from(config.max_requests).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, QuotaRow>(
            r#"
            INSERT INTO quota_windows (
                quota_key,
                window_start_ms,
                request_count,
                window_ms,
                request_limit
            ) VALUES ($1, $2, 1, $3, $4)
            ON CONFLICT (quota_key) DO UPDATE SET
                window_start_ms = CASE
                    WHEN $2 - quota_windows.window_start_ms >= $3 THEN $2
                    ELSE quota_windows.window_start_ms
                END,
                request_count = CASE
                    WHEN $2 - quota_windows.window_start_ms >= $3 THEN 1
                    ELSE quota_windows.request_count + 1
                END,
                window_ms = $3,
                request_limit = $4
            RETURNING window_start_ms, request_count
            "#,
        )
        .bind(key)
        .bind(now_ms)
        .bind(window_ms)
        .bind(limit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| QuotaStoreError::Backend(Box::new(e)))?;

        Ok(QuotaState {
            key: key.to_string(),
            window_start_ms: row.window_start_ms,
            count: u32::try_from(row.request_count).unwrap_or(0),
            limit: config.max_requests,
            window_ms,
        })
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    identity_id: Uuid,
    expires_at_ms: i64,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: SessionId::from_uuid(self.session_id),
            identity_id: IdentityId::from_uuid(self.identity_id),
            expires_at_ms: self.expires_at_ms,
            revoked: self.revoked,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuotaRow {
    window_start_ms: i64,
    request_count: i32,
}
