//! Quota Tracker
//!
//! Third gate: fixed-window rate limiting per quota key.
//!
//! ## Failure policy
//! A failing quota store lets the request through (fail-open) and logs a
//! warning. This is the opposite of authentication, which fails closed.

use chrono::Utc;
use platform::rate_limit::{QuotaStore, RateLimitConfig};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entity::identity::Identity;
use crate::domain::entity::request_context::RequestContext;

/// Custom key derivation supplied by a feature
pub type KeyFn = Arc<dyn Fn(&Identity, &RequestContext) -> String + Send + Sync>;

/// How a quota key is derived from the caller
#[derive(Clone, Default)]
pub enum QuotaKeyStrategy {
    /// One bucket per identity
    #[default]
    Identity,
    /// One bucket per identity and source address
    IdentityAndAddress,
    /// One bucket per source address (identity when the address is unknown)
    Address,
    /// Feature-specific derivation
    Custom(KeyFn),
}

impl fmt::Debug for QuotaKeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKeyStrategy::Identity => f.write_str("Identity"),
            QuotaKeyStrategy::IdentityAndAddress => f.write_str("IdentityAndAddress"),
            QuotaKeyStrategy::Address => f.write_str("Address"),
            QuotaKeyStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Rate limit policy of one feature
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Key prefix, usually the feature name (`customers`, `inventory`, ...)
    pub scope: String,
    pub config: RateLimitConfig,
    pub key_strategy: QuotaKeyStrategy,
}

impl RateLimitPolicy {
    pub fn new(scope: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            scope: scope.into(),
            config: RateLimitConfig {
                max_requests,
                window,
            },
            key_strategy: QuotaKeyStrategy::default(),
        }
    }

    pub fn with_key_strategy(mut self, key_strategy: QuotaKeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    /// Derive the quota key for a caller; deterministic for the same inputs
    pub fn key(&self, identity: &Identity, context: &RequestContext) -> String {
        let suffix = match &self.key_strategy {
            QuotaKeyStrategy::Identity => format!("id:{}", identity.id),
            QuotaKeyStrategy::IdentityAndAddress => match context.client_ip() {
                Some(ip) => format!("id:{}:ip:{}", identity.id, ip),
                None => format!("id:{}:ip:unknown", identity.id),
            },
            QuotaKeyStrategy::Address => match context.client_ip() {
                Some(ip) => format!("ip:{ip}"),
                None => format!("id:{}", identity.id),
            },
            QuotaKeyStrategy::Custom(key_fn) => key_fn(identity, context),
        };
        format!("{}:{}", self.scope, suffix)
    }
}

/// Quota figures reported in `X-RateLimit-*` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// `snapshot` is `None` when the store failed and the check was skipped
    Allowed { snapshot: Option<QuotaSnapshot> },
    Denied {
        retry_after_ms: i64,
        snapshot: QuotaSnapshot,
    },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }

    pub fn snapshot(&self) -> Option<QuotaSnapshot> {
        match self {
            QuotaDecision::Allowed { snapshot } => *snapshot,
            QuotaDecision::Denied { snapshot, .. } => Some(*snapshot),
        }
    }
}

/// Quota tracker
pub struct QuotaTracker<Q>
where
    Q: QuotaStore,
{
    store: Arc<Q>,
}

impl<Q> QuotaTracker<Q>
where
    Q: QuotaStore,
{
    pub fn new(store: Arc<Q>) -> Self {
        Self { store }
    }

    /// Count one request against `key` now
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> QuotaDecision {
        self.check_at(key, config, Utc::now().timestamp_millis()).await
    }

    /// Count one request against `key` at `now_ms`
    pub async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> QuotaDecision {
        let state = match self.store.check_and_increment(key, config, now_ms).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(key, error = %e, "Quota store failed, allowing request");
                return QuotaDecision::Allowed { snapshot: None };
            }
        };

        let snapshot = QuotaSnapshot {
            limit: state.limit,
            remaining: state.remaining(),
            reset_at_ms: state.reset_at_ms(),
        };

        if state.is_exceeded() {
            QuotaDecision::Denied {
                retry_after_ms: state.retry_after_ms(now_ms),
                snapshot,
            }
        } else {
            QuotaDecision::Allowed {
                snapshot: Some(snapshot),
            }
        }
    }
}
