//! Rate Limiting Infrastructure
//!
//! Fixed-window quota accounting: the state type, the storage trait, and an
//! in-memory store.
//!
//! ## Algorithm
//! On every check for a key the window is reset when
//! `now - window_start >= window_ms` (`count = 0`, `window_start = now`),
//! then `count` is incremented. The request is over quota when
//! `count > limit`. Because windows are fixed, up to `2 × limit` requests
//! can pass across a window boundary.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn from_millis(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_millis(window_ms),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Quota state for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaState {
    pub key: String,
    pub window_start_ms: i64,
    /// Requests seen in the current window, including rejected ones
    pub count: u32,
    pub limit: u32,
    pub window_ms: i64,
}

impl QuotaState {
    /// Fresh state with an empty window starting at `now_ms`
    pub fn new(key: impl Into<String>, config: &RateLimitConfig, now_ms: i64) -> Self {
        Self {
            key: key.into(),
            window_start_ms: now_ms,
            count: 0,
            limit: config.max_requests,
            window_ms: config.window_ms(),
        }
    }

    /// Roll the window if it has elapsed, then count one request
    pub fn record(&mut self, config: &RateLimitConfig, now_ms: i64) {
        self.limit = config.max_requests;
        self.window_ms = config.window_ms();

        if self.is_window_elapsed(now_ms) {
            self.window_start_ms = now_ms;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
    }

    pub fn is_window_elapsed(&self, now_ms: i64) -> bool {
        now_ms - self.window_start_ms >= self.window_ms
    }

    pub fn is_exceeded(&self) -> bool {
        self.count > self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// Unix ms at which the current window ends
    pub fn reset_at_ms(&self) -> i64 {
        self.window_start_ms + self.window_ms
    }

    /// Time until the current window ends
    pub fn retry_after_ms(&self, now_ms: i64) -> i64 {
        (self.reset_at_ms() - now_ms).max(0)
    }
}

/// Error from the quota store's own infrastructure
#[derive(Debug, thiserror::Error)]
pub enum QuotaStoreError {
    #[error("Quota store unavailable: {0}")]
    Unavailable(String),

    #[error("Quota store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Trait for quota storage backends
///
/// Implementations must make the reset-increment of one key atomic with
/// respect to concurrent calls for the same key.
#[trait_variant::make(QuotaStore: Send)]
pub trait LocalQuotaStore {
    /// Count one request against `key` and return the updated state
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<QuotaState, QuotaStoreError>;
}

/// Entry count at which inserting a new key first drops elapsed windows
const PURGE_THRESHOLD: usize = 1024;

/// In-memory quota store
///
/// The outer map lock is held only to find or create the entry; the
/// increment itself runs under the per-key lock. Once the map reaches
/// [`PURGE_THRESHOLD`] keys, elapsed windows are dropped before a new key
/// is inserted.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuotaStore {
    entries: Arc<Mutex<HashMap<String, Arc<Mutex<QuotaState>>>>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> Arc<Mutex<QuotaState>> {
        let mut entries = self.entries.lock();
        if entries.len() >= PURGE_THRESHOLD && !entries.contains_key(key) {
            purge_elapsed(&mut entries, now_ms);
        }
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(QuotaState::new(key, config, now_ms))))
            .clone()
    }

    /// Count one request (synchronous core of the store)
    pub fn record(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> QuotaState {
        let entry = self.entry(key, config, now_ms);
        let mut state = entry.lock();
        state.record(config, now_ms);
        state.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge_elapsed(entries: &mut HashMap<String, Arc<Mutex<QuotaState>>>, now_ms: i64) -> usize {
    let before = entries.len();
    entries.retain(|_, state| !state.lock().is_window_elapsed(now_ms));
    let purged = before - entries.len();
    if purged > 0 {
        tracing::debug!(purged, remaining = entries.len(), "Purged expired quota windows");
    }
    purged
}

impl QuotaStore for MemoryQuotaStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<QuotaState, QuotaStoreError> {
        Ok(self.record(key, config, now_ms))
    }
}
