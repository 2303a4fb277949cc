//! Request Context
//!
//! Immutable per-request value built once at pipeline entry and passed to
//! every gate by reference.

use chrono::{DateTime, Utc};
use kernel::id::RequestId;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

/// Inbound request as seen by the gateway
///
/// Fields are private; the only way to get one is [`RequestContext::builder`].
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    identity_token: Option<String>,
    timestamp: DateTime<Utc>,
    method: String,
    path: String,
    query_params: BTreeMap<String, String>,
    client_ip: Option<IpAddr>,
}

impl RequestContext {
    pub fn builder(method: impl Into<String>, path: impl Into<String>) -> RequestContextBuilder {
        RequestContextBuilder {
            method: method.into(),
            path: path.into(),
            identity_token: None,
            query_params: BTreeMap::new(),
            client_ip: None,
            timestamp: None,
        }
    }

    #[inline]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    pub fn identity_token(&self) -> Option<&str> {
        self.identity_token.as_deref()
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    #[inline]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[inline]
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }
}

// The credential never reaches Debug output.
impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("has_identity_token", &self.identity_token.is_some())
            .field("timestamp", &self.timestamp)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_params", &self.query_params)
            .field("client_ip", &self.client_ip)
            .finish()
    }
}

/// Builder consumed by [`RequestContextBuilder::build`]
#[derive(Debug)]
pub struct RequestContextBuilder {
    method: String,
    path: String,
    identity_token: Option<String>,
    query_params: BTreeMap<String, String>,
    client_ip: Option<IpAddr>,
    timestamp: Option<DateTime<Utc>>,
}

impl RequestContextBuilder {
    pub fn identity_token(mut self, token: Option<String>) -> Self {
        self.identity_token = token;
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Override the receive time (defaults to now)
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Assign a fresh request id and freeze the context
    pub fn build(self) -> RequestContext {
        RequestContext {
            request_id: RequestId::new(),
            identity_token: self.identity_token,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            method: self.method,
            path: self.path,
            query_params: self.query_params,
            client_ip: self.client_ip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assigns_unique_ids() {
        let a = RequestContext::builder("GET", "/api/customers").build();
        let b = RequestContext::builder("GET", "/api/customers").build();
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_query_params() {
        let ctx = RequestContext::builder("GET", "/api/customers")
            .query_param("page", "2")
            .query_params([("perPage", "20")])
            .build();
        assert_eq!(ctx.query_param("page"), Some("2"));
        assert_eq!(ctx.query_param("perPage"), Some("20"));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn test_debug_hides_token() {
        let ctx = RequestContext::builder("GET", "/")
            .identity_token(Some("secret-token".to_string()))
            .build();
        let debug = format!("{ctx:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("has_identity_token: true"));
    }
}
