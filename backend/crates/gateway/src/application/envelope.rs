//! Response Envelope Builder
//!
//! Assembles the uniform success/error envelope and the response headers.

use chrono::{DateTime, Utc};
use derive_more::Display;
use http::{HeaderMap, HeaderName, HeaderValue};
use kernel::id::RequestId;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::application::quota::QuotaSnapshot;
use crate::application::translate::{ErrorDescriptor, retry_after_secs};
use crate::domain::entity::request_context::RequestContext;

/// Default page size when `perPage` is absent
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Upper bound on `perPage`
pub const MAX_PER_PAGE: u32 = 100;

// ============================================================================
// Envelope
// ============================================================================

/// Uniform response wrapper
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
    pub meta: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<T> ServiceResponse<T> {
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub request_id: RequestId,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Pagination metadata, derived purely from `(page, per_page, total)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    /// ## Examples
    /// ```rust
    /// use gateway::application::envelope::PaginationMeta;
    ///
    /// let meta = PaginationMeta::new(2, 20, 45);
    /// assert_eq!(meta.total_pages, 3);
    /// assert!(meta.has_next && meta.has_prev);
    /// ```
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Page requested by the caller (`page`, `perPage` query parameters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Read the page from query parameters; bad values fall back to defaults
    pub fn from_context(context: &RequestContext) -> Self {
        let page = context
            .query_param("page")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let per_page = context
            .query_param("perPage")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(MAX_PER_PAGE))
            .unwrap_or(DEFAULT_PER_PAGE);

        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of items plus the total item count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Navigation links of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl Links {
    /// Build links by rewriting the `page` parameter of `base_url + path`
    pub fn build(
        base_url: &str,
        context: &RequestContext,
        pagination: &PaginationMeta,
    ) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?.join(context.path())?;

        let page_url = |page: u32| {
            let mut url = base.clone();
            {
                let mut pairs = url.query_pairs_mut();
                pairs.clear();
                for (key, value) in context.query_params() {
                    if key != "page" {
                        pairs.append_pair(key, value);
                    }
                }
                pairs.append_pair("page", &page.to_string());
            }
            url.to_string()
        };

        let last_page = pagination.total_pages.max(1);
        Ok(Self {
            self_link: page_url(pagination.page),
            first: page_url(1),
            last: page_url(last_page),
            prev: pagination.has_prev.then(|| page_url(pagination.page - 1)),
            next: pagination.has_next.then(|| page_url(pagination.page + 1)),
        })
    }
}

// ============================================================================
// Headers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CacheStatus {
    #[display("HIT")]
    Hit,
    #[display("MISS")]
    Miss,
}

/// Per-response options supplied by the pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseOptions {
    pub pagination: Option<PaginationMeta>,
    /// `Some` marks the response as cacheable for this long
    pub cache_ttl: Option<Duration>,
    pub cache_status: Option<CacheStatus>,
}

/// Response headers, kept typed until conversion into a [`HeaderMap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub request_id: RequestId,
    pub api_version: String,
    pub rate_limit: Option<QuotaSnapshot>,
    pub retry_after_secs: Option<i64>,
    pub cache_status: Option<CacheStatus>,
    pub cache_control: String,
}

impl ResponseHeaders {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("x-request-id", self.request_id.to_string()),
            ("x-api-version", self.api_version.clone()),
        ];
        if let Some(quota) = self.rate_limit {
            pairs.push(("x-ratelimit-limit", quota.limit.to_string()));
            pairs.push(("x-ratelimit-remaining", quota.remaining.to_string()));
            pairs.push((
                "x-ratelimit-reset",
                (quota.reset_at_ms.max(0) as u64).div_ceil(1000).to_string(),
            ));
        }
        if let Some(secs) = self.retry_after_secs {
            pairs.push(("retry-after", secs.to_string()));
        }
        if let Some(status) = self.cache_status {
            pairs.push(("x-cache", status.to_string()));
        }
        pairs.push(("cache-control", self.cache_control.clone()));
        pairs
    }

    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in self.pairs() {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    map.insert(HeaderName::from_static(name), value);
                }
                Err(_) => tracing::warn!(header = name, "Dropping header with invalid value"),
            }
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.pairs()
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Response envelope builder
#[derive(Debug, Clone)]
pub struct ResponseEnvelopeBuilder {
    api_version: String,
    source: Option<String>,
    public_base_url: String,
}

impl ResponseEnvelopeBuilder {
    pub fn new(
        api_version: impl Into<String>,
        source: Option<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            source,
            public_base_url: public_base_url.into(),
        }
    }

    fn meta(&self, context: &RequestContext, pagination: Option<PaginationMeta>) -> ResponseMeta {
        ResponseMeta {
            request_id: context.request_id(),
            timestamp: Utc::now(),
            source: self.source.clone(),
            duration_ms: None,
            pagination,
        }
    }

    pub fn build_success<T>(
        &self,
        data: T,
        context: &RequestContext,
        options: &ResponseOptions,
    ) -> ServiceResponse<T> {
        let links = options.pagination.as_ref().and_then(|pagination| {
            Links::build(&self.public_base_url, context, pagination)
                .inspect_err(|e| tracing::warn!(error = %e, "Failed to build pagination links"))
                .ok()
        });

        ServiceResponse {
            success: true,
            data: Some(data),
            error: None,
            meta: self.meta(context, options.pagination),
            links,
        }
    }

    pub fn build_error<T>(
        &self,
        descriptor: ErrorDescriptor,
        context: &RequestContext,
    ) -> ServiceResponse<T> {
        ServiceResponse {
            success: false,
            data: None,
            error: Some(descriptor),
            meta: self.meta(context, None),
            links: None,
        }
    }

    /// Headers for a success response
    pub fn success_headers(
        &self,
        context: &RequestContext,
        options: &ResponseOptions,
        quota: Option<QuotaSnapshot>,
    ) -> ResponseHeaders {
        ResponseHeaders {
            request_id: context.request_id(),
            api_version: self.api_version.clone(),
            rate_limit: quota,
            retry_after_secs: None,
            cache_status: options.cache_status,
            cache_control: cache_control(options.cache_ttl),
        }
    }

    /// Headers for an error response; never cacheable
    pub fn error_headers(
        &self,
        context: &RequestContext,
        descriptor: &ErrorDescriptor,
        quota: Option<QuotaSnapshot>,
    ) -> ResponseHeaders {
        ResponseHeaders {
            request_id: context.request_id(),
            api_version: self.api_version.clone(),
            rate_limit: quota,
            retry_after_secs: descriptor.retry_after_ms.map(retry_after_secs),
            cache_status: None,
            cache_control: cache_control(None),
        }
    }
}

fn cache_control(ttl: Option<Duration>) -> String {
    match ttl {
        Some(ttl) => format!("public, max-age={}", ttl.as_secs()),
        None => "no-store".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn builder() -> ResponseEnvelopeBuilder {
        ResponseEnvelopeBuilder::new("1.0", Some("api".into()), "https://venue.example")
    }

    #[test]
    fn test_pagination_meta() {
        assert_eq!(
            PaginationMeta::new(2, 20, 45),
            PaginationMeta {
                page: 2,
                per_page: 20,
                total: 45,
                total_pages: 3,
                has_next: true,
                has_prev: true,
            }
        );

        let last = PaginationMeta::new(3, 20, 45);
        assert!(!last.has_next);

        let empty = PaginationMeta::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next && !empty.has_prev);
    }

    proptest! {
        #[test]
        fn prop_total_pages_covers_total(
            page in 1u32..500,
            per_page in 1u32..200,
            total in 0u64..100_000
        ) {
            let meta = PaginationMeta::new(page, per_page, total);
            let per_page = u64::from(per_page);
            prop_assert!(u64::from(meta.total_pages) * per_page >= total);
            prop_assert!(u64::from(meta.total_pages.saturating_sub(1)) * per_page < total.max(1));
            prop_assert_eq!(meta.has_next, page < meta.total_pages);
            prop_assert_eq!(meta.has_prev, page > 1);
        }
    }

    #[test]
    fn test_page_request_from_context() {
        let ctx = RequestContext::builder("GET", "/api/customers")
            .query_param("page", "3")
            .query_param("perPage", "500")
            .build();
        let page = PageRequest::from_context(&ctx);
        assert_eq!(
            page,
            PageRequest {
                page: 3,
                per_page: MAX_PER_PAGE
            }
        );
        assert_eq!(page.offset(), 200);

        let ctx = RequestContext::builder("GET", "/api/customers")
            .query_param("page", "0")
            .query_param("perPage", "abc")
            .build();
        assert_eq!(PageRequest::from_context(&ctx), PageRequest::default());
    }

    #[test]
    fn test_links_rewrite_page() {
        let ctx = RequestContext::builder("GET", "/api/customers")
            .query_param("page", "2")
            .query_param("perPage", "20")
            .build();
        let meta = PaginationMeta::new(2, 20, 45);
        let links = Links::build("https://venue.example", &ctx, &meta).unwrap();

        assert_eq!(links.self_link, "https://venue.example/api/customers?perPage=20&page=2");
        assert_eq!(links.first, "https://venue.example/api/customers?perPage=20&page=1");
        assert_eq!(links.last, "https://venue.example/api/customers?perPage=20&page=3");
        assert_eq!(
            links.prev.as_deref(),
            Some("https://venue.example/api/customers?perPage=20&page=1")
        );
        assert_eq!(
            links.next.as_deref(),
            Some("https://venue.example/api/customers?perPage=20&page=3")
        );
    }

    #[test]
    fn test_success_envelope_shape() {
        let ctx = RequestContext::builder("GET", "/api/customers").build();
        let options = ResponseOptions {
            pagination: Some(PaginationMeta::new(1, 20, 5)),
            ..Default::default()
        };
        let envelope = builder().build_success(vec![1, 2], &ctx, &options).with_duration_ms(12);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["requestId"], ctx.request_id().to_string());
        assert_eq!(json["meta"]["source"], "api");
        assert_eq!(json["meta"]["durationMs"], 12);
        assert_eq!(json["meta"]["pagination"]["perPage"], 20);
        assert_eq!(json["links"]["self"], "https://venue.example/api/customers?page=1");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_cache_headers() {
        let ctx = RequestContext::builder("GET", "/api/customers").build();
        let cacheable = ResponseOptions {
            cache_ttl: Some(Duration::from_secs(30)),
            cache_status: Some(CacheStatus::Miss),
            ..Default::default()
        };
        let headers = builder().success_headers(&ctx, &cacheable, None);
        assert_eq!(headers.get("Cache-Control").as_deref(), Some("public, max-age=30"));
        assert_eq!(headers.get("X-Cache").as_deref(), Some("MISS"));
        assert!(headers.get("X-RateLimit-Limit").is_none());

        let headers = builder().success_headers(&ctx, &ResponseOptions::default(), None);
        assert_eq!(headers.get("Cache-Control").as_deref(), Some("no-store"));
    }

    #[test]
    fn test_rate_limit_headers() {
        let ctx = RequestContext::builder("GET", "/api/customers").build();
        let quota = QuotaSnapshot {
            limit: 10,
            remaining: 4,
            reset_at_ms: 1_700_000_000_500,
        };
        let map = builder()
            .success_headers(&ctx, &ResponseOptions::default(), Some(quota))
            .to_header_map();

        assert_eq!(map["x-ratelimit-limit"], "10");
        assert_eq!(map["x-ratelimit-remaining"], "4");
        assert_eq!(map["x-ratelimit-reset"], "1700000001");
        assert_eq!(map["x-api-version"], "1.0");
        assert_eq!(map["x-request-id"], ctx.request_id().to_string().as_str());
    }
}
