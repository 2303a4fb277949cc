//! Request context extraction
//!
//! Builds the immutable [`RequestContext`] from an inbound axum request.

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap, Method, Uri};
use platform::client::{extract_client_ip, extract_credential};
use std::net::SocketAddr;

use crate::domain::entity::request_context::RequestContext;

/// Build the request context for one inbound request
///
/// The credential is read from `Authorization: Bearer` first, then from the
/// session cookie. The client address honours `X-Forwarded-For`.
pub fn build_request_context(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    extensions: &Extensions,
    session_cookie_name: &str,
) -> RequestContext {
    let direct_ip = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let query_params = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    RequestContext::builder(method.as_str(), uri.path())
        .identity_token(extract_credential(headers, session_cookie_name))
        .query_params(query_params)
        .client_ip(extract_client_ip(headers, direct_ip))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::net::IpAddr;

    #[test]
    fn test_build_request_context() {
        let uri: Uri = "/api/customers?page=2&perPage=20&q=caf%C3%A9".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        headers.insert("cookie", HeaderValue::from_static("venue_session=cookie-token"));

        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5555))));

        let ctx = build_request_context(&Method::GET, &uri, &headers, &extensions, "venue_session");

        assert_eq!(ctx.method(), "GET");
        assert_eq!(ctx.path(), "/api/customers");
        assert_eq!(ctx.identity_token(), Some("abc.def"));
        assert_eq!(ctx.query_param("page"), Some("2"));
        assert_eq!(ctx.query_param("q"), Some("café"));
        assert_eq!(ctx.client_ip(), Some("10.1.2.3".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn test_cookie_fallback_without_connect_info() {
        let uri: Uri = "/api/inventory".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; venue_session=tok"));

        let ctx = build_request_context(
            &Method::GET,
            &uri,
            &headers,
            &Extensions::new(),
            "venue_session",
        );

        assert_eq!(ctx.identity_token(), Some("tok"));
        assert!(ctx.client_ip().is_none());
        assert!(ctx.query_params().is_empty());
    }
}
