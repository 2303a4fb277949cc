//! Client identification
//!
//! Reads the client address and the presented credential from request headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Resolve the client address used for address-keyed quotas
///
/// The left-most `X-Forwarded-For` entry wins, then `X-Real-IP`, then the
/// peer address of the connection. Unparsable header values are skipped.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .and_then(parse_ip);

    forwarded
        .or_else(|| header_str(headers, "x-real-ip").and_then(parse_ip))
        .or(direct_ip)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

/// Extract a bearer token from the `Authorization` header
///
/// The scheme is matched case-insensitively; an empty token is treated as absent.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Value of the cookie `name`, with surrounding quotes removed
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, header::COOKIE.as_str())?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Extract the presented credential
///
/// `Authorization: Bearer` wins over the session cookie when both are present.
pub fn extract_credential(headers: &HeaderMap, session_cookie_name: &str) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, session_cookie_name))
}
