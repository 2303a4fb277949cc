//! Application Configuration
//!
//! Configuration for the gateway pipeline.

use std::time::Duration;

use crate::application::authorize::AuthorizationPolicy;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Session cookie name (fallback when no bearer token is sent)
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// How a role is compared against an operation's required role
    pub authorization_policy: AuthorizationPolicy,
    /// Value of the `X-API-Version` header
    pub api_version: String,
    /// Prefix of Problem Details `type` URIs
    pub problem_type_base: String,
    /// Public origin used to build pagination links
    pub public_base_url: String,
    /// `meta.source` tag on every envelope
    pub response_source: String,
    /// Time budget for the operation itself (gates excluded)
    pub operation_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "venue_session".to_string(),
            session_secret: [0u8; 32],
            authorization_policy: AuthorizationPolicy::Hierarchical,
            api_version: "1.0".to_string(),
            problem_type_base: "https://api.venuedesk.app/errors".to_string(),
            public_base_url: "http://localhost:31113".to_string(),
            response_source: "api".to_string(),
            operation_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl GatewayConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (random secret, no operation timeout)
    pub fn development() -> Self {
        Self {
            operation_timeout: None,
            ..Self::with_random_secret()
        }
    }

    /// Get operation timeout in milliseconds
    pub fn operation_timeout_ms(&self) -> Option<i64> {
        self.operation_timeout.map(|t| t.as_millis() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();

        assert_eq!(config.session_cookie_name, "venue_session");
        assert_eq!(config.authorization_policy, AuthorizationPolicy::Hierarchical);
        assert_eq!(config.api_version, "1.0");
        assert_eq!(config.operation_timeout_ms(), Some(10_000));
    }

    #[test]
    fn test_with_random_secret() {
        let config1 = GatewayConfig::with_random_secret();
        let config2 = GatewayConfig::with_random_secret();

        assert_ne!(config1.session_secret, config2.session_secret);
        assert!(config1.session_secret.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_development_config() {
        let config = GatewayConfig::development();

        assert!(config.operation_timeout.is_none());
        assert!(config.session_secret.iter().any(|&b| b != 0));
    }
}
