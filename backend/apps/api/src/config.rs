//! Server Configuration
//!
//! Reads the process environment (after `.env` has been loaded) into the
//! gateway configuration plus the server's own settings.

use gateway::GatewayConfig;
use gateway::application::authorize::AuthorizationPolicy;
use platform::config::{EnvError, env_opt, env_or, env_required, split_list};
use platform::crypto::from_base64;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub gateway: GatewayConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("SESSION_SECRET is not valid base64: {0}")]
    SecretEncoding(#[from] base64::DecodeError),

    #[error("SESSION_SECRET must decode to 32 bytes, got {0}")]
    SecretLength(usize),
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env_required("DATABASE_URL")?;
        let listen_addr = env_or("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;
        let frontend_origins = split_list(&env_or(
            "FRONTEND_ORIGINS",
            DEFAULT_FRONTEND_ORIGINS.to_string(),
        )?);

        Ok(Self {
            database_url,
            listen_addr,
            frontend_origins,
            gateway: gateway_config_from_env()?,
        })
    }
}

fn gateway_config_from_env() -> Result<GatewayConfig, ConfigError> {
    // Debug builds fall back to a random secret; release builds require one.
    let mut config = match env_opt::<String>("SESSION_SECRET")? {
        Some(encoded) => GatewayConfig {
            session_secret: decode_secret(&encoded)?,
            ..GatewayConfig::default()
        },
        None if cfg!(debug_assertions) => GatewayConfig::development(),
        None => return Err(EnvError::Missing("SESSION_SECRET".to_string()).into()),
    };

    config.authorization_policy = env_or("AUTHZ_POLICY", config.authorization_policy)?;
    if let Some(base) = env_opt::<String>("PUBLIC_BASE_URL")? {
        config.public_base_url = base;
    }
    // 0 disables the operation timeout
    if let Some(ms) = env_opt::<u64>("OPERATION_TIMEOUT_MS")? {
        config.operation_timeout = (ms > 0).then(|| Duration::from_millis(ms));
    }

    Ok(config)
}

fn decode_secret(encoded: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = from_base64(encoded.trim())?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::SecretLength(bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::crypto::to_base64;

    #[test]
    fn test_decode_secret() {
        let encoded = to_base64(&[7u8; 32]);
        assert_eq!(decode_secret(&encoded).unwrap(), [7u8; 32]);
    }

    #[test]
    fn test_decode_secret_rejects_wrong_length() {
        let encoded = to_base64(&[7u8; 16]);
        assert!(matches!(
            decode_secret(&encoded),
            Err(ConfigError::SecretLength(16))
        ));
        assert!(matches!(
            decode_secret("%%%"),
            Err(ConfigError::SecretEncoding(_))
        ));
    }
}
