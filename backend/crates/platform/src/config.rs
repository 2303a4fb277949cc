//! Environment Configuration Helpers
//!
//! Small readers for `std::env` values with defaults. `.env` loading is the
//! binary's job (`dotenvy`); these helpers only read the process environment.

use std::str::FromStr;

/// Error when an environment value is present but unusable
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnvError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Read a required variable
pub fn env_required(key: &str) -> Result<String, EnvError> {
    std::env::var(key).map_err(|_| EnvError::Missing(key.to_string()))
}

/// Read a variable, falling back to `default` when unset
///
/// A set-but-unparsable value is an error rather than a silent default.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, EnvError> {
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value),
        Err(_) => Ok(default),
    }
}

/// Read an optional variable
pub fn env_opt<T: FromStr>(key: &str) -> Result<Option<T>, EnvError> {
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, EnvError> {
    value.trim().parse().map_err(|_| EnvError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Split a comma-separated list, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("K", " 42 ").unwrap(), 42);
        assert!(matches!(
            parse_value::<u64>("K", "abc"),
            Err(EnvError::Invalid { .. })
        ));
    }

    #[test]
    fn test_env_or_uses_default_when_unset() {
        let value: u32 = env_or("VENUE_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
        assert!(env_required("VENUE_TEST_SURELY_UNSET_VARIABLE").is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("http://a, http://b,,"),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }
}
