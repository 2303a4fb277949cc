//! Store Error - Raw backing-store failure
//!
//! [`StoreError`] carries a store failure without interpreting it. Only the
//! gateway's error translation decides which canonical kind it becomes.

use std::error::Error;
use std::fmt;

/// SQLSTATE `no_data_found`, used for "expected one row, got none"
pub const NO_DATA_FOUND: &str = "P0002";

/// SQLSTATE `connection_failure`
pub const CONNECTION_FAILURE: &str = "08006";

/// 未解釈のストアエラー
///
/// ## Fields
/// * `code` - ストア固有のエラーコード（PostgreSQL なら SQLSTATE）
/// * `message` - ストアが返したメッセージ（ログ専用、レスポンスには出さない）
/// * `constraint` - 違反した制約名（分かる場合）
pub struct StoreError {
    code: Option<String>,
    message: String,
    constraint: Option<String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            constraint: None,
            source: None,
        }
    }

    /// コード付きで作成
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::store::StoreError;
    /// let err = StoreError::with_code("23505", "duplicate key value");
    /// assert_eq!(err.code(), Some("23505"));
    /// ```
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::new(message)
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("StoreError");
        builder.field("code", &self.code);
        builder.field("message", &self.message);
        if let Some(constraint) = &self.constraint {
            builder.field("constraint", constraint);
        }
        builder.finish()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "store error {}: {}", code, self.message),
            None => write!(f, "store error: {}", self.message),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                StoreError::with_code(NO_DATA_FOUND, "no rows returned").with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let mut store_err = match db_err.code() {
                    Some(code) => StoreError::with_code(code.into_owned(), db_err.message()),
                    None => StoreError::new(db_err.message()),
                };
                if let Some(constraint) = db_err.constraint() {
                    store_err = store_err.with_constraint(constraint);
                }
                store_err.with_source(err)
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::with_code(CONNECTION_FAILURE, "database connection error")
                    .with_source(err)
            }
            _ => StoreError::new(err.to_string()).with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_code() {
        assert_eq!(
            StoreError::with_code("23505", "duplicate").to_string(),
            "store error 23505: duplicate"
        );
        assert_eq!(StoreError::new("boom").to_string(), "store error: boom");
    }

    #[test]
    fn test_constraint() {
        let err = StoreError::with_code("23503", "fk").with_constraint("orders_customer_id_fkey");
        assert_eq!(err.constraint(), Some("orders_customer_id_fkey"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_row_not_found_conversion() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), Some(NO_DATA_FOUND));
    }
}
