//! Error Kind - Canonical classification of errors
//!
//! Defines the [`ErrorKind`] enum every backend-specific failure is folded into.

use serde::Serialize;

/// 正規化されたエラー種別の列挙体
///
/// ストア固有のエラーやゲートの失敗は、すべてこの小さな集合のいずれかに
/// 分類されます。各バリアントは HTTP ステータスコードと
/// Problem Details の `type` スラッグ・`title` に一対一で対応します。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::NotFound;
/// assert_eq!(kind.status_code(), 404);
/// assert_eq!(kind.as_str(), "not_found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 401 - 資格情報がない、または無効
    Authentication,
    /// 403 - ロール不足、またはストア側の権限拒否
    Authorization,
    /// 400 - 入力値・制約違反
    Validation,
    /// 404 - 対象データが存在しない
    NotFound,
    /// 429 - レート制限超過
    RateLimitExceeded,
    /// 422 - 業務ルール違反
    BusinessRuleViolation,
    /// 500 - ストアのエラー（タイムアウトを含む）
    DatabaseError,
    /// 500 - 想定外の失敗
    Unknown,
}

impl ErrorKind {
    /// すべての種別（テーブルの網羅性検査用）
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Authentication,
        ErrorKind::Authorization,
        ErrorKind::Validation,
        ErrorKind::NotFound,
        ErrorKind::RateLimitExceeded,
        ErrorKind::BusinessRuleViolation,
        ErrorKind::DatabaseError,
        ErrorKind::Unknown,
    ];

    /// HTTP ステータスコードを取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::Validation.status_code(), 400);
    /// assert_eq!(ErrorKind::RateLimitExceeded.status_code(), 429);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Authentication => 401,
            ErrorKind::Authorization => 403,
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::RateLimitExceeded => 429,
            ErrorKind::BusinessRuleViolation => 422,
            ErrorKind::DatabaseError => 500,
            ErrorKind::Unknown => 500,
        }
    }

    /// 機械可読なコード文字列を取得
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::BusinessRuleViolation => "business_rule_violation",
            ErrorKind::DatabaseError => "database_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Problem Details の `title`
    #[inline]
    pub const fn title(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "Authentication Error",
            ErrorKind::Authorization => "Authorization Error",
            ErrorKind::Validation => "Validation Error",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::RateLimitExceeded => "Rate Limit Exceeded",
            ErrorKind::BusinessRuleViolation => "Business Rule Violation",
            ErrorKind::DatabaseError => "Database Error",
            ErrorKind::Unknown => "Unknown Error",
        }
    }

    /// Problem Details の `type` URI 末尾に付くスラッグ
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::Validation.slug(), "validation-error");
    /// ```
    #[inline]
    pub const fn slug(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication-error",
            ErrorKind::Authorization => "authorization-error",
            ErrorKind::Validation => "validation-error",
            ErrorKind::NotFound => "not-found",
            ErrorKind::RateLimitExceeded => "rate-limit-exceeded",
            ErrorKind::BusinessRuleViolation => "business-rule-violation",
            ErrorKind::DatabaseError => "database-error",
            ErrorKind::Unknown => "unknown-error",
        }
    }

    /// サーバー側のエラーかどうかを判定
    ///
    /// 5xx系のエラーは `true` を返します。
    /// これらのエラーはログに記録すべきです。
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// クライアント側のエラーかどうかを判定
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Authentication.status_code(), 401);
        assert_eq!(ErrorKind::Authorization.status_code(), 403);
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::RateLimitExceeded.status_code(), 429);
        assert_eq!(ErrorKind::BusinessRuleViolation.status_code(), 422);
        assert_eq!(ErrorKind::DatabaseError.status_code(), 500);
        assert_eq!(ErrorKind::Unknown.status_code(), 500);
    }

    #[test]
    fn test_slugs_and_codes_are_unique() {
        let slugs: HashSet<_> = ErrorKind::ALL.iter().map(|k| k.slug()).collect();
        let codes: HashSet<_> = ErrorKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(slugs.len(), ErrorKind::ALL.len());
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_serialize_matches_as_str() {
        for kind in ErrorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_is_server_error() {
        assert!(!ErrorKind::Validation.is_server_error());
        assert!(!ErrorKind::NotFound.is_server_error());
        assert!(ErrorKind::DatabaseError.is_server_error());
        assert!(ErrorKind::Unknown.is_server_error());
    }

    #[test]
    fn test_is_client_error() {
        assert!(ErrorKind::Authentication.is_client_error());
        assert!(ErrorKind::RateLimitExceeded.is_client_error());
        assert!(!ErrorKind::DatabaseError.is_client_error());
    }
}
