//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`] struct, [`FieldError`] and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use serde::Serialize;

use super::kind::ErrorKind;

/// フィールド単位のエラー
///
/// エンベロープの `error.errors` 配列の一要素としてシリアライズされます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            value: None,
        }
    }

    /// 問題となった値を添付
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// アプリケーション統一エラー型
///
/// 正規化済みのエラーを表します。ストア固有のエラーは
/// ゲートウェイのエラー変換でこの型（の記述子）に畳み込まれます。
///
/// ## Fields
/// * `kind` - 正規化されたエラー種別（HTTP ステータスコードにマッピング）
/// * `message` - ユーザー向けのエラーメッセージ（`detail`）
/// * `field_errors` - フィールド単位のエラー
/// * `source` - 元のエラー（オプション、デバッグ用。レスポンスには出さない）
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::{AppError, FieldError}, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::NotFound, "Customer not found");
///
/// let err = AppError::validation("Invalid customer")
///     .with_field_error(FieldError::new("email", "invalid_email", "Email is malformed"));
/// assert_eq!(err.field_errors().len(), 1);
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    field_errors: Vec<FieldError>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// アプリケーション結果型エイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 種別ごとの短縮コンストラクタを生成
macro_rules! kind_constructors {
    ($($(#[$doc:meta])* $name:ident => $kind:ident,)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(message: impl Into<Cow<'static, str>>) -> Self {
                Self::new(ErrorKind::$kind, message)
            }
        )*
    };
}

impl AppError {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// 新しいエラーを作成
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: Vec::new(),
            source: None,
        }
    }

    kind_constructors! {
        /// 401
        authentication => Authentication,
        /// 403
        authorization => Authorization,
        /// 400
        validation => Validation,
        /// 404
        not_found => NotFound,
        /// 429
        rate_limited => RateLimitExceeded,
        /// 422
        business_rule => BusinessRuleViolation,
        /// 500
        database => DatabaseError,
        /// 500
        unknown => Unknown,
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// フィールドエラーを追加
    #[inline]
    pub fn with_field_error(mut self, field_error: FieldError) -> Self {
        self.field_errors.push(field_error);
        self
    }

    /// 元のエラーを設定（デバッグ用）
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::app_error::{AppError, AppResult};
    ///
    /// fn read_config() -> AppResult<()> {
    ///     std::fs::read_to_string("config.json")
    ///         .map_err(|e| AppError::unknown("Failed to read config").with_source(e))?;
    ///     Ok(())
    /// }
    /// ```
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// エラー種別を取得
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP ステータスコードを取得
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// メッセージを取得
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// フィールドエラーを取得
    #[inline]
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if !self.field_errors.is_empty() {
            builder.field("field_errors", &self.field_errors);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if !self.field_errors.is_empty() {
            write!(f, " ({} field errors)", self.field_errors.len())?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

// ============================================================================
// Result extension traits
// ============================================================================

/// `Result<T, E>` を `AppResult<T>` に変換するための拡張トレイト
pub trait ResultExt<T, E> {
    /// エラーを `AppError` に変換し、指定した種別とメッセージでラップ
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static,
    {
        self.map_err(|e| AppError::new(kind, message).with_source(e))
    }
}

/// `Option<T>` を `AppResult<T>` に変換するための拡張トレイト
pub trait OptionExt<T> {
    /// `None` の場合に `AppError` を返す
    fn ok_or_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>;

    /// `None` の場合に 404 Not Found を返す
    fn ok_or_not_found(self, message: impl Into<Cow<'static, str>>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_else(|| AppError::new(kind, message))
    }

    fn ok_or_not_found(self, message: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_app_err(ErrorKind::NotFound, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::NotFound, "Customer not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Customer not found");
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(AppError::authentication("test").status_code(), 401);
        assert_eq!(AppError::authorization("test").status_code(), 403);
        assert_eq!(AppError::validation("test").status_code(), 400);
        assert_eq!(AppError::not_found("test").status_code(), 404);
        assert_eq!(AppError::rate_limited("test").status_code(), 429);
        assert_eq!(AppError::business_rule("test").status_code(), 422);
        assert_eq!(AppError::database("test").status_code(), 500);
        assert_eq!(AppError::unknown("test").status_code(), 500);
    }

    #[test]
    fn test_with_field_error() {
        let err = AppError::validation("Invalid customer")
            .with_field_error(FieldError::new("email", "invalid_email", "Email is malformed"))
            .with_field_error(
                FieldError::new("phone", "too_short", "Phone is too short").with_value("12"),
            );
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(err.field_errors()[1].value.as_deref(), Some("12"));
    }

    #[test]
    fn test_field_error_serialization_skips_missing_value() {
        let error = FieldError::new("email", "invalid_email", "bad");
        let json = serde_json::to_string(&error).unwrap();
        assert!(!json.contains("value"));
    }

    #[test]
    fn test_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = AppError::unknown("Failed to read file").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display() {
        let err = AppError::not_found("Customer not found");
        assert_eq!(err.to_string(), "[not_found] Customer not found");
    }

    #[test]
    fn test_result_ext() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not found",
        ));
        let app_result = result.map_app_err(ErrorKind::NotFound, "Resource not found");
        assert_eq!(app_result.unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        assert_eq!(none.ok_or_not_found("Item not found").unwrap_err().status_code(), 404);

        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_not_found("Item not found").unwrap(), 42);
    }
}
