//! Error Translator
//!
//! Single folding point from every pipeline failure into the canonical
//! taxonomy. Store error codes are dispatched through [`STORE_ERROR_TABLE`];
//! raw store messages never reach `detail`.

use chrono::{DateTime, Utc};
use kernel::error::{
    app_error::FieldError,
    kind::ErrorKind,
    store::{NO_DATA_FOUND, StoreError},
};
use serde::Serialize;

use crate::domain::entity::request_context::RequestContext;
use crate::error::GatewayError;

/// Field error attached by a store rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub code: &'static str,
    pub message: &'static str,
}

/// One row of the store error table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreErrorRule {
    pub code: &'static str,
    pub kind: ErrorKind,
    pub detail: &'static str,
    pub field: Option<FieldRule>,
}

/// Store error code → canonical kind
pub static STORE_ERROR_TABLE: &[StoreErrorRule] = &[
    StoreErrorRule {
        code: "23505",
        kind: ErrorKind::Validation,
        detail: "A record with the same unique value already exists",
        field: Some(FieldRule {
            field: "unique_constraint",
            code: "DUPLICATE_ENTRY",
            message: "Value must be unique",
        }),
    },
    StoreErrorRule {
        code: "23503",
        kind: ErrorKind::Validation,
        detail: "The referenced record does not exist",
        field: Some(FieldRule {
            field: "foreign_key",
            code: "INVALID_REFERENCE",
            message: "Referenced record does not exist",
        }),
    },
    StoreErrorRule {
        code: "23502",
        kind: ErrorKind::Validation,
        detail: "A required field is missing",
        field: Some(FieldRule {
            field: "not_null",
            code: "REQUIRED_FIELD",
            message: "Field is required",
        }),
    },
    StoreErrorRule {
        code: "23514",
        kind: ErrorKind::Validation,
        detail: "A value violates a check constraint",
        field: Some(FieldRule {
            field: "check_constraint",
            code: "CHECK_VIOLATION",
            message: "Value is out of the allowed range",
        }),
    },
    StoreErrorRule {
        code: "42501",
        kind: ErrorKind::Authorization,
        detail: "Insufficient privileges for this operation",
        field: None,
    },
    StoreErrorRule {
        code: "PGRST116",
        kind: ErrorKind::NotFound,
        detail: "Resource not found",
        field: None,
    },
    StoreErrorRule {
        code: NO_DATA_FOUND,
        kind: ErrorKind::NotFound,
        detail: "Resource not found",
        field: None,
    },
];

/// Look up the rule for a store error code
pub fn lookup_store_rule(code: Option<&str>) -> Option<&'static StoreErrorRule> {
    let code = code?;
    STORE_ERROR_TABLE.iter().find(|rule| rule.code == code)
}

/// Canonical, user-visible error (Problem Details shape)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "errors", skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(skip)]
    pub retry_after_ms: Option<i64>,
}

/// Error translator
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    problem_type_base: String,
}

impl ErrorTranslator {
    pub fn new(problem_type_base: impl Into<String>) -> Self {
        Self {
            problem_type_base: problem_type_base.into(),
        }
    }

    /// Stable `type` URI of a kind
    pub fn type_uri(&self, kind: ErrorKind) -> String {
        format!("{}/{}", self.problem_type_base.trim_end_matches('/'), kind.slug())
    }

    pub fn translate(&self, failure: &GatewayError, context: &RequestContext) -> ErrorDescriptor {
        let (detail, field_errors) = describe(failure);
        let kind = failure.kind();
        let retry_after_ms = match failure {
            GatewayError::RateLimited { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        };

        ErrorDescriptor {
            type_uri: self.type_uri(kind),
            title: kind.title(),
            status: kind.status_code(),
            detail,
            instance: context.path().to_string(),
            timestamp: context.timestamp(),
            field_errors,
            kind,
            retry_after_ms,
        }
    }
}

fn describe(failure: &GatewayError) -> (String, Vec<FieldError>) {
    match failure {
        GatewayError::MissingCredential => ("Authentication credential is missing".into(), vec![]),
        GatewayError::InvalidCredential => ("Authentication credential is invalid".into(), vec![]),
        GatewayError::SessionNotFound | GatewayError::SessionExpired => {
            ("Session is invalid or has expired".into(), vec![])
        }
        GatewayError::SessionLookup(_) => ("Unable to verify credential".into(), vec![]),
        GatewayError::Forbidden { required, .. } => (
            format!("This operation requires the {required} role"),
            vec![],
        ),
        GatewayError::RateLimited { retry_after_ms, .. } => (
            format!(
                "Too many requests, retry after {} seconds",
                retry_after_secs(*retry_after_ms)
            ),
            vec![],
        ),
        GatewayError::NotFound => ("Resource not found".into(), vec![]),
        GatewayError::Store(err) => describe_store_error(err),
        GatewayError::Rejected(err) => (err.message().to_string(), err.field_errors().to_vec()),
        GatewayError::Timeout(after) => (
            format!("Operation timed out after {}ms", after.as_millis()),
            vec![],
        ),
        GatewayError::Panicked(_) | GatewayError::Internal(_) => {
            ("An unexpected error occurred".into(), vec![])
        }
    }
}

fn describe_store_error(err: &StoreError) -> (String, Vec<FieldError>) {
    match lookup_store_rule(err.code()) {
        Some(rule) => {
            let field_errors = rule
                .field
                .map(|f| vec![FieldError::new(f.field, f.code, f.message)])
                .unwrap_or_default();
            (rule.detail.to_string(), field_errors)
        }
        None => ("A database error occurred".into(), vec![]),
    }
}

/// Whole seconds for `Retry-After`, rounded up and never zero
pub fn retry_after_secs(retry_after_ms: i64) -> i64 {
    ((retry_after_ms + 999) / 1000).max(1)
}
