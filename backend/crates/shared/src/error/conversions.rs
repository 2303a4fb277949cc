//! Error conversions
//!
//! Turns request-body decoding failures into [`AppError`].
//! Store failures are not converted here: they stay raw as
//! [`StoreError`](super::store::StoreError) until the gateway translates them.

use super::app_error::{AppError, FieldError};

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof => {
                AppError::validation("Request body is not valid JSON")
                    .with_field_error(FieldError::new(
                        "body",
                        "invalid_json",
                        format!("line {}, column {}", err.line(), err.column()),
                    ))
                    .with_source(err)
            }
            // Well-formed JSON of the wrong shape (missing field, wrong type)
            Category::Data => AppError::validation("Request body has an unexpected shape")
                .with_field_error(FieldError::new("body", "invalid_shape", err.to_string()))
                .with_source(err),
            Category::Io => AppError::unknown("JSON I/O error").with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct NamedBody {
        name: String,
    }

    #[test]
    fn test_malformed_json_is_validation() {
        let err: AppError = serde_json::from_str::<NamedBody>("{\"name\":").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors()[0].field, "body");
        assert_eq!(err.field_errors()[0].code, "invalid_json");
    }

    #[test]
    fn test_wrong_shape_is_validation() {
        let err: AppError = serde_json::from_str::<NamedBody>("{\"name\":7}").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors()[0].code, "invalid_shape");
    }
}
