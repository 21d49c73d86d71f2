//! Error types for foodgram.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Field-level validation messages, keyed by request field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication credentials were not provided")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Domain state error, rendered as `{"error": message}`.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Field-level validation failure, rendered as `{"field": ["message"]}`.
    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error for a single field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![message.into()]);
        Self::Validation(fields)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Client facing message. Server errors never leak their details.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Unauthorized | Self::Validation(_) => self.to_string(),
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = match self {
            Self::Validation(fields) => Json(json!(fields)),
            other => Json(json!({ "error": other.public_message() })),
        };

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_validation_errors(&mut fields, None, &err);
        Self::Validation(fields)
    }
}

fn collect_validation_errors(fields: &mut FieldErrors, prefix: Option<&str>, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = prefix.map_or_else(|| field.to_string(), |p| format!("{p}.{field}"));
        match kind {
            ValidationErrorsKind::Field(list) => {
                let entry = fields.entry(key).or_default();
                for e in list {
                    entry.push(
                        e.message
                            .as_ref()
                            .map_or_else(|| format!("Invalid value ({})", e.code), ToString::to_string),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_validation_errors(fields, Some(&key), inner);
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_validation_errors(fields, Some(&format!("{key}[{idx}]")), inner);
                }
            }
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::field("tags", "x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_server_details() {
        let err = AppError::Database("connection refused on 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::BadRequest("This recipe is already your favorite one".into());
        assert_eq!(err.public_message(), "This recipe is already your favorite one");
    }

    #[test]
    fn test_validation_errors_keep_field_messages() {
        let mut errs = ValidationErrors::new();
        errs.add(
            "tags",
            ValidationError::new("length").with_message("You have to add at least one tag.".into()),
        );

        let AppError::Validation(fields) = AppError::from(errs) else {
            panic!("expected validation error");
        };
        assert_eq!(fields["tags"], vec!["You have to add at least one tag.".to_string()]);
    }
}
