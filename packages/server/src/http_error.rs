//! HTTP error handling
//!
//! Every failed request answers with `{message, code, details?}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use spectree_core::{ServiceError, ValidationError};

pub const NOT_FOUND: &str = "NOT_FOUND";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            NOT_FOUND => StatusCode::NOT_FOUND,
            VALIDATION_ERROR | INVALID_INPUT => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }
        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => HttpError::new(err.to_string(), NOT_FOUND),
            ServiceError::Validation(e) => HttpError::new(e.to_string(), VALIDATION_ERROR),
            ServiceError::Database(e) => {
                HttpError::with_details("Database operation failed", DATABASE_ERROR, e.to_string())
            }
        }
    }
}

/// Path segments and body fields that do not parse into a known enum value
impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::new(err.to_string(), VALIDATION_ERROR)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details("Invalid request body", INVALID_INPUT, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_status_mapping() {
        let not_found: HttpError = ServiceError::not_found("dev spec", 7).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "dev spec not found: 7");

        let invalid: HttpError = ServiceError::invalid_operation("nope").into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code, VALIDATION_ERROR);

        let other = HttpError::new("boom", "SOMETHING_ELSE");
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_details_skipped_when_absent() {
        let json = serde_json::to_value(HttpError::new("gone", NOT_FOUND)).unwrap();
        assert_eq!(json, serde_json::json!({"message": "gone", "code": "NOT_FOUND"}));
    }
}
