//! Mapping from domain errors to HTTP responses.
//!
//! Every failure body is `{ "success": false, "error": "<short reason>" }`.
//! Internal detail goes to the log, not to the client.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recetario_core::error::RecetarioError;

/// An error response with a status and a client-safe message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }
}

impl From<RecetarioError> for ApiError {
    fn from(e: RecetarioError) -> Self {
        match e {
            RecetarioError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            RecetarioError::NotFound(msg) => {
                Self::new(StatusCode::NOT_FOUND, format!("{msg} not found"))
            }
            RecetarioError::Config(msg) => {
                tracing::error!("❌ Configuration error: {msg}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            RecetarioError::Email(detail) => {
                tracing::error!("❌ Email send failed: {detail}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send reminder")
            }
            RecetarioError::Storage(detail) => {
                tracing::error!("❌ Storage failure: {detail}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable")
            }
            other => {
                tracing::error!("❌ Internal error: {other}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, "Invalid query parameters")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameter: {rejection}");
        Self::new(StatusCode::BAD_REQUEST, "Invalid path parameter")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"success": false, "error": self.message})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RecetarioError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (RecetarioError::NotFound("Recipe 'a'".into()), StatusCode::NOT_FOUND),
            (RecetarioError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RecetarioError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RecetarioError::Email("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = ApiError::from(RecetarioError::Storage("disk I/O error at /var/db".into()));
        assert_eq!(err.message, "Storage unavailable");

        let err = ApiError::from(RecetarioError::Email("401 invalid api key re_abc".into()));
        assert_eq!(err.message, "Failed to send reminder");
    }

    #[test]
    fn test_config_message_is_short_reason() {
        let err = ApiError::from(RecetarioError::Config("Email service not configured".into()));
        assert_eq!(err.message, "Email service not configured");
    }
}
