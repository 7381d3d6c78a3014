//! Shared-secret guard for scheduler-triggered routes.
//!
//! The scheduler sends `Authorization: Bearer <secret>`. The header must
//! equal that string byte for byte: no trimming, case-sensitive scheme.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::server::AppState;

/// Result of checking a request against the configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    /// Header missing or not equal to `Bearer <secret>`.
    Unauthorized,
    /// No secret is configured, so nothing can be authorized.
    Misconfigured,
}

/// Compare a raw `Authorization` header value with the configured secret.
pub fn check_bearer(header: Option<&[u8]>, secret: Option<&str>) -> AuthOutcome {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return AuthOutcome::Misconfigured;
    };
    let expected = format!("Bearer {secret}");
    match header {
        Some(value) if value == expected.as_bytes() => AuthOutcome::Authorized,
        _ => AuthOutcome::Unauthorized,
    }
}

/// Middleware applied to every protected route. Runs before extractors, so
/// a rejected request never has its body read or its handler invoked.
pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    let header = req.headers().get(AUTHORIZATION).map(|v| v.as_bytes());

    match check_bearer(header, state.config.cron_secret()) {
        AuthOutcome::Authorized => next.run(req).await,
        AuthOutcome::Unauthorized => {
            tracing::warn!(
                "🔒 Rejected {} {}: invalid or missing bearer token",
                req.method(),
                req.uri().path()
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"success": false, "error": "Unauthorized"})),
            )
                .into_response()
        }
        AuthOutcome::Misconfigured => {
            tracing::error!("❌ CRON_SECRET is not configured; refusing {}", req.uri().path());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"success": false, "error": "Server misconfigured"})),
            )
                .into_response()
        }
    }
}
