//! HTTP error responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use n2n_netstate::{AggregateError, DiagnosticError, LogSourceError};
use std::time::Duration;

#[derive(Debug)]
pub enum ApiError {
    /// Inventory could not be read
    Unavailable(String),
    /// Wrong credentials
    Unauthorized,
    /// Client or account locked
    Locked { remaining: Duration },
    /// Feature switched off on this host
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl From<AggregateError> for ApiError {
    fn from(e: AggregateError) -> Self {
        ApiError::Unavailable(e.to_string())
    }
}

impl From<DiagnosticError> for ApiError {
    fn from(e: DiagnosticError) -> Self {
        match e {
            DiagnosticError::Disabled => ApiError::Forbidden(e.to_string()),
            e if e.is_rejection() => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LogSourceError> for ApiError {
    fn from(e: LogSourceError) -> Self {
        ApiError::Internal(format!("failed to read logs: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "invalid username or password" })),
            )
                .into_response(),
            ApiError::Locked { remaining } => {
                // round up so clients never retry early
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({
                        "error": "too many failed attempts",
                        "retry_after_secs": secs,
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            ApiError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
