//! HTTP error responses.
//!
//! The ingress deliberately reports very little to callers: webhook
//! dispositions are internal, so most failures still answer `200 OK`.
//! The JSON error shape below is used for the two cases that are
//! surfaced: admission rejection (`429`) and install persistence
//! failure (`500`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Standard error body for surfaced API errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code.
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Admission-control rejection body.
    pub fn rate_limited() -> Self {
        Self::new("AdmissionRejected", "Rate limit exceeded")
    }

    /// Install persistence failure body. Never includes the underlying
    /// error detail, which could name filesystem paths.
    pub fn install_failed() -> Self {
        Self::new("PersistenceFailure", "Unable to register tenant")
    }
}

/// Wrapper tying an [`ErrorResponse`] to its HTTP status.
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn rate_limited() -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: ErrorResponse::rate_limited(),
        }
    }

    pub fn install_failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::install_failed(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
