//! Tests for error responses

use super::*;
use axum::response::IntoResponse;

#[test]
fn rate_limited_maps_to_429() {
    let response = ApiError::rate_limited().into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn install_failed_maps_to_500() {
    let response = ApiError::install_failed().into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn error_body_serializes_with_code_and_message() {
    let body = ErrorResponse::rate_limited();
    let json = serde_json::to_value(&body).unwrap();

    assert_eq!(json["error"]["code"], "AdmissionRejected");
    assert_eq!(json["error"]["message"], "Rate limit exceeded");
}

#[test]
fn install_failure_body_is_generic() {
    let body = ErrorResponse::install_failed();
    let json = serde_json::to_string(&body).unwrap();

    // No paths or internals in the outward-facing message.
    assert!(!json.contains('/'));
}
