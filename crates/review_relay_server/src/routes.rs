//! HTTP routing configuration.
//!
//! Route structure:
//!
//! - GET  /            - tenant descriptor document
//! - GET  /webhook     - liveness probe
//! - POST /webhook     - event ingress
//! - POST /installed   - tenant install callback
//! - POST /uninstalled - tenant uninstall callback (logged only)

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{handlers, AppState};

/// Create the complete ingress router.
///
/// Request tracing and a timeout wrap every route; the webhook endpoint
/// answers well inside the timeout because processing runs in a spawned
/// task.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new())
        .on_response(DefaultOnResponse::new());

    let timeout_layer = TimeoutLayer::new(Duration::from_secs(30));

    Router::new()
        .route("/", get(handlers::get_descriptor))
        .route(
            "/webhook",
            get(handlers::webhook_liveness).post(handlers::post_webhook),
        )
        .route("/installed", post(handlers::post_installed))
        .route("/uninstalled", post(handlers::post_uninstalled))
        .layer(timeout_layer)
        .layer(trace_layer)
        .with_state(state)
}
