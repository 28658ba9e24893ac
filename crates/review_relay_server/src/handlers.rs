//! HTTP request handlers.
//!
//! Handlers stay thin: they extract request data, run admission control,
//! and schedule the processing pipeline. The webhook endpoint always
//! acknowledges immediately; the caller's retry behavior must never be
//! coupled to downstream processing latency.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, info};

use secret_store::SecretStoreError;
use trust_filter::{InstalledPayload, UninstalledPayload};
use webhook_auth::{hash_tenant, TenantSecretsDocument};

use crate::errors::ApiError;
use crate::{manifest, pipeline, AppState};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// GET /
///
/// Tenant descriptor document, templated with this instance's identity.
pub async fn get_descriptor(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(manifest::descriptor(&state.config))
}

/// GET /webhook
///
/// Liveness probe.
pub async fn webhook_liveness() -> &'static str {
    "Webhook server online!"
}

/// POST /webhook
///
/// Event ingress. Admission control runs inline; everything else runs in
/// a spawned task after the `200 OK` has been sent. Only an admission
/// rejection changes the response.
pub async fn post_webhook(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client_ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    if !state.rate_limiter.check_rate(&client_ip) {
        return ApiError::rate_limited().into_response();
    }

    // Advisory only: logs a warning at the ceiling but never rejects.
    state.in_flight.check_concurrency();

    let assertion = signed_assertion(&headers);
    let guard = state.in_flight.start();
    let task_state = state.clone();

    tokio::spawn(async move {
        let _guard = guard;
        pipeline::run_logged(task_state, body, assertion, client_ip).await;
    });

    (StatusCode::OK, "OK").into_response()
}

/// POST /installed
///
/// Tenant install callback: persists the shared secret. This is the one
/// place a persistence failure must surface, so the operator sees a
/// broken install immediately.
pub async fn post_installed(State(state): State<AppState>, body: Bytes) -> Response {
    match handle_installed(&state, &body).await {
        Ok(tenant_hash) => {
            info!(tenant = %tenant_hash, "tenant installed");
            (StatusCode::OK, "OK").into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to register tenant");
            ApiError::install_failed().into_response()
        }
    }
}

/// POST /uninstalled
///
/// Logged only. The stored secret is deliberately retained; reinstalls
/// overwrite it.
pub async fn post_uninstalled(body: Bytes) -> StatusCode {
    match serde_json::from_slice::<UninstalledPayload>(&body) {
        Ok(payload) => {
            let tenant = payload
                .client_key
                .as_deref()
                .map(hash_tenant)
                .unwrap_or_else(|| "unknown".to_string());
            info!(%tenant, "tenant uninstalled");
        }
        Err(_) => info!("tenant uninstalled (unparseable payload)"),
    }
    StatusCode::OK
}

#[derive(Debug, Error)]
enum InstallError {
    #[error("install payload invalid: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

async fn handle_installed(state: &AppState, body: &[u8]) -> Result<String, InstallError> {
    let payload: InstalledPayload = serde_json::from_slice(body)?;

    let document = TenantSecretsDocument {
        shared_secret: payload.shared_secret.clone(),
        client_key: payload.client_key.clone(),
    };

    state
        .secrets
        .store_secret(&payload.client_key, &document.encode()?, None)
        .await?;

    Ok(hash_tenant(&payload.client_key))
}

/// Resolve the rate-limit source id: first `X-Forwarded-For` hop, then
/// the connection's peer address, then a sentinel.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Pull the signed assertion out of the `Authorization` header
/// (`JWT <token>` scheme).
fn signed_assertion(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.split_whitespace().nth(1).map(str::to_string)
}
