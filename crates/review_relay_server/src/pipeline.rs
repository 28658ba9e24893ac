//! The background processing pipeline for one webhook delivery.
//!
//! Runs after the HTTP response has already been sent. The order is
//! fixed: decode, then authenticate, then apply the trust filter, then
//! hand off. Admission control happens earlier, at the HTTP boundary,
//! so throttled callers never cost an authentication.

use axum::body::Bytes;
use thiserror::Error;
use tracing::{debug, error, info};

use trust_filter::{DropReason, EventDecodeError, FilterDecision, WebhookEvent};
use webhook_auth::{hash_tenant, AuthError};

use crate::processor::ProcessorError;
use crate::AppState;

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

/// How a delivery ended up, for logging.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The event was authenticated, eligible, and handed to the
    /// processor.
    Processed { event_kind: String },
    /// The event was dropped as ineligible; a normal outcome.
    Dropped(DropReason),
}

/// A per-delivery failure. Terminal: logged and dropped, never retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("webhook payload could not be decoded: {0}")]
    Decode(#[from] EventDecodeError),

    #[error("delivery carried no signed assertion")]
    MissingAssertion,

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("event has no target resource URL")]
    MissingTargetUrl,

    #[error(transparent)]
    Processing(#[from] ProcessorError),
}

/// Run the full pipeline for one delivery.
///
/// # Errors
///
/// Returns a [`PipelineError`] naming the failed stage; the caller logs
/// it with the delivery context and moves on.
pub async fn run(
    state: &AppState,
    body: &Bytes,
    assertion: Option<&str>,
) -> Result<PipelineOutcome, PipelineError> {
    let event = WebhookEvent::decode(body)?;

    // Unsupported kinds are dropped before spending any authentication
    // cost; the platform sends kinds we never subscribe to.
    if matches!(event, WebhookEvent::Unsupported { .. }) {
        debug!(event = event.kind(), "unsupported event kind");
        return Ok(PipelineOutcome::Dropped(DropReason::UnsupportedKind));
    }

    let assertion = assertion.ok_or(PipelineError::MissingAssertion)?;
    let tenant = state.authenticator.authenticate(assertion).await?;

    if let FilterDecision::Drop(reason) = state.trust_filter.evaluate(&event) {
        return Ok(PipelineOutcome::Dropped(reason));
    }

    let api_url = event
        .pull_request()
        .and_then(|pr| pr.html_url())
        .ok_or(PipelineError::MissingTargetUrl)?
        .to_string();

    state
        .processor
        .process(&tenant.bearer_token, &event, &api_url)
        .await?;

    info!(
        tenant = %hash_tenant(&tenant.client_key),
        event = event.kind(),
        api_url,
        "event handed to review processor"
    );

    Ok(PipelineOutcome::Processed {
        event_kind: event.kind().to_string(),
    })
}

/// Run the pipeline inside a spawned task, logging the outcome.
///
/// This is the failure containment boundary: nothing escapes to crash
/// the listener, and the log line carries enough context (tenant hash is
/// on the inner error where known, event context and source IP here) to
/// diagnose without ever logging a secret.
pub async fn run_logged(state: AppState, body: Bytes, assertion: Option<String>, client_ip: String) {
    match run(&state, &body, assertion.as_deref()).await {
        Ok(PipelineOutcome::Processed { event_kind }) => {
            debug!(client_ip, event = event_kind, "delivery processed");
        }
        Ok(PipelineOutcome::Dropped(reason)) => {
            info!(client_ip, %reason, "delivery dropped");
        }
        Err(err) => {
            error!(client_ip, error = %err, "failed to handle webhook");
        }
    }
}
