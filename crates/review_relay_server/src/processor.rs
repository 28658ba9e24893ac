//! The review-processing collaborator seam.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use trust_filter::WebhookEvent;

/// Failure reported by the processing collaborator.
///
/// The delivery has already been acknowledged by the time processing
/// runs, so the error is logged and dropped rather than retried.
#[derive(Debug, Error)]
#[error("review processing failed: {0}")]
pub struct ProcessorError(pub String);

/// Entry point of the external review-processing collaborator.
///
/// The ingress hands over a fully authenticated, eligible event together
/// with the short-lived upstream token and the target resource URL, and
/// expects nothing back beyond success or failure for logging.
#[async_trait]
pub trait ReviewProcessor: Send + Sync {
    async fn process(
        &self,
        bearer_token: &str,
        event: &WebhookEvent,
        api_url: &str,
    ) -> Result<(), ProcessorError>;
}

/// Default processor that only logs, letting the server run standalone.
pub struct LoggingProcessor;

#[async_trait]
impl ReviewProcessor for LoggingProcessor {
    async fn process(
        &self,
        _bearer_token: &str,
        event: &WebhookEvent,
        api_url: &str,
    ) -> Result<(), ProcessorError> {
        info!(event = event.kind(), api_url, "event ready for review processing");
        Ok(())
    }
}
