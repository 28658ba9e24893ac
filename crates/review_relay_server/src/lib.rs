//! ReviewRelay webhook ingress server.
//!
//! This crate is the HTTP-facing coordinator. It accepts webhook
//! deliveries from the hosting platform, applies admission control,
//! authenticates the delivery, filters it for eligibility, and hands
//! eligible events to the review-processing collaborator asynchronously,
//! so the caller's retry and timeout behavior is never coupled to our
//! processing latency.
//!
//! # Routes
//!
//! - `GET  /`: tenant descriptor document
//! - `GET  /webhook`: liveness probe
//! - `POST /webhook`: event ingress (always `200` except rate-limit `429`)
//! - `POST /installed`: tenant install callback, persists the secret
//! - `POST /uninstalled`: logged only
//!
//! # Failure containment
//!
//! A single malformed event must never take down the listener: the
//! processing pipeline runs in a spawned task and every per-event failure
//! is caught and logged at that boundary with tenant hash, event kind,
//! and source IP, never the raw secret.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod manifest;
pub mod pipeline;
pub mod processor;
pub mod routes;
pub mod server;

use std::sync::Arc;

use admission_control::{InFlightTracker, RateLimiter};
use secret_store::SecretProvider;
use trust_filter::TrustFilter;
use webhook_auth::WebhookAuthenticator;

pub use config::ServerConfig;
pub use errors::ErrorResponse;
pub use processor::{LoggingProcessor, ProcessorError, ReviewProcessor};
pub use server::IngressServer;

/// Default port the ingress listens on.
pub const DEFAULT_PORT: u16 = 3000;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub rate_limiter: Arc<RateLimiter>,
    pub in_flight: Arc<InFlightTracker>,
    pub trust_filter: Arc<TrustFilter>,
    pub secrets: Arc<dyn SecretProvider>,
    pub authenticator: Arc<WebhookAuthenticator>,
    pub processor: Arc<dyn ReviewProcessor>,
}
