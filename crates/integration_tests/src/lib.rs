//! Shared harness for end-to-end ingress tests.
//!
//! Builds a full router over a real on-disk secret store, with a token
//! endpoint URL supplied by the test and a processor that records every
//! handoff.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use tempfile::TempDir;

use admission_control::{InFlightTracker, RateLimiter};
use review_relay_server::routes::create_router;
use review_relay_server::{AppState, ProcessorError, ReviewProcessor, ServerConfig};
use secret_store::LocalFileSecretStore;
use trust_filter::{TrustFilter, TrustFilterConfig, WebhookEvent};
use webhook_auth::{TokenExchanger, WebhookAuthenticator};

/// One recorded processor handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub bearer_token: String,
    pub event_kind: String,
    pub api_url: String,
}

/// Processor that records handoffs for later assertions.
#[derive(Default)]
pub struct RecordingProcessor {
    handoffs: Mutex<Vec<Handoff>>,
}

impl RecordingProcessor {
    pub fn handoffs(&self) -> Vec<Handoff> {
        self.handoffs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewProcessor for RecordingProcessor {
    async fn process(
        &self,
        bearer_token: &str,
        event: &WebhookEvent,
        api_url: &str,
    ) -> Result<(), ProcessorError> {
        self.handoffs.lock().unwrap().push(Handoff {
            bearer_token: bearer_token.to_string(),
            event_kind: event.kind().to_string(),
            api_url: api_url.to_string(),
        });
        Ok(())
    }
}

/// A complete ingress instance wired for tests.
pub struct TestHarness {
    pub app: Router,
    pub state: AppState,
    pub processor: Arc<RecordingProcessor>,
    // Held so the secret store directory outlives the harness.
    _secrets_dir: TempDir,
}

/// Knobs a test can turn before building the harness.
pub struct HarnessOptions {
    pub rate_limit_per_minute: usize,
    pub trust: TrustFilterConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 60,
            trust: TrustFilterConfig::default(),
        }
    }
}

impl TestHarness {
    pub async fn new(token_url: &str) -> Self {
        Self::with_options(token_url, HarnessOptions::default()).await
    }

    pub async fn with_options(token_url: &str, options: HarnessOptions) -> Self {
        let secrets_dir = TempDir::new().unwrap();
        let store = Arc::new(
            LocalFileSecretStore::open(secrets_dir.path())
                .await
                .unwrap(),
        );
        let exchanger = TokenExchanger::new(token_url, "review-relay-app").unwrap();
        let processor = Arc::new(RecordingProcessor::default());

        let state = AppState {
            config: Arc::new(ServerConfig::default()),
            rate_limiter: Arc::new(RateLimiter::new(options.rate_limit_per_minute)),
            in_flight: Arc::new(InFlightTracker::default()),
            trust_filter: Arc::new(TrustFilter::new(options.trust).unwrap()),
            secrets: store.clone(),
            authenticator: Arc::new(WebhookAuthenticator::new(store, exchanger)),
            processor: processor.clone(),
        };

        Self {
            app: create_router(state.clone()),
            state,
            processor,
            _secrets_dir: secrets_dir,
        }
    }

    /// Wait until the spawned pipeline for every accepted delivery has
    /// recorded its handoff, or the deadline passes.
    pub async fn wait_for_handoffs(&self, expected: usize) -> Vec<Handoff> {
        for _ in 0..100 {
            let handoffs = self.processor.handoffs();
            if handoffs.len() >= expected {
                return handoffs;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.processor.handoffs()
    }
}

#[derive(Serialize)]
struct AssertionClaims {
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Mint a signed assertion the way the hosting platform does for a
/// webhook delivery.
pub fn mint_assertion(shared_secret: &str, client_key: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    encode(
        &Header::default(),
        &AssertionClaims {
            iss: client_key.to_string(),
            aud: client_key.to_string(),
            iat: now,
            exp: now + 240,
        },
        &EncodingKey::from_secret(shared_secret.as_bytes()),
    )
    .unwrap()
}

/// A well-formed pull request creation event.
pub fn pull_request_created(author: &str, title: &str, repo_url: &str) -> serde_json::Value {
    serde_json::json!({
        "event": "pullrequest:created",
        "data": {
            "actor": {"type": "user", "username": author},
            "pullrequest": {
                "title": title,
                "source": {"branch": {"name": "feature/review"}},
                "destination": {"branch": {"name": "main"}},
                "links": {"html": {"href": repo_url}}
            }
        }
    })
}
