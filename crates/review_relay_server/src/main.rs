//! ReviewRelay ingress server binary.
//!
//! # Environment Variables
//!
//! - `RELAY_HOST` / `RELAY_PORT`: bind address (default: 0.0.0.0:3000)
//! - `RELAY_APP_KEY`: app identifier used in the descriptor and exchange
//! - `RELAY_BASE_URL`: externally visible base URL
//! - `RELAY_TOKEN_URL`: upstream token endpoint
//! - `RELAY_SECRETS_DIR`: secret store directory (default: ./secrets)
//! - `RELAY_RATE_LIMIT_PER_MINUTE` / `RELAY_MAX_CONCURRENT_WEBHOOKS`
//! - `RELAY_ALLOWED_REPOS`, `RELAY_IGNORE_PR_AUTHORS`,
//!   `RELAY_IGNORE_PR_TITLE`, `RELAY_IGNORE_PR_SOURCE_BRANCHES`,
//!   `RELAY_IGNORE_PR_TARGET_BRANCHES`: comma-separated filter rules
//! - `RUST_LOG`: log level (default: info)

use std::env;
use std::sync::Arc;

use admission_control::{InFlightTracker, RateLimiter};
use review_relay_server::{
    AppState, IngressServer, LoggingProcessor, ServerConfig,
};
use secret_store::LocalFileSecretStore;
use trust_filter::TrustFilter;
use webhook_auth::{TokenExchanger, WebhookAuthenticator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = ServerConfig::from_env();

    let store = Arc::new(LocalFileSecretStore::open(&config.secrets_dir).await?);
    let trust_filter = Arc::new(TrustFilter::new(config.trust.clone())?);
    let exchanger = TokenExchanger::new(config.token_url.clone(), config.app_key.clone())?;
    let authenticator = Arc::new(WebhookAuthenticator::new(store.clone(), exchanger));

    let state = AppState {
        rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_per_minute)),
        in_flight: Arc::new(InFlightTracker::new(config.max_concurrent_webhooks)),
        trust_filter,
        secrets: store,
        authenticator,
        processor: Arc::new(LoggingProcessor),
        config: Arc::new(config.clone()),
    };

    tracing::info!("Starting ReviewRelay ingress");
    tracing::info!("App key: {}", config.app_key);
    tracing::info!("Secrets directory: {}", config.secrets_dir.display());

    let server = IngressServer::new(config.host.clone(), config.port, state);
    server.serve().await
}
