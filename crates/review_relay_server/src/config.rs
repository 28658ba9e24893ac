//! Server configuration.
//!
//! All configuration is read-only input to the subsystem. The binary
//! loads it from environment variables; everything has a sane default so
//! the server runs locally with no configuration at all.

use std::env;
use std::path::PathBuf;

use trust_filter::TrustFilterConfig;

use crate::DEFAULT_PORT;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default upstream token endpoint.
const DEFAULT_TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";

/// Complete ingress configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// This app's identifier, used in the descriptor and as the exchange
    /// assertion issuer.
    pub app_key: String,

    /// Externally visible base URL, templated into the descriptor.
    pub base_url: String,

    /// Upstream token endpoint for assertion exchange.
    pub token_url: String,

    /// Directory holding the master key and tenant secret records.
    pub secrets_dir: PathBuf,

    /// Per-source admissions per minute.
    pub rate_limit_per_minute: usize,

    /// Advisory ceiling for concurrently running pipelines.
    pub max_concurrent_webhooks: usize,

    /// Allow-list and ignore rules for the trust filter.
    pub trust: TrustFilterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            app_key: "review-relay".to_string(),
            base_url: format!("http://localhost:{DEFAULT_PORT}"),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            secrets_dir: PathBuf::from("./secrets"),
            rate_limit_per_minute: admission_control::DEFAULT_RATE_LIMIT_PER_MINUTE,
            max_concurrent_webhooks: admission_control::DEFAULT_MAX_CONCURRENT,
            trust: TrustFilterConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `RELAY_*` environment variables, falling
    /// back to defaults for anything unset. List-valued variables are
    /// comma-separated.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env_or("RELAY_HOST", defaults.host),
            port: parse_or("RELAY_PORT", defaults.port),
            app_key: env_or("RELAY_APP_KEY", defaults.app_key),
            base_url: env_or("RELAY_BASE_URL", defaults.base_url),
            token_url: env_or("RELAY_TOKEN_URL", defaults.token_url),
            secrets_dir: env::var("RELAY_SECRETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_dir),
            rate_limit_per_minute: parse_or(
                "RELAY_RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            ),
            max_concurrent_webhooks: parse_or(
                "RELAY_MAX_CONCURRENT_WEBHOOKS",
                defaults.max_concurrent_webhooks,
            ),
            trust: TrustFilterConfig {
                allowed_repos: list_from_env("RELAY_ALLOWED_REPOS"),
                ignore_authors: list_from_env("RELAY_IGNORE_PR_AUTHORS"),
                ignore_title_patterns: list_from_env("RELAY_IGNORE_PR_TITLE"),
                ignore_source_branch_patterns: list_from_env("RELAY_IGNORE_PR_SOURCE_BRANCHES"),
                ignore_target_branch_patterns: list_from_env("RELAY_IGNORE_PR_TARGET_BRANCHES"),
            },
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    env::var(name).unwrap_or(default)
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn list_from_env(name: &str) -> Vec<String> {
    env::var(name)
        .map(|value| parse_list(&value))
        .unwrap_or_default()
}

/// Split a comma-separated list, trimming entries and dropping empties.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
