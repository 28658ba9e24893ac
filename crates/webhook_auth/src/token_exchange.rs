//! Upstream token exchange.
//!
//! A verified shared secret is turned into a short-lived bearer token by
//! signing a time-bounded assertion and POSTing it to the hosting
//! platform's token endpoint.

use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

use crate::errors::AuthError;

#[cfg(test)]
#[path = "token_exchange_tests.rs"]
mod tests;

/// Exchange assertion lifetime in seconds (issued-at to expiry).
const ASSERTION_LIFETIME_SECS: i64 = 240;

/// Canonical request string hashed into the `qsh` claim.
const CANONICAL_REQUEST: &str = "GET&/site/oauth2/access_token&";

/// Grant type for JWT bearer exchange.
const GRANT_TYPE: &str = "urn:bitbucket:oauth2:jwt";

/// Bounded timeout for the exchange call; a stuck upstream must not pin a
/// pipeline task indefinitely.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ExchangeClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    qsh: String,
    sub: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
}

/// Client for the hosting platform's token endpoint.
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    app_key: String,
}

impl TokenExchanger {
    /// Create an exchanger for the given token endpoint.
    ///
    /// `app_key` is this app's identifier, used as the assertion issuer.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ExchangeTransport`] if the HTTP client cannot
    /// be constructed.
    pub fn new(
        token_url: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|source| AuthError::ExchangeTransport { source })?;

        Ok(Self {
            http,
            token_url: token_url.into(),
            app_key: app_key.into(),
        })
    }

    /// Exchange a tenant's shared secret for an upstream bearer token.
    ///
    /// Failures are terminal for the current request; the next webhook
    /// delivery starts a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`], [`AuthError::ExchangeTransport`],
    /// [`AuthError::ExchangeRejected`], or [`AuthError::ExchangeResponse`]
    /// depending on where the exchange fails.
    pub async fn exchange(
        &self,
        shared_secret: &SecretString,
        client_key: &str,
    ) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = ExchangeClaims {
            iss: &self.app_key,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            qsh: hex::encode(Sha256::digest(CANONICAL_REQUEST.as_bytes())),
            sub: client_key,
        };

        let assertion = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(shared_secret.expose_secret().as_bytes()),
        )
        .map_err(|source| AuthError::Signing { source })?;

        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("JWT {assertion}"))
            .form(&[("grant_type", GRANT_TYPE)])
            .send()
            .await
            .map_err(|source| AuthError::ExchangeTransport { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ExchangeRejected {
                status: status.as_u16(),
            });
        }

        let body: ExchangeResponse = response
            .json()
            .await
            .map_err(|source| AuthError::ExchangeTransport { source })?;

        let token = body.access_token.ok_or(AuthError::ExchangeResponse)?;
        debug!("exchanged assertion for upstream bearer token");
        Ok(token)
    }
}
