//! End-to-end webhook authentication.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use secret_store::SecretProvider;

use crate::assertion::{unverified_issuer, verify_assertion};
use crate::errors::AuthError;
use crate::token_exchange::TokenExchanger;

#[cfg(test)]
#[path = "authenticator_tests.rs"]
mod tests;

/// The JSON document stored per tenant in the secret store.
///
/// Written by the install callback, read by the authenticator. Stored as
/// one opaque secret value so a record round-trips through the store
/// unchanged.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TenantSecretsDocument {
    pub shared_secret: String,
    pub client_key: String,
}

impl TenantSecretsDocument {
    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error; callers treat it as a
    /// persistence failure.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result of a fully authenticated webhook delivery.
#[derive(Debug)]
pub struct AuthenticatedTenant {
    /// The verified tenant's client key.
    pub client_key: String,
    /// Short-lived upstream bearer token minted for this delivery.
    pub bearer_token: String,
}

/// Verifies inbound signed assertions and mints upstream tokens.
///
/// Depends on [`SecretProvider`] for tenant secrets, so the store
/// implementation stays swappable.
pub struct WebhookAuthenticator {
    secrets: Arc<dyn SecretProvider>,
    exchanger: TokenExchanger,
}

impl WebhookAuthenticator {
    pub fn new(secrets: Arc<dyn SecretProvider>, exchanger: TokenExchanger) -> Self {
        Self { secrets, exchanger }
    }

    /// Authenticate a delivery's signed assertion and exchange it for an
    /// upstream bearer token.
    ///
    /// Walks the fixed progression: decode the assertion's issuer, load
    /// that tenant's secret, verify the signature, then exchange. Every
    /// failure is terminal for this request; nothing is retried here.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] for whichever step failed. Messages
    /// carry the tenant hash, never the secret or the raw assertion.
    pub async fn authenticate(&self, assertion: &str) -> Result<AuthenticatedTenant, AuthError> {
        let client_key = unverified_issuer(assertion)?;
        let tenant_hash = hash_tenant(&client_key);
        debug!(%tenant_hash, "assertion decoded, tenant resolved");

        let stored = self
            .secrets
            .get_secret(&client_key)
            .await
            .ok_or_else(|| AuthError::UnknownTenant {
                tenant_hash: tenant_hash.clone(),
            })?;

        let document: TenantSecretsDocument = serde_json::from_str(stored.expose_secret())
            .map_err(|_| AuthError::SecretFormat {
                tenant_hash: tenant_hash.clone(),
            })?;
        let shared_secret = SecretString::from(document.shared_secret);
        debug!(%tenant_hash, "tenant secret loaded");

        verify_assertion(assertion, &shared_secret, &client_key)?;
        debug!(%tenant_hash, "assertion signature verified");

        let bearer_token = self.exchanger.exchange(&shared_secret, &client_key).await?;
        debug!(%tenant_hash, "upstream token exchanged");

        Ok(AuthenticatedTenant {
            client_key,
            bearer_token,
        })
    }
}

/// Truncated SHA-256 of a client key, safe for logs and error messages.
pub fn hash_tenant(client_key: &str) -> String {
    let digest = Sha256::digest(client_key.as_bytes());
    hex::encode(digest)[..16].to_string()
}
