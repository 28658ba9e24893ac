//! Authentication error taxonomy.
//!
//! Security note: variants never carry secret material or raw assertions,
//! only derived identifiers and upstream status information.

use thiserror::Error;

/// Errors raised while authenticating a webhook delivery.
///
/// All of these are terminal for the request: the event is logged and
/// dropped, and the caller still acknowledges the delivery so the
/// platform does not retry-storm us.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signed assertion could not be split or its claims decoded.
    #[error("malformed signed assertion")]
    MalformedAssertion,

    /// The assertion names an issuer we have no stored secret for, or the
    /// stored record failed integrity verification.
    #[error("no verifiable secret for tenant {tenant_hash}")]
    UnknownTenant { tenant_hash: String },

    /// The stored secret document is not in the expected format.
    #[error("stored secret for tenant {tenant_hash} has an unexpected format")]
    SecretFormat { tenant_hash: String },

    /// Signature verification against the tenant's shared secret failed.
    #[error("assertion signature verification failed: {source}")]
    InvalidSignature {
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    /// The exchange assertion could not be signed.
    #[error("failed to sign exchange assertion: {source}")]
    Signing {
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    /// The token exchange call failed at the transport level (includes
    /// timeouts).
    #[error("token exchange transport failure: {source}")]
    ExchangeTransport {
        #[source]
        source: reqwest::Error,
    },

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint rejected the exchange with status {status}")]
    ExchangeRejected { status: u16 },

    /// The token endpoint response did not contain an access token.
    #[error("token endpoint response missing access_token")]
    ExchangeResponse,
}
