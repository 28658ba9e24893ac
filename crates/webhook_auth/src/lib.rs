//! Webhook authentication for ReviewRelay.
//!
//! Each inbound webhook delivery carries a signed assertion (an HS256 JWT
//! issued by the tenant's installation). Authentication walks a fixed
//! per-request progression:
//!
//! ```text
//! RECEIVED -> SIGNATURE_DECODED -> TENANT_RESOLVED -> SECRET_LOADED
//!          -> SIGNATURE_VERIFIED -> TOKEN_EXCHANGED
//! ```
//!
//! Any step failing transitions the request to rejected: the event is
//! dropped with a logged error and nothing is retried within the request.
//! On success the verified shared secret is used to mint a short-lived
//! assertion that is exchanged with the hosting platform's token endpoint
//! for an upstream bearer token.
//!
//! Shared secrets are held as [`secrecy::SecretString`] and never logged.

mod assertion;
mod authenticator;
mod errors;
mod token_exchange;

pub use assertion::{unverified_issuer, verify_assertion};
pub use authenticator::{
    hash_tenant, AuthenticatedTenant, TenantSecretsDocument, WebhookAuthenticator,
};
pub use errors::AuthError;
pub use token_exchange::TokenExchanger;
