//! Per-tenant shared-secret storage for ReviewRelay.
//!
//! This crate persists the shared secrets handed to us by the hosting
//! platform during tenant installation and retrieves them on every webhook
//! verification. Records are stored one JSON file per tenant, named by a
//! derived `safe_id`, alongside a single locally generated master key.
//!
//! ## Architecture
//!
//! Business logic depends on the [`SecretProvider`] trait; the shipped
//! implementation is [`LocalFileSecretStore`]. The store provides:
//!
//! - **Safe ID derivation**: tenant identifiers never appear in file names.
//! - **Integrity verification**: every record carries an HMAC tag; a record
//!   that fails verification is treated as absent, never as a partial
//!   secret.
//! - **Obscurity at rest**: secret values are split into padded fragments
//!   before writing. This is *not* encryption; confidentiality rests on
//!   the master-key file's permissions, not on the fragment scheme.
//!
//! # Security
//!
//! - Secret values MUST NOT be logged.
//! - Secret values MUST NOT appear in error messages.
//! - The master-key file is created with owner-only permissions and is the
//!   sole confidentiality boundary. Losing it makes every existing record
//!   permanently unverifiable (fail-closed).

mod errors;
mod record;
mod store;

pub use errors::SecretStoreError;
pub use record::{KeyParts, RecordMetadata, TenantSecretRecord};
pub use store::{LocalFileSecretStore, SecretEntry, SecretProvider};
