//! Error types for secret persistence.
//!
//! Security note: variants never carry secret values, only file paths and
//! derived identifiers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the secret store.
///
/// Read-side failures are generally degraded to "secret absent" by the
/// store itself; this type surfaces where the caller must see the failure,
/// primarily on writes (a failed install has to be visible to the
/// operator).
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// Filesystem access to the secrets directory or a record failed.
    #[error("secret store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The master-key file could not be created or read.
    #[error("master key unavailable at {path}: {source}")]
    MasterKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized or deserialized.
    #[error("failed to encode secret record {safe_id}")]
    Encoding {
        safe_id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
