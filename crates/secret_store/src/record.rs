//! On-disk record layout for tenant secrets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

/// Free-form record metadata.
///
/// A `BTreeMap` keeps serialization key order deterministic, which the
/// integrity tag computation relies on.
pub type RecordMetadata = BTreeMap<String, serde_json::Value>;

/// The two fragments that together reconstruct a tenant's shared secret.
///
/// Each fragment carries a fixed-length random suffix so stored fragment
/// lengths do not correlate with the original secret length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParts {
    pub part1: String,
    pub part2: String,
}

/// A persisted tenant secret record.
///
/// One record exists per tenant, stored as `<safe_id>.json` inside the
/// secrets directory. Records are never mutated in place; a rewrite
/// replaces the whole file. The `integrity_tag` is an HMAC over the
/// canonical encoding of `key_parts` and `metadata` and must validate
/// before the reconstructed secret is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSecretRecord {
    /// Stable, non-reversible identifier derived from the tenant's
    /// client key.
    pub safe_id: String,

    /// Secret fragments with random padding suffixes.
    pub key_parts: KeyParts,

    /// Record metadata (client key hash, creation timestamp, safe id,
    /// original secret length).
    pub metadata: RecordMetadata,

    /// Hex-encoded HMAC-SHA256 over the canonical tag input.
    pub integrity_tag: String,
}

/// Canonical input for integrity tag computation.
///
/// Field order is fixed by this struct and metadata keys are sorted by the
/// `BTreeMap`, so the same record always encodes to the same bytes.
#[derive(Serialize)]
struct TagInput<'a> {
    key_parts: &'a KeyParts,
    metadata: &'a RecordMetadata,
}

/// Encode the tag input (`key_parts` + `metadata`) to canonical bytes.
pub(crate) fn canonical_tag_input(
    key_parts: &KeyParts,
    metadata: &RecordMetadata,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&TagInput {
        key_parts,
        metadata,
    })
}
