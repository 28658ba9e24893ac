//! Local file-based secret storage.
//!
//! One JSON record per tenant, named by a derived safe id, plus a single
//! master-key file. The master key drives both safe-id derivation and the
//! per-record integrity tags, so losing it makes every record unverifiable.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::errors::SecretStoreError;
use crate::record::{canonical_tag_input, KeyParts, RecordMetadata, TenantSecretRecord};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

/// File holding the store's master key, created on first open.
const MASTER_KEY_FILE: &str = ".master_key";

/// Master key length in bytes.
const MASTER_KEY_LEN: usize = 32;

/// Length of the hex safe id derived from a client key.
const SAFE_ID_LEN: usize = 16;

/// Length of the client-key hash recorded in metadata.
const CLIENT_KEY_HASH_LEN: usize = 16;

/// Secrets shorter than this are padded before splitting.
const MIN_SECRET_LEN: usize = 16;

/// Random bytes appended (hex-encoded) to each stored fragment.
const FRAGMENT_PAD_BYTES: usize = 8;

/// Hex characters of padding carried by each fragment.
const FRAGMENT_PAD_CHARS: usize = FRAGMENT_PAD_BYTES * 2;

/// Metadata key recording the original secret length in characters.
const SECRET_LEN_KEY: &str = "secret_len";

/// Provider interface for tenant shared secrets.
///
/// Business logic depends on this trait; [`LocalFileSecretStore`] is the
/// shipped implementation. Implementations must be thread-safe and must
/// never log or surface secret values.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Retrieve a tenant's secret.
    ///
    /// Returns `None` for unknown tenants and for records that fail
    /// integrity verification; a missing tenant is an expected condition,
    /// not an error.
    async fn get_secret(&self, client_key: &str) -> Option<SecretString>;

    /// Persist a tenant's secret, replacing any prior record.
    ///
    /// Safe to call concurrently for different client keys; concurrent
    /// writes for the same key are last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the record cannot be encoded or
    /// written. A failed install must be visible to the operator, so write
    /// failures are not degraded.
    async fn store_secret(
        &self,
        client_key: &str,
        secret_value: &str,
        metadata: Option<RecordMetadata>,
    ) -> Result<(), SecretStoreError>;

    /// Enumerate stored records for administrative inspection.
    ///
    /// Records failing integrity verification are skipped and logged; a
    /// bad record never fails the whole listing.
    async fn list_secrets(&self) -> HashMap<String, SecretEntry>;

    /// Remove a tenant's record. Idempotent: returns `false`, not an
    /// error, when the record is already absent.
    async fn delete_secret(&self, client_key: &str) -> bool;
}

/// Listing entry returned by [`SecretProvider::list_secrets`].
#[derive(Debug, Clone)]
pub struct SecretEntry {
    /// Verified record metadata.
    pub metadata: RecordMetadata,
    /// Location of the record on disk.
    pub file_path: PathBuf,
    /// Record file size in bytes.
    pub file_size: u64,
}

/// File-backed [`SecretProvider`] with integrity verification.
pub struct LocalFileSecretStore {
    secrets_dir: PathBuf,
    master_key: Vec<u8>,
}

impl LocalFileSecretStore {
    /// Open (or initialize) a store rooted at `secrets_dir`.
    ///
    /// Creates the directory and a fresh master key on first use. The
    /// master-key file is written with owner-only permissions and is never
    /// rotated automatically.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] if the directory cannot be created or
    /// the master key cannot be read or written.
    pub async fn open(secrets_dir: impl Into<PathBuf>) -> Result<Self, SecretStoreError> {
        let secrets_dir = secrets_dir.into();
        tokio::fs::create_dir_all(&secrets_dir)
            .await
            .map_err(|source| SecretStoreError::Io {
                path: secrets_dir.clone(),
                source,
            })?;

        let master_key = load_or_create_master_key(&secrets_dir).await?;

        Ok(Self {
            secrets_dir,
            master_key,
        })
    }

    /// Derive the stable, non-reversible file identifier for a client key.
    fn derive_safe_id(&self, client_key: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.master_key)
            .expect("HMAC accepts any key length");
        mac.update(client_key.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());
        digest[..SAFE_ID_LEN].to_string()
    }

    /// Compute the hex integrity tag over fragments and metadata.
    fn compute_tag(
        &self,
        key_parts: &KeyParts,
        metadata: &RecordMetadata,
    ) -> Result<String, serde_json::Error> {
        let input = canonical_tag_input(key_parts, metadata)?;
        let mut mac = HmacSha256::new_from_slice(&self.master_key)
            .expect("HMAC accepts any key length");
        mac.update(&input);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Recompute the tag and compare in constant time against the stored
    /// one.
    fn verify_tag(&self, record: &TenantSecretRecord) -> bool {
        let Ok(input) = canonical_tag_input(&record.key_parts, &record.metadata) else {
            return false;
        };
        let Ok(expected) = hex::decode(&record.integrity_tag) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(&self.master_key)
            .expect("HMAC accepts any key length");
        mac.update(&input);

        // verify_slice is a constant-time comparison.
        mac.verify_slice(&expected).is_ok()
    }

    fn record_path(&self, safe_id: &str) -> PathBuf {
        self.secrets_dir.join(format!("{safe_id}.json"))
    }

    /// Load a record and verify its integrity tag.
    ///
    /// Missing files and unreadable or tampered records all come back as
    /// `None`; tampering is logged at error level for operator visibility.
    async fn load_verified(&self, safe_id: &str) -> Option<TenantSecretRecord> {
        let path = self.record_path(safe_id);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(safe_id, error = %e, "failed to read secret record");
                return None;
            }
        };

        let record: TenantSecretRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                error!(safe_id, error = %e, "secret record is not valid JSON");
                return None;
            }
        };

        if !self.verify_tag(&record) {
            error!(safe_id, "secret record failed integrity check");
            return None;
        }

        Some(record)
    }

    /// Write a record atomically: temp file, restrict permissions, rename.
    ///
    /// A reader never observes a half-written record.
    async fn write_record(&self, record: &TenantSecretRecord) -> Result<(), SecretStoreError> {
        let path = self.record_path(&record.safe_id);
        let tmp_path = self.secrets_dir.join(format!("{}.json.tmp", record.safe_id));

        let encoded =
            serde_json::to_vec_pretty(record).map_err(|source| SecretStoreError::Encoding {
                safe_id: record.safe_id.clone(),
                source,
            })?;

        tokio::fs::write(&tmp_path, &encoded)
            .await
            .map_err(|source| SecretStoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        restrict_permissions(&tmp_path).map_err(|source| SecretStoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| SecretStoreError::Io { path, source })?;

        Ok(())
    }
}

#[async_trait]
impl SecretProvider for LocalFileSecretStore {
    async fn get_secret(&self, client_key: &str) -> Option<SecretString> {
        let safe_id = self.derive_safe_id(client_key);
        let record = self.load_verified(&safe_id).await?;

        let secret_len = record
            .metadata
            .get(SECRET_LEN_KEY)
            .and_then(serde_json::Value::as_u64)
            .map(|len| len as usize);

        match combine_fragments(&record.key_parts, secret_len) {
            Some(secret) => Some(SecretString::from(secret)),
            None => {
                error!(safe_id, "secret record fragments are malformed");
                None
            }
        }
    }

    async fn store_secret(
        &self,
        client_key: &str,
        secret_value: &str,
        metadata: Option<RecordMetadata>,
    ) -> Result<(), SecretStoreError> {
        let safe_id = self.derive_safe_id(client_key);
        let (key_parts, secret_len) = split_secret(secret_value);

        let mut metadata = metadata.unwrap_or_default();
        metadata.insert(
            "client_key_hash".to_string(),
            serde_json::Value::String(client_key_hash(client_key)),
        );
        metadata.insert(
            "created_at".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
        metadata.insert(
            "safe_id".to_string(),
            serde_json::Value::String(safe_id.clone()),
        );
        metadata.insert(SECRET_LEN_KEY.to_string(), serde_json::json!(secret_len));

        let integrity_tag =
            self.compute_tag(&key_parts, &metadata)
                .map_err(|source| SecretStoreError::Encoding {
                    safe_id: safe_id.clone(),
                    source,
                })?;

        let record = TenantSecretRecord {
            safe_id: safe_id.clone(),
            key_parts,
            metadata,
            integrity_tag,
        };

        self.write_record(&record).await?;

        info!(
            tenant = %client_key_hash(client_key),
            safe_id,
            "stored tenant secret"
        );
        Ok(())
    }

    async fn list_secrets(&self) -> HashMap<String, SecretEntry> {
        let mut entries = HashMap::new();

        let mut dir = match tokio::fs::read_dir(&self.secrets_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                error!(path = %self.secrets_dir.display(), error = %e, "failed to list secrets");
                return entries;
            }
        };

        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "failed to enumerate secrets directory");
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            // Skip the master key, temp files, and anything hidden.
            if name.starts_with('.') || !name.ends_with(".json") {
                continue;
            }

            let safe_id = name.trim_end_matches(".json").to_string();
            let Some(record) = self.load_verified(&safe_id).await else {
                continue;
            };

            let file_size = match entry.metadata().await {
                Ok(meta) => meta.len(),
                Err(_) => 0,
            };

            entries.insert(
                safe_id,
                SecretEntry {
                    metadata: record.metadata,
                    file_path: entry.path(),
                    file_size,
                },
            );
        }

        entries
    }

    async fn delete_secret(&self, client_key: &str) -> bool {
        let safe_id = self.derive_safe_id(client_key);
        let path = self.record_path(&safe_id);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(tenant = %client_key_hash(client_key), "deleted tenant secret");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(safe_id, error = %e, "failed to delete secret record");
                false
            }
        }
    }
}

/// Truncated SHA-256 of the client key, safe to log and store in metadata.
fn client_key_hash(client_key: &str) -> String {
    let digest = Sha256::digest(client_key.as_bytes());
    hex::encode(digest)[..CLIENT_KEY_HASH_LEN].to_string()
}

/// Split a secret into two padded fragments.
///
/// Secrets shorter than [`MIN_SECRET_LEN`] are right-padded with random
/// alphanumerics before splitting; each fragment then gets a fixed-length
/// random hex suffix so stored lengths do not reveal the secret's length.
/// Returns the fragments and the original length in characters, which the
/// caller records in metadata so reconstruction can undo the padding.
fn split_secret(secret: &str) -> (KeyParts, usize) {
    let mut chars: Vec<char> = secret.chars().collect();
    let secret_len = chars.len();

    let mut rng = rand::thread_rng();
    while chars.len() < MIN_SECRET_LEN {
        chars.push(rng.sample(Alphanumeric) as char);
    }

    let mid = chars.len() / 2;
    let mut part1: String = chars[..mid].iter().collect();
    let mut part2: String = chars[mid..].iter().collect();

    part1.push_str(&random_hex_pad());
    part2.push_str(&random_hex_pad());

    (KeyParts { part1, part2 }, secret_len)
}

/// Reverse [`split_secret`]: strip the fixed-length padding suffix from
/// each fragment, concatenate in order, and truncate to the recorded
/// length. Returns `None` if either fragment is too short to carry its
/// padding.
fn combine_fragments(parts: &KeyParts, secret_len: Option<usize>) -> Option<String> {
    let part1: Vec<char> = parts.part1.chars().collect();
    let part2: Vec<char> = parts.part2.chars().collect();

    if part1.len() < FRAGMENT_PAD_CHARS || part2.len() < FRAGMENT_PAD_CHARS {
        return None;
    }

    let mut combined: Vec<char> = Vec::with_capacity(part1.len() + part2.len());
    combined.extend(&part1[..part1.len() - FRAGMENT_PAD_CHARS]);
    combined.extend(&part2[..part2.len() - FRAGMENT_PAD_CHARS]);

    if let Some(len) = secret_len {
        if len > combined.len() {
            return None;
        }
        combined.truncate(len);
    }

    Some(combined.into_iter().collect())
}

fn random_hex_pad() -> String {
    let mut bytes = [0u8; FRAGMENT_PAD_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Read the master key, generating one on first use.
async fn load_or_create_master_key(secrets_dir: &Path) -> Result<Vec<u8>, SecretStoreError> {
    let path = secrets_dir.join(MASTER_KEY_FILE);

    match tokio::fs::read(&path).await {
        Ok(key) => Ok(key),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let mut key = vec![0u8; MASTER_KEY_LEN];
            rand::rngs::OsRng.fill_bytes(&mut key);

            tokio::fs::write(&path, &key)
                .await
                .map_err(|source| SecretStoreError::MasterKey {
                    path: path.clone(),
                    source,
                })?;
            restrict_permissions(&path).map_err(|source| SecretStoreError::MasterKey {
                path: path.clone(),
                source,
            })?;

            info!(path = %path.display(), "generated new master key");
            Ok(key)
        }
        Err(source) => Err(SecretStoreError::MasterKey { path, source }),
    }
}

/// Restrict a file to owner read/write only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
