//! Tests for the local file secret store

use super::*;
use secrecy::ExposeSecret;
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> LocalFileSecretStore {
    LocalFileSecretStore::open(dir.path())
        .await
        .expect("store should open")
}

/// Find the single tenant record file in the store directory.
fn record_file(dir: &TempDir) -> std::path::PathBuf {
    std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .expect("exactly one record file expected")
}

#[tokio::test]
async fn store_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let secret = "a-long-shared-secret-value-0123456789";
    store
        .store_secret("connection:1234", secret, None)
        .await
        .unwrap();

    let loaded = store.get_secret("connection:1234").await.unwrap();
    assert_eq!(loaded.expose_secret(), secret);
}

#[tokio::test]
async fn short_secret_round_trips_exactly() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    // Shorter than the padding threshold; reconstruction must still
    // return the original value, not the padded one.
    store.store_secret("tenant-1", "abc123", None).await.unwrap();

    let loaded = store.get_secret("tenant-1").await.unwrap();
    assert_eq!(loaded.expose_secret(), "abc123");
}

#[tokio::test]
async fn unknown_tenant_is_absent_not_an_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    assert!(store.get_secret("never-installed").await.is_none());
}

#[tokio::test]
async fn rewrite_replaces_previous_record() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .store_secret("tenant-1", "first-secret-value", None)
        .await
        .unwrap();
    store
        .store_secret("tenant-1", "second-secret-value", None)
        .await
        .unwrap();

    let loaded = store.get_secret("tenant-1").await.unwrap();
    assert_eq!(loaded.expose_secret(), "second-secret-value");
}

#[tokio::test]
async fn tampered_fragment_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .store_secret("tenant-1", "a-long-shared-secret-value", None)
        .await
        .unwrap();

    let path = record_file(&dir);
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let part1 = record["key_parts"]["part1"].as_str().unwrap();
    let mut flipped: String = part1.to_string();
    let replacement = if flipped.starts_with('x') { "y" } else { "x" };
    flipped.replace_range(0..1, replacement);
    record["key_parts"]["part1"] = serde_json::Value::String(flipped);
    std::fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

    assert!(store.get_secret("tenant-1").await.is_none());
}

#[tokio::test]
async fn tampered_metadata_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .store_secret("tenant-1", "a-long-shared-secret-value", None)
        .await
        .unwrap();

    let path = record_file(&dir);
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    // Shrinking the recorded length would silently truncate the secret if
    // the metadata were not covered by the integrity tag.
    record["metadata"]["secret_len"] = serde_json::json!(4);
    std::fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

    assert!(store.get_secret("tenant-1").await.is_none());
}

#[tokio::test]
async fn record_file_never_holds_the_whole_secret() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let secret = "contiguous-secret-material-0123456789abcdef";
    store.store_secret("tenant-1", secret, None).await.unwrap();

    let raw = std::fs::read_to_string(record_file(&dir)).unwrap();
    assert!(!raw.contains(secret));
}

#[tokio::test]
async fn list_skips_tampered_records() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .store_secret("tenant-good", "good-secret-value-123", None)
        .await
        .unwrap();
    store
        .store_secret("tenant-bad", "bad-secret-value-1234", None)
        .await
        .unwrap();

    // Corrupt the bad tenant's record.
    let entries = store.list_secrets().await;
    assert_eq!(entries.len(), 2);
    let bad_safe_id = entries
        .iter()
        .find(|(_, e)| {
            e.metadata["client_key_hash"]
                == serde_json::json!(super::client_key_hash("tenant-bad"))
        })
        .map(|(id, _)| id.clone())
        .unwrap();
    let bad_path = dir.path().join(format!("{bad_safe_id}.json"));
    let raw = std::fs::read_to_string(&bad_path).unwrap();
    let mut record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    record["metadata"]["created_at"] = serde_json::json!("1970-01-01T00:00:00Z");
    std::fs::write(&bad_path, serde_json::to_string(&record).unwrap()).unwrap();

    let entries = store.list_secrets().await;
    assert_eq!(entries.len(), 1);
    assert!(!entries.contains_key(&bad_safe_id));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .store_secret("tenant-1", "some-secret-value-123", None)
        .await
        .unwrap();

    assert!(store.delete_secret("tenant-1").await);
    assert!(!store.delete_secret("tenant-1").await);
    assert!(store.get_secret("tenant-1").await.is_none());
}

#[tokio::test]
async fn reopened_store_reads_existing_records() {
    let dir = TempDir::new().unwrap();

    {
        let store = open_store(&dir).await;
        store
            .store_secret("tenant-1", "persisted-secret-value", None)
            .await
            .unwrap();
    }

    let reopened = open_store(&dir).await;
    let loaded = reopened.get_secret("tenant-1").await.unwrap();
    assert_eq!(loaded.expose_secret(), "persisted-secret-value");
}

#[tokio::test]
async fn lost_master_key_fails_closed() {
    let dir = TempDir::new().unwrap();

    {
        let store = open_store(&dir).await;
        store
            .store_secret("tenant-1", "unrecoverable-secret-value", None)
            .await
            .unwrap();
    }

    std::fs::remove_file(dir.path().join(MASTER_KEY_FILE)).unwrap();

    // A new master key is generated; old records must verify as absent,
    // never as a partial or corrupted secret.
    let reopened = open_store(&dir).await;
    assert!(reopened.get_secret("tenant-1").await.is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn key_material_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store
        .store_secret("tenant-1", "some-secret-value-123", None)
        .await
        .unwrap();

    let key_mode = std::fs::metadata(dir.path().join(MASTER_KEY_FILE))
        .unwrap()
        .permissions()
        .mode();
    let record_mode = std::fs::metadata(record_file(&dir))
        .unwrap()
        .permissions()
        .mode();

    assert_eq!(key_mode & 0o777, 0o600);
    assert_eq!(record_mode & 0o777, 0o600);
}

#[test]
fn split_pads_short_secrets_before_splitting() {
    let (parts, len) = split_secret("ab");

    assert_eq!(len, 2);
    // 16 padded chars split in half, plus the fragment suffix.
    assert_eq!(parts.part1.chars().count(), 8 + FRAGMENT_PAD_CHARS);
    assert_eq!(parts.part2.chars().count(), 8 + FRAGMENT_PAD_CHARS);
}

#[test]
fn combine_rejects_truncated_fragments() {
    let parts = KeyParts {
        part1: "short".to_string(),
        part2: "also-short".to_string(),
    };
    assert!(combine_fragments(&parts, Some(4)).is_none());
}
