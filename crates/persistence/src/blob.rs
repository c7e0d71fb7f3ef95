//! Blob storage collaborator.
//!
//! Uploaded files live under opaque storage paths; metadata rows in the
//! datastore point at them. Two implementations: a local-filesystem store
//! for production and an in-memory store for tests, the latter with
//! injectable failures to exercise compensating cleanup paths.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::error::DomainError;

/// Storage collaborator for binary blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), DomainError>;
    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, DomainError>;
    async fn delete(&self, path: &str) -> Result<(), DomainError>;
}

/// Storage path for a chat attachment: `{order}/{message}/{unique}.{ext}`.
pub fn attachment_path(order_id: Uuid, message_id: Uuid, file_name: &str) -> String {
    match extension_of(file_name) {
        Some(ext) => format!("{}/{}/{}.{}", order_id, message_id, unique_suffix(), ext),
        None => format!("{}/{}/{}", order_id, message_id, unique_suffix()),
    }
}

/// Storage path for an order file, or for the general pool when `order_id`
/// is `None`.
pub fn order_file_path(order_id: Option<Uuid>, file_name: &str) -> String {
    let scope = match order_id {
        Some(id) => id.to_string(),
        None => "general".to_string(),
    };
    format!("files/{}/{}-{}", scope, unique_suffix(), sanitize(file_name))
}

fn unique_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

fn extension_of(file_name: &str) -> Option<&str> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn sanitize(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    name.trim_start_matches('.').replace(' ', "_")
}

/// Local-filesystem blob store rooted at a configured directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, DomainError> {
        let relative = Path::new(path);
        let traversal = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if traversal || path.is_empty() {
            return Err(DomainError::validation(format!("Invalid blob path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::external(format!("Blob store failed: {}", e)))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| DomainError::external(format!("Blob store failed: {}", e)))
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, DomainError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DomainError::not_found(format!("Blob {}", path)))
            }
            Err(e) => Err(DomainError::external(format!("Blob retrieve failed: {}", e))),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), DomainError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted; reconciliation only cares that
            // no blob remains.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path, "Blob already absent on delete");
                Ok(())
            }
            Err(e) => Err(DomainError::external(format!("Blob delete failed: {}", e))),
        }
    }
}

/// In-memory blob store for tests, with injectable failures.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fail_store: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `store` call fail.
    pub fn fail_stores(&self, fail: bool) {
        self.fail_store.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), DomainError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(DomainError::external("Blob store unavailable"));
        }
        self.blobs
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, DomainError> {
        self.blobs
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Blob {}", path)))
    }

    async fn delete(&self, path: &str) -> Result<(), DomainError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DomainError::external("Blob delete unavailable"));
        }
        self.blobs.write().await.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_path_is_scoped_and_keeps_extension() {
        let order_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let path = attachment_path(order_id, message_id, "arte final.PDF");

        let prefix = format!("{}/{}/", order_id, message_id);
        assert!(path.starts_with(&prefix));
        assert!(path.ends_with(".PDF"));
    }

    #[test]
    fn test_attachment_path_without_extension() {
        let path = attachment_path(Uuid::new_v4(), Uuid::new_v4(), "README");
        assert!(!path.contains('.'));
    }

    #[test]
    fn test_attachment_paths_are_unique() {
        let order_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let a = attachment_path(order_id, message_id, "x.png");
        let b = attachment_path(order_id, message_id, "x.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_order_file_path_scopes() {
        let order_id = Uuid::new_v4();
        let scoped = order_file_path(Some(order_id), "proposta.pdf");
        assert!(scoped.starts_with(&format!("files/{}/", order_id)));
        assert!(scoped.ends_with("-proposta.pdf"));

        let general = order_file_path(None, "tabela.xlsx");
        assert!(general.starts_with("files/general/"));
    }

    #[test]
    fn test_sanitize_strips_directories_and_spaces() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("arte final.png"), "arte_final.png");
        assert_eq!(sanitize(".hidden"), "hidden");
    }

    #[test]
    fn test_memory_store_round_trip() {
        tokio_test::block_on(async {
            let store = MemoryBlobStore::new();
            store.store("a/b/c.png", b"bytes").await.unwrap();

            assert!(store.contains("a/b/c.png").await);
            assert_eq!(store.retrieve("a/b/c.png").await.unwrap(), b"bytes");

            store.delete("a/b/c.png").await.unwrap();
            assert!(store.is_empty().await);
        });
    }

    #[tokio::test]
    async fn test_memory_store_missing_blob_is_not_found() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.retrieve("nope").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryBlobStore::new();
        store.fail_stores(true);
        assert!(matches!(
            store.store("x", b"y").await,
            Err(DomainError::ExternalService(_))
        ));

        store.fail_stores(false);
        store.store("x", b"y").await.unwrap();
        store.fail_deletes(true);
        assert!(store.delete("x").await.is_err());
        assert!(store.contains("x").await);
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal() {
        let store = FsBlobStore::new("/tmp/ideiaprint-test-blobs");
        assert!(matches!(
            store.store("../outside", b"x").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            store.retrieve("/absolute").await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let root = std::env::temp_dir().join(format!("ideiaprint-blobs-{}", Uuid::new_v4()));
        let store = FsBlobStore::new(&root);

        store.store("o/m/file.txt", b"conteudo").await.unwrap();
        assert_eq!(store.retrieve("o/m/file.txt").await.unwrap(), b"conteudo");

        store.delete("o/m/file.txt").await.unwrap();
        assert!(store.retrieve("o/m/file.txt").await.is_err());
        // Deleting again is idempotent.
        store.delete("o/m/file.txt").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
