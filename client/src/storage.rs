//! Client-durable key/value storage for the access token.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Canonical storage key for the access token.
pub const TOKEN_KEY: &str = "token";
/// Older key still found in existing stores. Read as a fallback, never written.
pub const LEGACY_TOKEN_KEY: &str = "authToken";

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not a JSON string map: {0}")]
    Format(#[from] serde_json::Error),
}

/// Minimal string store. Only the access token lives here; the refresh credential stays in
/// the transport's cookie jar.
#[async_trait]
pub trait TokenStorage: Send + Sync + fmt::Debug {
    // Backend name for logs.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    // Returns whether the key existed.
    async fn remove(&self, key: &str) -> StorageResult<bool>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

/// A JSON object of strings on disk.
///
/// Every write rewrites the whole file through a sibling temp file and a rename, so readers
/// see either the old or the new map.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for FileStorage {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.store(&entries).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir()
            .join("session-client-tests")
            .join(format!("{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);

        storage.set(TOKEN_KEY, "T1").await.unwrap();
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("T1"));

        assert!(storage.remove(TOKEN_KEY).await.unwrap());
        assert!(!storage.remove(TOKEN_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn file_storage_persists_across_instances() {
        let path = scratch_file();
        let _ = tokio::fs::remove_file(&path).await;

        let first = FileStorage::new(&path);
        assert_eq!(first.get(TOKEN_KEY).await.unwrap(), None);
        first.set(TOKEN_KEY, "T1").await.unwrap();
        first.set(LEGACY_TOKEN_KEY, "old").await.unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get(TOKEN_KEY).await.unwrap().as_deref(), Some("T1"));
        assert!(second.remove(LEGACY_TOKEN_KEY).await.unwrap());
        assert_eq!(first.get(LEGACY_TOKEN_KEY).await.unwrap(), None);

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let path = scratch_file();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get(TOKEN_KEY).await,
            Err(StorageError::Format(_))
        ));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
