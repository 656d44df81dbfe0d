#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use sensorlink_core::constants::CONFIGURATION_BLOBS;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Named byte blobs with whole-value replacement.
///
/// A write either replaces the blob completely or leaves the previous
/// content in place.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature).
/// Because such traits are not object-safe, callers that need to pick a
/// backend at runtime hold an [`AnyBlobStore`].
pub trait BlobStore: Send + Sync {
    /// Read a blob; `None` when it does not exist.
    async fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replace a blob.
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Delete a blob. Returns whether it existed.
    async fn remove(&self, name: &str) -> StorageResult<bool>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.read(name).await?.is_some())
    }
}

fn check_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Directory-backed store: one file per blob.
///
/// Writes go to a temporary sibling first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sensorlink_storage::store::{BlobStore, FsBlobStore};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = FsBlobStore::open("/var/lib/sensorlink").await?;
    /// store.write("devices.json", b"[]").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Configuration(format!(
                "Failed to create storage directory {}: {e}",
                root.display()
            ))
        })?;
        debug!(root = %root.display(), "blob store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> StorageResult<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

impl BlobStore for FsBlobStore {
    async fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(name)?).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(name, e)),
        }
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let target = self.path(name)?;
        let staging = self.root.join(format!(".{name}.tmp"));

        tokio::fs::write(&staging, data)
            .await
            .map_err(|e| StorageError::io(name, e))?;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| StorageError::io(name, e))?;

        debug!(blob = name, bytes = data.len(), "blob written");
        Ok(())
    }

    async fn remove(&self, name: &str) -> StorageResult<bool> {
        match tokio::fs::remove_file(self.path(name)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(name, e)),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    blobs: HashMap<String, Vec<u8>>,
    writes: usize,
}

/// In-memory store for tests and simulation.
///
/// Cloning yields another view of the same blobs. Writes can be made to
/// fail on demand to exercise persistence error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    state: Arc<Mutex<MemoryState>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Current content of a blob.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().blobs.get(name).cloned()
    }

    /// Seed a blob without counting it as a write.
    pub fn insert(&self, name: &str, data: impl Into<Vec<u8>>) {
        self.lock().blobs.insert(name.to_string(), data.into());
    }
}

impl BlobStore for MemoryBlobStore {
    async fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        check_name(name)?;
        Ok(self.get(name))
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        check_name(name)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("write of '{name}' rejected")));
        }
        let mut state = self.lock();
        state.blobs.insert(name.to_string(), data.to_vec());
        state.writes += 1;
        Ok(())
    }

    async fn remove(&self, name: &str) -> StorageResult<bool> {
        check_name(name)?;
        Ok(self.lock().blobs.remove(name).is_some())
    }
}

/// Enum wrapper for blob store dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyBlobStore {
    /// Files in a directory.
    Fs(FsBlobStore),
    /// Process memory.
    Memory(MemoryBlobStore),
}

impl From<FsBlobStore> for AnyBlobStore {
    fn from(store: FsBlobStore) -> Self {
        Self::Fs(store)
    }
}

impl From<MemoryBlobStore> for AnyBlobStore {
    fn from(store: MemoryBlobStore) -> Self {
        Self::Memory(store)
    }
}

impl BlobStore for AnyBlobStore {
    async fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        match self {
            Self::Fs(store) => store.read(name).await,
            Self::Memory(store) => store.read(name).await,
        }
    }

    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        match self {
            Self::Fs(store) => store.write(name, data).await,
            Self::Memory(store) => store.write(name, data).await,
        }
    }

    async fn remove(&self, name: &str) -> StorageResult<bool> {
        match self {
            Self::Fs(store) => store.remove(name).await,
            Self::Memory(store) => store.remove(name).await,
        }
    }
}

/// Delete every configuration blob (snapshot, broker settings, topics).
///
/// Every blob is attempted; the first failure is returned after the rest
/// have been tried.
pub async fn erase_configuration<S: BlobStore>(store: &S) -> StorageResult<()> {
    let mut first_error = None;
    for name in CONFIGURATION_BLOBS {
        match store.remove(name).await {
            Ok(existed) => debug!(blob = name, existed, "configuration blob erased"),
            Err(e) => {
                warn!(blob = name, error = %e, "failed to erase configuration blob");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            info!("configuration erased");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sensorlink_core::constants::{SNAPSHOT_BLOB, TOPICS_BLOB};

    #[rstest]
    #[case("")]
    #[case("../etc/passwd")]
    #[case("a/b")]
    #[case(".hidden")]
    fn test_rejects_bad_names(#[case] name: &str) {
        assert!(matches!(check_name(name), Err(StorageError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.read("devices.json").await.unwrap(), None);

        store.write("devices.json", b"[]").await.unwrap();
        assert_eq!(store.read("devices.json").await.unwrap(), Some(b"[]".to_vec()));
        assert!(store.exists("devices.json").await.unwrap());
        assert_eq!(store.write_count(), 1);

        assert!(store.remove("devices.json").await.unwrap());
        assert!(!store.remove("devices.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_writes_keep_previous_content() {
        let store = MemoryBlobStore::new();
        store.write("devices.json", b"[1]").await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.write("devices.json", b"[2]").await,
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.get("devices.json"), Some(b"[1]".to_vec()));

        store.set_fail_writes(false);
        store.write("devices.json", b"[2]").await.unwrap();
        assert_eq!(store.get("devices.json"), Some(b"[2]".to_vec()));
    }

    #[tokio::test]
    async fn test_erase_configuration() {
        let store = MemoryBlobStore::new();
        store.insert(SNAPSHOT_BLOB, "[]");
        store.insert(TOPICS_BLOB, "[]");
        store.insert("unrelated.json", "{}");

        erase_configuration(&store).await.unwrap();

        assert!(store.get(SNAPSHOT_BLOB).is_none());
        assert!(store.get(TOPICS_BLOB).is_none());
        assert!(store.get("unrelated.json").is_some());
    }

    #[tokio::test]
    async fn test_any_store_dispatch() {
        let memory = MemoryBlobStore::new();
        let store = AnyBlobStore::from(memory.clone());

        store.write("mqtt.json", b"{}").await.unwrap();
        assert_eq!(memory.get("mqtt.json"), Some(b"{}".to_vec()));
    }
}
