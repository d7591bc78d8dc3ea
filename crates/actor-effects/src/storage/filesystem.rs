//! Filesystem-backed storage handler
//!
//! One JSON file per entry under a base directory. Names may contain
//! characters that are unsafe in paths (`:` and `/` appear in actor URIs and
//! referrer origins), so the file name is the hex encoding of the name. Each
//! file records its own absolute expiration; expired files are ignored and
//! removed lazily.

use actor_core::effects::{StorageEffects, StorageError, StoredEntry, TtlClass, TtlPolicy};
use actor_core::ManagerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, warn};

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredFile {
    name: String,
    value: String,
    expires_at_ms: u64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Filesystem-based storage handler
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    /// Base directory for entry files
    base_path: PathBuf,
    ttl: TtlPolicy,
}

impl FilesystemStorageHandler {
    /// Create a handler rooted at `base_path` with default lifetimes
    pub fn new(base_path: PathBuf) -> Self {
        Self::with_ttl(base_path, TtlPolicy::default())
    }

    /// Create a handler rooted at `base_path` with custom lifetimes
    pub fn with_ttl(base_path: PathBuf, ttl: TtlPolicy) -> Self {
        Self { base_path, ttl }
    }

    /// Create a handler rooted at `base_path` with the lifetimes of `config`
    pub fn from_config(base_path: PathBuf, config: &ManagerConfig) -> Self {
        Self::with_ttl(base_path, config.ttl_policy())
    }

    /// Lifetimes applied to new entries
    pub fn ttl(&self) -> TtlPolicy {
        self.ttl
    }

    /// Directory holding the entry files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.{EXTENSION}", hex::encode(name.as_bytes())))
    }

    /// Read one entry file, removing it when expired or unreadable.
    async fn read_live(&self, path: &Path) -> Result<Option<StoredFile>, StorageError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let stored: StoredFile = match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding corrupt storage entry");
                remove_quietly(path).await;
                return Ok(None);
            }
        };

        if stored.expires_at_ms <= now_ms() {
            debug!(name = %stored.name, "Storage entry expired");
            remove_quietly(path).await;
            return Ok(None);
        }
        Ok(Some(stored))
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove storage entry");
        }
    }
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .read_live(&self.entry_path(name))
            .await?
            .map(|stored| stored.value))
    }

    async fn set(&self, name: &str, value: &str, ttl: TtlClass) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::invalid_input("Entry name cannot be empty"));
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StorageError::storage(format!("Failed to create directory: {e}")))?;

        let lifetime_ms = u64::try_from(self.ttl.duration(ttl).as_millis()).unwrap_or(u64::MAX);
        let stored = StoredFile {
            name: name.to_string(),
            value: value.to_string(),
            expires_at_ms: now_ms().saturating_add(lifetime_ms),
        };
        let bytes = serde_json::to_vec(&stored)?;

        // Write-then-rename so readers never observe a partial file
        let path = self.entry_path(name);
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| StorageError::storage(format!("Failed to write file: {e}")))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::storage(format!("Failed to replace file: {e}")))?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::storage(format!("Failed to remove file: {e}"))),
        }
    }

    async fn get_all(&self) -> Result<Vec<StoredEntry>, StorageError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::storage(format!(
                    "Failed to read directory: {e}"
                )))
            }
        };

        let mut live = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::storage(format!("Failed to read directory entry: {e}"))
        })? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stored) = self.read_live(&path).await? {
                live.push(StoredEntry {
                    name: stored.name,
                    value: stored.value,
                });
            }
        }

        live.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_roundtrip_with_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path().to_path_buf());

        let name = "chosen:https://app.example.com";
        storage.set(name, "actor:abc", TtlClass::Short).await.unwrap();
        assert_eq!(storage.get(name).await.unwrap().as_deref(), Some("actor:abc"));

        let all = storage.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, name);

        storage.delete(name).await.unwrap();
        storage.delete(name).await.unwrap();
        assert_eq!(storage.get(name).await.unwrap(), None);
        assert!(storage.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path().join("not-yet"));
        assert!(storage.get_all().await.unwrap().is_empty());
        assert_eq!(storage.get("x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_and_corrupt_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::with_ttl(
            dir.path().to_path_buf(),
            TtlPolicy {
                long: Duration::from_secs(60),
                short: Duration::from_millis(10),
            },
        );
        storage.set("keep", "1", TtlClass::Long).await.unwrap();
        storage.set("drop", "2", TtlClass::Short).await.unwrap();
        std::fs::write(dir.path().join("garbage.json"), b"{not json").unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let names: Vec<String> = storage
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["keep".to_string()]);
        assert!(!dir.path().join("garbage.json").exists());
    }

    #[tokio::test]
    async fn test_lifetimes_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ManagerConfig::default();
        config.ttl.short_days = 2;
        let storage = FilesystemStorageHandler::from_config(dir.path().to_path_buf(), &config);
        assert_eq!(storage.ttl(), config.ttl_policy());
        assert_eq!(storage.ttl().short, Duration::from_secs(2 * 24 * 60 * 60));
    }

    #[tokio::test]
    async fn test_two_handlers_share_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = FilesystemStorageHandler::new(dir.path().to_path_buf());
        let b = FilesystemStorageHandler::new(dir.path().to_path_buf());
        a.set("k", "from a", TtlClass::Long).await.unwrap();
        b.set("k", "from b", TtlClass::Long).await.unwrap();
        assert_eq!(a.get("k").await.unwrap().as_deref(), Some("from b"));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorageHandler::new(dir.path().to_path_buf());
        assert!(storage.set("", "v", TtlClass::Long).await.is_err());
    }
}
