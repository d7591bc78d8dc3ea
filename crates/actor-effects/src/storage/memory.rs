//! In-memory storage handler
//!
//! Clones share the same map, so several manager instances built from clones
//! of one handler behave like tabs sharing a browser profile.

use actor_core::effects::{StorageEffects, StorageError, StoredEntry, TtlClass, TtlPolicy};
use actor_core::ManagerConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    /// `None` when the lifetime is past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory storage handler with expiration
#[derive(Debug, Clone)]
pub struct MemoryStorageHandler {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: TtlPolicy,
}

impl MemoryStorageHandler {
    /// Create an empty store with default lifetimes
    pub fn new() -> Self {
        Self::with_ttl(TtlPolicy::default())
    }

    /// Create an empty store with custom lifetimes
    pub fn with_ttl(ttl: TtlPolicy) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create an empty store with the lifetimes of `config`
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::with_ttl(config.ttl_policy())
    }

    /// Lifetimes applied to new entries
    pub fn ttl(&self) -> TtlPolicy {
        self.ttl
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let data = self.data.read().await;
        data.values().filter(|e| e.is_live(now)).count()
    }

    /// True when no live entries remain
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }
}

impl Default for MemoryStorageHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEffects for MemoryStorageHandler {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let now = Instant::now();
        let mut data = self.data.write().await;
        match data.get(name) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                data.remove(name);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: &str, ttl: TtlClass) -> Result<(), StorageError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(self.ttl.duration(ttl)),
        };
        self.data.write().await.insert(name.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.data.write().await.remove(name);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredEntry>, StorageError> {
        let now = Instant::now();
        let mut data = self.data.write().await;
        data.retain(|_, entry| entry.is_live(now));
        let mut entries: Vec<StoredEntry> = data
            .iter()
            .map(|(name, entry)| StoredEntry {
                name: name.clone(),
                value: entry.value.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
