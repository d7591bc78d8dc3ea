//! Persistent key/value storage with sliding expiration
//!
//! Modelled on a cookie jar: string values under string names, each written
//! with an expiration class. Expired entries are invisible to every
//! operation. Every instance in the same profile shares one store and there
//! is no locking: concurrent writers race under last-write-wins.

use crate::errors::ActorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage operation error
pub type StorageError = ActorError;

/// Expiration class of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtlClass {
    /// Actor records (about a year)
    Long,
    /// Chosen pointers (about a month)
    Short,
}

/// Concrete lifetimes for each [`TtlClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Lifetime of `TtlClass::Long` entries
    pub long: Duration,
    /// Lifetime of `TtlClass::Short` entries
    pub short: Duration,
}

impl TtlPolicy {
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Lifetime for `class`.
    pub fn duration(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Long => self.long,
            TtlClass::Short => self.short,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            long: Self::DAY * 365,
            short: Self::DAY * 30,
        }
    }
}

/// A live entry returned by [`StorageEffects::get_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Entry name
    pub name: String,
    /// Entry value
    pub value: String,
}

/// Storage port.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Value stored under `name`, if present and not expired.
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `name`, expiring after the lifetime of `ttl`.
    /// Rewriting an entry restarts its lifetime.
    async fn set(&self, name: &str, value: &str, ttl: TtlClass) -> Result<(), StorageError>;

    /// Remove `name`. Removing an absent entry is not an error.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Every live entry.
    async fn get_all(&self) -> Result<Vec<StoredEntry>, StorageError>;
}
