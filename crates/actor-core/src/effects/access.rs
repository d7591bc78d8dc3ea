//! Permission gate for cross-context storage access
//!
//! An embedded context may need explicit permission (possibly tied to a user
//! gesture) before it can reach the shared store.

use crate::errors::Result;
use async_trait::async_trait;

/// Storage-access port.
#[async_trait]
pub trait StorageAccessEffects: Send + Sync {
    /// Whether access is already granted, without prompting.
    async fn has_storage_access(&self) -> bool;

    /// Ask for access. Fails with `PermissionDenied` when refused.
    async fn request_storage_access(&self) -> Result<()>;
}
