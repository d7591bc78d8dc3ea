//! Storage-access handlers
//!
//! `AmbientStorageAccess` models a context that never needs permission.
//! `GatedStorageAccess` models an embedded context that starts without
//! access and may obtain it on request (or from the outside, as when the
//! user grants it in another frame).

use actor_core::effects::StorageAccessEffects;
use actor_core::{ActorError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Access is always granted
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientStorageAccess;

#[async_trait]
impl StorageAccessEffects for AmbientStorageAccess {
    async fn has_storage_access(&self) -> bool {
        true
    }

    async fn request_storage_access(&self) -> Result<()> {
        Ok(())
    }
}

/// Access starts closed; requests succeed only while grantable
#[derive(Debug, Clone)]
pub struct GatedStorageAccess {
    granted: Arc<AtomicBool>,
    grantable: Arc<AtomicBool>,
}

impl GatedStorageAccess {
    /// Closed gate; `grantable` decides whether a request will succeed
    pub fn new(grantable: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(false)),
            grantable: Arc::new(AtomicBool::new(grantable)),
        }
    }

    /// Closed gate that any request opens
    pub fn grantable() -> Self {
        Self::new(true)
    }

    /// Closed gate that refuses every request
    pub fn denied() -> Self {
        Self::new(false)
    }

    /// Open the gate without a request
    pub fn grant(&self) {
        self.granted.store(true, Ordering::SeqCst);
    }

    /// Decide whether later requests succeed
    pub fn set_grantable(&self, grantable: bool) {
        self.grantable.store(grantable, Ordering::SeqCst);
    }

    /// Whether the gate is open
    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageAccessEffects for GatedStorageAccess {
    async fn has_storage_access(&self) -> bool {
        self.is_granted()
    }

    async fn request_storage_access(&self) -> Result<()> {
        if self.is_granted() {
            return Ok(());
        }
        if self.grantable.load(Ordering::SeqCst) {
            self.grant();
            info!("Storage access granted");
            Ok(())
        } else {
            warn!("Storage access request refused");
            Err(ActorError::permission_denied(
                "The actor manager can't work without local storage access",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_ambient_access() {
        assert!(AmbientStorageAccess.has_storage_access().await);
        AmbientStorageAccess.request_storage_access().await.unwrap();
    }

    #[tokio::test]
    async fn test_gate_opens_on_request() {
        let gate = GatedStorageAccess::grantable();
        assert!(!gate.has_storage_access().await);
        gate.request_storage_access().await.unwrap();
        assert!(gate.has_storage_access().await);
    }

    #[tokio::test]
    async fn test_denied_gate_stays_closed() {
        let gate = GatedStorageAccess::denied();
        assert_matches!(
            gate.request_storage_access().await,
            Err(ActorError::PermissionDenied { .. })
        );
        assert!(!gate.has_storage_access().await);

        gate.clone().grant();
        assert!(gate.has_storage_access().await);
    }
}
