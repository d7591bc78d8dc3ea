//! Builder for [`ActorManager`]
//!
//! Storage and broadcast handlers are required. Confirmation defaults to a
//! handler that declines everything, so nothing gets deleted without an
//! explicit confirmation port; storage access defaults to always granted.
//!
//! ```rust,ignore
//! use actor_effects::{LocalBroadcastHub, MemoryStorageHandler};
//! use actor_manager::ActorManager;
//!
//! let manager = ActorManager::builder()
//!     .with_referrer(Referrer::resolve(None, "https://app.example.com/")?)
//!     .with_storage(MemoryStorageHandler::new())
//!     .with_broadcast(LocalBroadcastHub::new())
//!     .build()?;
//! manager.until_initialized().await?;
//! ```

use crate::announcements::AnnouncementBus;
use crate::lifecycle::Lifecycle;
use crate::manager::{ActorManager, Inner};
use crate::tasks::TaskRegistry;
use actor_core::effects::{
    BroadcastEffects, ConfirmationEffects, StorageAccessEffects, StorageEffects,
};
use actor_core::{ActorError, ChannelId, ManagerConfig, Referrer, Result};
use actor_effects::{AmbientStorageAccess, StaticConfirmationHandler};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Assembles an [`ActorManager`] from a referrer, a configuration and
/// effect handlers.
#[derive(Default)]
pub struct ActorManagerBuilder {
    referrer: Option<Referrer>,
    config: ManagerConfig,
    storage: Option<Arc<dyn StorageEffects>>,
    broadcast: Option<Arc<dyn BroadcastEffects>>,
    confirmation: Option<Arc<dyn ConfirmationEffects>>,
    access: Option<Arc<dyn StorageAccessEffects>>,
    announcements: Option<AnnouncementBus>,
}

impl ActorManagerBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the referrer scoping the chosen actor (required).
    pub fn with_referrer(mut self, referrer: Referrer) -> Self {
        self.referrer = Some(referrer);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the storage handler (required).
    pub fn with_storage(mut self, storage: impl StorageEffects + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Set an already shared storage handler (required).
    pub fn with_shared_storage(mut self, storage: Arc<dyn StorageEffects>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the broadcast handler (required).
    pub fn with_broadcast(mut self, broadcast: impl BroadcastEffects + 'static) -> Self {
        self.broadcast = Some(Arc::new(broadcast));
        self
    }

    /// Set the confirmation handler.
    pub fn with_confirmation(mut self, confirmation: impl ConfirmationEffects + 'static) -> Self {
        self.confirmation = Some(Arc::new(confirmation));
        self
    }

    /// Set the storage-access handler.
    pub fn with_storage_access(mut self, access: impl StorageAccessEffects + 'static) -> Self {
        self.access = Some(Arc::new(access));
        self
    }

    /// Publish announcements on `bus`, so subscriptions can be taken out
    /// before the manager exists.
    pub fn with_announcements(mut self, bus: AnnouncementBus) -> Self {
        self.announcements = Some(bus);
        self
    }

    /// Build the manager and schedule its initialization.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the referrer, storage or broadcast handler is
    /// missing, or the configuration does not validate.
    pub fn build(self) -> Result<ActorManager> {
        self.config.validate()?;
        let referrer = self
            .referrer
            .ok_or_else(|| ActorError::invalid_input("missing required configuration: referrer"))?;
        let storage = self
            .storage
            .ok_or_else(|| ActorError::invalid_input("missing required configuration: storage"))?;
        let broadcast = self.broadcast.ok_or_else(|| {
            ActorError::invalid_input("missing required configuration: broadcast")
        })?;
        let confirmation = self.confirmation.unwrap_or_else(|| {
            Arc::new(StaticConfirmationHandler::declining()) as Arc<dyn ConfirmationEffects>
        });
        let access = self
            .access
            .unwrap_or_else(|| Arc::new(AmbientStorageAccess) as Arc<dyn StorageAccessEffects>);
        let announcements = self
            .announcements
            .unwrap_or_else(|| AnnouncementBus::new(self.config.announcement_capacity));

        Ok(ActorManager::start(Inner {
            config: self.config,
            referrer,
            channel_id: ChannelId::random(),
            storage,
            broadcast,
            confirmation,
            access,
            announcements,
            lifecycle: Lifecycle::new(),
            init_lock: Mutex::new(()),
            tasks: TaskRegistry::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_core::ActorEvent;
    use actor_effects::{LocalBroadcastHub, MemoryStorageHandler};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_missing_handlers_are_rejected() {
        let result = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_broadcast(LocalBroadcastHub::new())
            .build();
        assert_matches!(result, Err(ActorError::InvalidInput { .. }));

        let result = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_storage(MemoryStorageHandler::new())
            .build();
        assert_matches!(result, Err(ActorError::InvalidInput { .. }));

        let result = ActorManagerBuilder::new()
            .with_storage(MemoryStorageHandler::new())
            .with_broadcast(LocalBroadcastHub::new())
            .build();
        assert_matches!(result, Err(ActorError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ManagerConfig {
            channel_name: String::new(),
            ..ManagerConfig::default()
        };
        let result = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_config(config)
            .with_storage(MemoryStorageHandler::new())
            .with_broadcast(LocalBroadcastHub::new())
            .build();
        assert_matches!(result, Err(ActorError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_defaults_initialize() {
        let manager = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_storage(MemoryStorageHandler::new())
            .with_broadcast(LocalBroadcastHub::new())
            .build()
            .unwrap();
        manager.until_initialized().await.unwrap();
        assert!(manager.is_initialized());
        assert_eq!(manager.config(), &ManagerConfig::default());
    }

    #[tokio::test]
    async fn test_supplied_bus_sees_initial_announcement() {
        let bus = AnnouncementBus::new(8);
        let mut early = bus.subscribe();
        let manager = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_storage(MemoryStorageHandler::new())
            .with_broadcast(LocalBroadcastHub::new())
            .with_announcements(bus)
            .build()
            .unwrap();
        manager.until_initialized().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(early.drain(), vec![ActorEvent::Choose(None)]);
    }

    #[tokio::test]
    async fn test_shared_storage_is_used() {
        let storage = MemoryStorageHandler::new();
        let manager = ActorManagerBuilder::new()
            .with_referrer(Referrer::new("https://a.test"))
            .with_shared_storage(Arc::new(storage.clone()))
            .with_broadcast(LocalBroadcastHub::new())
            .build()
            .unwrap();
        manager.until_initialized().await.unwrap();
        assert!(storage.is_empty().await);

        let uri = manager.create_actor("alice").await.unwrap();
        manager.choose_actor(&uri).await.unwrap();
        assert_eq!(storage.len().await, 2);
        assert!(storage.get(uri.as_str()).await.unwrap().is_some());
    }
}
