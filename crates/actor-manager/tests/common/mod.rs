//! Shared harness: a "profile" of tabs sharing one store and one channel.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use actor_core::effects::TtlPolicy;
use actor_core::{Announcement, ManagerConfig, Referrer};
use actor_effects::{
    GatedStorageAccess, LocalBroadcastHub, MemoryStorageHandler, StaticConfirmationHandler,
};
use actor_manager::{ActorManager, AnnouncementStream};
use std::time::Duration;

/// Long enough for a broadcast to be delivered and applied.
pub const SETTLE: Duration = Duration::from_millis(200);

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fast_config() -> ManagerConfig {
    ManagerConfig {
        init_delay_ms: 1,
        propagation_delay_ms: 10,
        ..ManagerConfig::default()
    }
}

/// An unrelated origin, like a fresh `<uuid>.com`.
pub fn random_referrer() -> String {
    format!("{:016x}.com", rand::random::<u64>())
}

pub async fn settle() {
    tokio::time::sleep(SETTLE).await;
}

/// Everything announced so far, after letting in-flight messages land.
pub async fn settled(stream: &mut AnnouncementStream) -> Vec<Announcement> {
    settle().await;
    stream.drain()
}

/// Tabs of one browser profile.
#[derive(Clone)]
pub struct Profile {
    pub storage: MemoryStorageHandler,
    pub hub: LocalBroadcastHub,
    pub confirmation: StaticConfirmationHandler,
}

impl Profile {
    /// Profile whose user confirms every deletion
    pub fn new() -> Self {
        Self::with_storage(MemoryStorageHandler::from_config(&fast_config()))
    }

    pub fn with_ttl(ttl: TtlPolicy) -> Self {
        Self::with_storage(MemoryStorageHandler::with_ttl(ttl))
    }

    fn with_storage(storage: MemoryStorageHandler) -> Self {
        init_tracing();
        Self {
            storage,
            hub: LocalBroadcastHub::new(),
            confirmation: StaticConfirmationHandler::accepting(),
        }
    }

    /// Open a tab embedded under `referrer`; not yet initialized.
    pub fn open(&self, referrer: &str) -> ActorManager {
        ActorManager::builder()
            .with_referrer(Referrer::new(referrer))
            .with_config(fast_config())
            .with_storage(self.storage.clone())
            .with_broadcast(self.hub.clone())
            .with_confirmation(self.confirmation.clone())
            .build()
            .unwrap()
    }

    /// Open a tab with its own configuration.
    pub fn open_with_config(&self, referrer: &str, config: ManagerConfig) -> ActorManager {
        ActorManager::builder()
            .with_referrer(Referrer::new(referrer))
            .with_config(config)
            .with_storage(self.storage.clone())
            .with_broadcast(self.hub.clone())
            .with_confirmation(self.confirmation.clone())
            .build()
            .unwrap()
    }

    /// Open a tab whose storage access sits behind `gate`.
    pub fn open_gated(&self, referrer: &str, gate: GatedStorageAccess) -> ActorManager {
        ActorManager::builder()
            .with_referrer(Referrer::new(referrer))
            .with_config(fast_config())
            .with_storage(self.storage.clone())
            .with_broadcast(self.hub.clone())
            .with_confirmation(self.confirmation.clone())
            .with_storage_access(gate)
            .build()
            .unwrap()
    }

    /// Open a tab, wait for it to initialize, and subscribe with the
    /// initial announcements already drained.
    pub async fn tab(&self, referrer: &str) -> (ActorManager, AnnouncementStream) {
        let manager = self.open(referrer);
        let mut announcements = manager.subscribe();
        manager.until_initialized().await.unwrap();
        announcements.drain();
        (manager, announcements)
    }
}
