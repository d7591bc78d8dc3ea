//! Initialization state machine
//!
//! `Uninitialized -> StorageGranted -> Loaded -> Initialized`. Phases only
//! move forward. Storage-touching operations park on [`Lifecycle::wait_initialized`]
//! until the terminal phase is reached.

use actor_core::{ActorError, Result};
use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Initialization phase of a manager instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InitPhase {
    /// Constructed; storage access not yet confirmed
    Uninitialized,
    /// Storage access confirmed and the sync channel is open
    StorageGranted,
    /// Persisted actors and the chosen pointer have been loaded and announced
    Loaded,
    /// Ready; gated operations proceed
    Initialized,
}

impl fmt::Display for InitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitPhase::Uninitialized => "uninitialized",
            InitPhase::StorageGranted => "storage-granted",
            InitPhase::Loaded => "loaded",
            InitPhase::Initialized => "initialized",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    phase: watch::Sender<InitPhase>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (phase, _) = watch::channel(InitPhase::Uninitialized);
        Self { phase }
    }

    pub(crate) fn phase(&self) -> InitPhase {
        *self.phase.borrow()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.phase() == InitPhase::Initialized
    }

    /// Move to `next` if it is ahead of the current phase.
    pub(crate) fn advance(&self, next: InitPhase) -> bool {
        let moved = self.phase.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if moved {
            info!(phase = %next, "Actor manager phase changed");
        }
        moved
    }

    pub(crate) async fn wait_for(&self, target: InitPhase) -> Result<()> {
        let mut receiver = self.phase.subscribe();
        receiver
            .wait_for(|phase| *phase >= target)
            .await
            .map(|_| ())
            .map_err(|_| ActorError::internal("Lifecycle channel closed"))
    }

    pub(crate) async fn wait_initialized(&self) -> Result<()> {
        self.wait_for(InitPhase::Initialized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_phases_only_move_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), InitPhase::Uninitialized);
        assert!(lifecycle.advance(InitPhase::Loaded));
        assert!(!lifecycle.advance(InitPhase::StorageGranted));
        assert!(!lifecycle.advance(InitPhase::Loaded));
        assert_eq!(lifecycle.phase(), InitPhase::Loaded);
        assert!(!lifecycle.is_initialized());
    }

    #[tokio::test]
    async fn test_waiters_release_on_initialized() {
        let lifecycle = Arc::new(Lifecycle::new());
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait_initialized().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        lifecycle.advance(InitPhase::StorageGranted);
        lifecycle.advance(InitPhase::Initialized);
        waiter.await.unwrap().unwrap();

        // Already there: returns at once
        lifecycle.wait_initialized().await.unwrap();
    }
}
