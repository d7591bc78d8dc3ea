//! Local announcement bus
//!
//! In-process fan-out of [`Announcement`]s to subscribers of one manager
//! instance. Announcements never leave the process; cross-instance delivery
//! is the sync channel's job.

use actor_core::Announcement;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Publisher side of the bus. Clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct AnnouncementBus {
    sender: broadcast::Sender<Announcement>,
}

impl AnnouncementBus {
    /// Bus buffering up to `capacity` announcements per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New subscription receiving every announcement made from now on
    pub fn subscribe(&self) -> AnnouncementStream {
        AnnouncementStream {
            receiver: self.sender.subscribe(),
        }
    }

    /// Deliver `announcement` to every current subscriber
    pub fn announce(&self, announcement: Announcement) {
        trace!(action = %announcement.action(), "Announcing");
        // Nobody listening is fine
        let _ = self.sender.send(announcement);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Subscriber side of the bus.
///
/// A subscriber that falls more than the bus capacity behind skips the
/// oldest announcements and keeps going.
#[derive(Debug)]
pub struct AnnouncementStream {
    receiver: broadcast::Receiver<Announcement>,
}

impl AnnouncementStream {
    /// Wait for the next announcement. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Announcement> {
        loop {
            match self.receiver.recv().await {
                Ok(announcement) => return Some(announcement),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Announcement subscriber lagged");
                }
            }
        }
    }

    /// Next announcement if one is already buffered
    pub fn try_recv(&mut self) -> Option<Announcement> {
        loop {
            match self.receiver.try_recv() {
                Ok(announcement) => return Some(announcement),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Announcement subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Discard everything buffered so far
    pub fn drain(&mut self) -> Vec<Announcement> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
