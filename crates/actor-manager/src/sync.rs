//! Cross-instance synchronization channel
//!
//! Every instance subscribes to one shared broadcast channel, whatever its
//! referrer. Received messages are filtered (own echoes, foreign
//! selections, garbage), then applied after the propagation delay: a
//! `delete` of the chosen actor unchooses it, and the event is re-announced
//! locally. Received events are never re-broadcast.

use crate::manager::Inner;
use actor_core::{ActorEvent, ChannelId, ChannelMessage, Referrer, Result};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What a receiver does with a decoded channel message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Sent by this instance
    Echo,
    /// A selection change under another referrer
    ForeignSelection,
    /// Apply and re-announce
    Accept,
}

/// Selections are scoped to a referrer; lifecycle events are global.
pub(crate) fn classify(
    message: &ChannelMessage,
    own_id: &ChannelId,
    own_referrer: &Referrer,
) -> Disposition {
    if message.sender == *own_id {
        return Disposition::Echo;
    }
    match message.event {
        ActorEvent::Choose(_) if message.referrer != *own_referrer => {
            Disposition::ForeignSelection
        }
        ActorEvent::Choose(_) | ActorEvent::Update(_) | ActorEvent::Delete(_) => {
            Disposition::Accept
        }
    }
}

impl Inner {
    /// Subscribe to the shared channel and start the listener task.
    pub(crate) async fn open_channel(self: &Arc<Self>) -> Result<()> {
        let mut stream = self.broadcast.subscribe(&self.config.channel_name).await?;
        debug!(channel = %self.config.channel_name, id = %self.channel_id, "Listening on sync channel");

        let weak = Arc::downgrade(self);
        self.tasks.spawn_cancellable(async move {
            // Sequential handling keeps each sender's messages in order
            while let Some(payload) = stream.next().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.on_channel_payload(&payload).await;
            }
            trace!("Sync channel closed");
        });
        Ok(())
    }

    async fn on_channel_payload(&self, payload: &[u8]) {
        let message = match ChannelMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                trace!(error = %e, "Discarding malformed channel message");
                return;
            }
        };

        match classify(&message, &self.channel_id, &self.referrer) {
            Disposition::Echo => {}
            Disposition::ForeignSelection => {
                trace!(referrer = %message.referrer, "Ignoring selection for another referrer");
            }
            Disposition::Accept => {
                tokio::time::sleep(self.config.propagation_delay()).await;
                if let Err(e) = self.apply_remote(message.event).await {
                    warn!(error = %e, "Failed to apply channel message");
                }
            }
        }
    }

    async fn apply_remote(&self, event: ActorEvent) -> Result<()> {
        debug!(action = %event.action(), "Applying remote event");
        if let ActorEvent::Delete(deleted) = &event {
            if self.read_chosen().await?.as_ref() == Some(deleted) {
                debug!(uri = %deleted, "Chosen actor was deleted elsewhere");
                self.clear_chosen().await?;
                self.publish(ActorEvent::Choose(None)).await;
            }
        }
        self.announcements.announce(event);
        Ok(())
    }
}
