//! In-process broadcast hub
//!
//! Named channels backed by `tokio::sync::broadcast`. Clones of one hub share
//! its channels, so every manager built from the same hub hears every other,
//! including itself; echo suppression is the receiver's job.

use actor_core::effects::{BroadcastEffects, BroadcastStream};
use actor_core::Result;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream as TokioBroadcastStream;
use tracing::{trace, warn};

/// Default number of undelivered payloads buffered per channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcast handler shared by every instance of one process
#[derive(Debug, Clone)]
pub struct LocalBroadcastHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
    capacity: usize,
}

impl LocalBroadcastHub {
    /// Create a hub with the default per-channel capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a hub buffering up to `capacity` payloads per channel
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscribers on `channel`
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().await;
        channels
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for LocalBroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastEffects for LocalBroadcastHub {
    async fn post(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        let sender = self.sender(channel).await;
        // No subscribers is not a failure: nobody else is listening yet
        match sender.send(payload) {
            Ok(receivers) => trace!(channel, receivers, "Posted broadcast payload"),
            Err(_) => trace!(channel, "Posted broadcast payload with no subscribers"),
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<BroadcastStream> {
        let receiver = self.sender(channel).await.subscribe();
        let channel = channel.to_string();
        let stream = TokioBroadcastStream::new(receiver).filter_map(move |item| {
            let payload = match item {
                Ok(payload) => Some(payload),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(channel = %channel, skipped, "Broadcast subscriber lagged");
                    None
                }
            };
            futures::future::ready(payload)
        });
        Ok(stream.boxed())
    }
}
