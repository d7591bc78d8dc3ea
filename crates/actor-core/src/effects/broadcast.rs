//! Cross-context broadcast channel
//!
//! Named channels shared by every instance in a profile, whatever their
//! origin. Delivery is at-least-once and order-preserving per sender, with
//! no total order across senders. Payloads are opaque bytes; receivers must
//! tolerate garbage from unrelated contexts sharing a channel name.

use crate::errors::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of payloads posted to a channel after subscribing.
pub type BroadcastStream = BoxStream<'static, Vec<u8>>;

/// Broadcast port.
#[async_trait]
pub trait BroadcastEffects: Send + Sync {
    /// Post `payload` to every subscriber of `channel`.
    async fn post(&self, channel: &str, payload: Vec<u8>) -> Result<()>;

    /// Receive everything posted to `channel` from now on.
    async fn subscribe(&self, channel: &str) -> Result<BroadcastStream>;
}
