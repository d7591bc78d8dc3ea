//! Yes/no confirmation gate for destructive actions

use async_trait::async_trait;

/// Confirmation port.
///
/// A decline is an ordinary answer, not an error; callers decide what a
/// `false` means.
#[async_trait]
pub trait ConfirmationEffects: Send + Sync {
    /// Ask the user to confirm `prompt`.
    async fn confirm(&self, prompt: &str) -> bool;
}
