//! Confirmation handlers
//!
//! A fixed-answer handler whose answer can be changed at runtime and which
//! records every prompt it was shown. Embedders with a real user interface
//! implement `ConfirmationEffects` themselves.

use actor_core::effects::ConfirmationEffects;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Answers every prompt with the same configurable value
#[derive(Debug, Clone)]
pub struct StaticConfirmationHandler {
    answer: Arc<AtomicBool>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StaticConfirmationHandler {
    /// Handler that answers `answer`
    pub fn new(answer: bool) -> Self {
        Self {
            answer: Arc::new(AtomicBool::new(answer)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handler that confirms everything
    pub fn accepting() -> Self {
        Self::new(true)
    }

    /// Handler that declines everything
    pub fn declining() -> Self {
        Self::new(false)
    }

    /// Change the answer for subsequent prompts (shared by all clones)
    pub fn set_answer(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    /// Every prompt shown so far
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for StaticConfirmationHandler {
    fn default() -> Self {
        Self::declining()
    }
}

#[async_trait]
impl ConfirmationEffects for StaticConfirmationHandler {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().await.push(prompt.to_string());
        let answer = self.answer.load(Ordering::SeqCst);
        debug!(answer, "Confirmation answered");
        answer
    }
}
