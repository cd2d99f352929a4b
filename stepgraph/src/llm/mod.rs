//! Text generation used by node bodies.
//!
//! Nodes that call a generative model hold an `Arc<dyn TextGenerator>` and call it
//! from `Node::run`. The engine places no retry policy around these calls: an
//! error is returned from the node unchanged and the thread keeps its last
//! checkpoint, so the caller can `Input::Retry` once the cause is fixed.

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;

/// Opaque `generate(prompt) -> text` call, fallible and network-bound.
///
/// Implementations: `MockLlm` (scripted), `ChatOpenAI` (real API, feature `openai`).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}
