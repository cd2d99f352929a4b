//! Mock text generator for tests and examples.
//!
//! Returns scripted responses in order (the last one repeats), records every
//! prompt, and can be switched to fail to exercise error propagation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AgentError;
use crate::llm::TextGenerator;

/// Mock generator: scripted responses, recorded prompts.
///
/// **Interaction**: Implements `TextGenerator`; used by example nodes and tests.
pub struct MockLlm {
    responses: Vec<String>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MockLlm {
    /// Always returns `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_responses([content.into()])
    }

    /// Returns the responses in order; once exhausted the last one repeats.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every following call fail (or succeed again with `false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order (failed calls included).
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl TextGenerator for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        self.prompts.lock().await.push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(AgentError::ExecutionFailed(
                "mock text generation failed".to_string(),
            ));
        }
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(n)
            .or_else(|| self.responses.last())
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed("mock has no responses".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Responses are returned in order and the last one repeats.
    #[tokio::test]
    async fn mock_returns_scripted_responses() {
        let llm = MockLlm::with_responses(["a", "b"]);
        assert_eq!(llm.generate("p1").await.unwrap(), "a");
        assert_eq!(llm.generate("p2").await.unwrap(), "b");
        assert_eq!(llm.generate("p3").await.unwrap(), "b");
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.prompts().await, vec!["p1", "p2", "p3"]);
    }

    /// **Scenario**: A failing mock returns ExecutionFailed and still records the prompt.
    #[tokio::test]
    async fn mock_failing_returns_error() {
        let llm = MockLlm::new("ok");
        llm.set_failing(true);
        assert!(matches!(
            llm.generate("p").await,
            Err(AgentError::ExecutionFailed(_))
        ));
        llm.set_failing(false);
        assert_eq!(llm.generate("p").await.unwrap(), "ok");
        assert_eq!(llm.prompts().await.len(), 2);
    }

    /// **Scenario**: A mock with no responses fails instead of panicking.
    #[tokio::test]
    async fn mock_without_responses_errors() {
        let llm = MockLlm::with_responses(Vec::<String>::new());
        assert!(llm.generate("p").await.is_err());
    }
}
