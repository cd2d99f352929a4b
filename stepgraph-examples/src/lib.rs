//! Shared setup for the stepgraph examples.

use std::sync::Arc;

use stepgraph::TextGenerator;
use tracing_subscriber::EnvFilter;

/// Loads `.env` and installs a fmt subscriber (`RUST_LOG`, default `info`).
pub fn init() {
    dotenv::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Text generator for the examples: `ChatOpenAI` with the `openai` feature,
/// otherwise a `MockLlm` answering with `canned`.
pub fn text_generator(canned: &str) -> Arc<dyn TextGenerator> {
    #[cfg(feature = "openai")]
    {
        let _ = canned;
        Arc::new(stepgraph::ChatOpenAI::from_env())
    }
    #[cfg(not(feature = "openai"))]
    {
        Arc::new(stepgraph::MockLlm::new(canned))
    }
}
