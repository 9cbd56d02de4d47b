//! Summarizers that fold a batch of L1 turns into one L2 summary
//!
//! A summarizer may be a purely local reduction or a call out to an LLM.
//! Whatever it returns, the memory never sees a failure: errors are caught
//! by the caller and replaced with [`local::fallback_summary`].

pub mod fallback;
pub mod local;
pub mod prompts;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{MemoryConfig, SummarizerConfig, SummarizerProvider};
use crate::memory::types::Turn;

pub use fallback::FallbackSummarizer;
pub use local::{LocalSummarizer, fallback_summary};
pub use remote::RemoteSummarizer;

/// Trait for summary providers (local reduction, remote API, chained)
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Reduce an ordered batch of turns to a short text
    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummarizerError>;

    /// Check if the provider can currently serve requests
    async fn is_available(&self) -> bool;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Summarizer-specific errors
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Summarizer unavailable: {0}")]
    Unavailable(String),
}

/// Build the summarizer selected in config
///
/// Remote providers read their API key at construction, so a missing key
/// surfaces here rather than on the first fold.
pub fn from_config(
    config: &SummarizerConfig,
    memory: &MemoryConfig,
) -> Result<Arc<dyn Summarizer>, SummarizerError> {
    let local = LocalSummarizer::new(memory.summary_char_cap);
    match config.provider {
        SummarizerProvider::Local => Ok(Arc::new(local)),
        SummarizerProvider::Remote => Ok(Arc::new(RemoteSummarizer::new(&config.remote)?)),
        SummarizerProvider::Fallback => {
            let remote = RemoteSummarizer::new(&config.remote)?;
            Ok(Arc::new(FallbackSummarizer::new(
                Arc::new(remote),
                Arc::new(local),
            )))
        }
    }
}
