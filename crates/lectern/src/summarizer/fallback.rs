//! Chained summarizer with fallback logic
//!
//! Tries a primary summarizer first and falls back to a secondary on error.
//! If both fail, returns the secondary's error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::memory::types::Turn;
use crate::summarizer::{Summarizer, SummarizerError};

/// Summarizer that tries `primary`, then `secondary`
pub struct FallbackSummarizer {
    primary: Arc<dyn Summarizer>,
    secondary: Arc<dyn Summarizer>,
}

impl FallbackSummarizer {
    pub fn new(primary: Arc<dyn Summarizer>, secondary: Arc<dyn Summarizer>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl Summarizer for FallbackSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummarizerError> {
        match self.primary.summarize(turns).await {
            Ok(text) => {
                debug!("{} summarizer succeeded", self.primary.name());
                return Ok(text);
            }
            Err(e) => {
                warn!(
                    "{} summarizer failed: {}, trying {}",
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
            }
        }

        self.secondary.summarize(turns).await.inspect_err(|e| {
            warn!("{} summarizer also failed: {}", self.secondary.name(), e);
        })
    }

    async fn is_available(&self) -> bool {
        self.primary.is_available().await || self.secondary.is_available().await
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
