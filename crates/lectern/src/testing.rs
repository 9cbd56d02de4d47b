//! Test utilities for lectern - deterministic counters and scripted summarizers
//!
//! These stubs let unit and integration tests pin exact token costs and
//! summary outcomes without touching a network.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::config::MemoryConfig;
use crate::memory::TieredMemory;
use crate::memory::types::Turn;
use crate::summarizer::{Summarizer, SummarizerError};

pub use crate::token::WordCounter;

#[derive(Debug, Clone)]
enum Script {
    Always(String),
    Fail,
    Sequence(Vec<Result<String, String>>),
    Hang,
}

/// Summarizer with a fixed, inspectable behaviour
///
/// Records every batch it is handed so tests can assert on batch sizes and
/// ordering.
#[derive(Debug)]
pub struct ScriptedSummarizer {
    script: Script,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl ScriptedSummarizer {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Always return `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::with_script(Script::Always(text.into()))
    }

    /// Always fail with an API error
    pub fn failing() -> Self {
        Self::with_script(Script::Fail)
    }

    /// Replay outcomes in order (`Err` strings become API errors), then fail
    pub fn sequence(outcomes: Vec<Result<String, String>>) -> Self {
        Self::with_script(Script::Sequence(outcomes))
    }

    /// Never resolve; for cancellation tests
    pub fn hanging() -> Self {
        Self::with_script(Script::Hang)
    }

    /// Number of summarize calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts of every batch received, in call order
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummarizerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(turns.iter().map(|t| t.text().to_string()).collect());
        }

        match &self.script {
            Script::Always(text) => Ok(text.clone()),
            Script::Fail => Err(SummarizerError::ApiError("scripted failure".to_string())),
            Script::Sequence(outcomes) => match outcomes.get(call) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(SummarizerError::ApiError(e.clone())),
                None => Err(SummarizerError::Unavailable("script exhausted".to_string())),
            },
            Script::Hang => std::future::pending().await,
        }
    }

    async fn is_available(&self) -> bool {
        !matches!(self.script, Script::Fail)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Memory priced by word count with the given summarizer
pub fn word_count_memory(
    l1_capacity: usize,
    l2_capacity: usize,
    compression_threshold: usize,
    summarizer: Arc<dyn Summarizer>,
) -> TieredMemory {
    TieredMemory::with_parts(
        MemoryConfig::new(l1_capacity, l2_capacity, compression_threshold),
        Arc::new(WordCounter),
        summarizer,
    )
    .expect("test capacities are non-zero")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::Role;

    #[tokio::test]
    async fn scripted_sequence_replays_in_order() {
        let summarizer = ScriptedSummarizer::sequence(vec![
            Ok("first".to_string()),
            Err("boom".to_string()),
        ]);
        let turns = vec![Turn::new(Role::Primary, "x", 1)];

        assert_eq!(summarizer.summarize(&turns).await.unwrap(), "first");
        assert!(summarizer.summarize(&turns).await.is_err());
        assert!(summarizer.summarize(&turns).await.is_err());
        assert_eq!(summarizer.calls(), 3);
        assert_eq!(summarizer.batches().len(), 3);
    }
}
