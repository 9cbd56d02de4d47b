//! Deterministic local summary
//!
//! Renders each turn as `Label: text`, truncating long texts, and joins the
//! pieces with ` | `. Never fails, so it doubles as the fallback for every
//! other summarizer.

use async_trait::async_trait;

use crate::memory::types::Turn;
use crate::summarizer::{Summarizer, SummarizerError};

const SEPARATOR: &str = " | ";
const ELLIPSIS: &str = "...";

/// Reduce turns to role-prefixed, truncated text
///
/// `char_cap` counts characters, not bytes, so CJK text is never split
/// inside a code point.
pub fn fallback_summary(turns: &[Turn], char_cap: usize) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role().label(), truncate_chars(turn.text(), char_cap)))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn truncate_chars(text: &str, char_cap: usize) -> String {
    match text.char_indices().nth(char_cap) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Summarizer backed by [`fallback_summary`]
#[derive(Debug, Clone)]
pub struct LocalSummarizer {
    char_cap: usize,
}

impl LocalSummarizer {
    pub fn new(char_cap: usize) -> Self {
        Self { char_cap }
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummarizerError> {
        Ok(fallback_summary(turns, self.char_cap))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
