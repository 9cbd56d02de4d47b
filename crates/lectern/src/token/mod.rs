//! Token counting for turns and summaries
//!
//! Costs only need to be deterministic and monotonic, not exact, so the
//! default counters are cheap heuristics. [`BpeCounter`] gives exact
//! cl100k_base counts when budgets must match a real model. Anything that
//! implements [`TokenCounter`] can be plugged into a memory instead.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::config::{TokenizerConfig, TokenizerStrategy};
use crate::error::{LecternError, Result};

/// Per-message overhead for role name and delimiters in chat wire formats
const MESSAGE_OVERHEAD: usize = 4;

/// Tokens that prime every reply
const REPLY_PRIMING: usize = 2;

/// Maps text to an integer cost
///
/// Implementations must be deterministic for identical input and free of
/// side effects.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in `text`
    fn count(&self, text: &str) -> usize;

    /// Counter name for logging
    fn name(&self) -> &'static str;
}

/// CJK-aware estimate: ~1.5 ideographs per token, ~4 other chars per token
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatingCounter;

impl TokenCounter for EstimatingCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let cjk = text.chars().filter(|c| is_cjk_ideograph(*c)).count();
        let other = text.chars().count() - cjk;
        // Integer form of floor(cjk / 1.5 + other / 4)
        (cjk * 8 + other * 3) / 12
    }

    fn name(&self) -> &'static str {
        "estimate"
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Whitespace-separated word count
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &'static str {
        "words"
    }
}

/// One token per four bytes, rounded up
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    fn name(&self) -> &'static str {
        "chars"
    }
}

/// Byte-pair encoding with the cl100k_base vocabulary
pub struct BpeCounter {
    bpe: CoreBPE,
}

impl BpeCounter {
    /// Load the embedded cl100k_base ranks
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| LecternError::Config(format!("Failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for BpeCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &'static str {
        "bpe"
    }
}

impl std::fmt::Debug for BpeCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeCounter").field("vocab", &"cl100k_base").finish()
    }
}

/// Build the counter selected in config
pub fn from_config(config: &TokenizerConfig) -> Result<Arc<dyn TokenCounter>> {
    let counter: Arc<dyn TokenCounter> = match config.strategy {
        TokenizerStrategy::Estimate => Arc::new(EstimatingCounter),
        TokenizerStrategy::Words => Arc::new(WordCounter),
        TokenizerStrategy::Chars => Arc::new(CharCounter),
        TokenizerStrategy::Bpe => Arc::new(BpeCounter::cl100k()?),
    };
    Ok(counter)
}

/// Cost of a chat exchange: per-message overhead plus reply priming
pub fn count_messages<'a, I>(counter: &dyn TokenCounter, messages: I) -> usize
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let body: usize = messages
        .into_iter()
        .map(|(role, content)| MESSAGE_OVERHEAD + counter.count(role) + counter.count(content))
        .sum();
    body + REPLY_PRIMING
}
