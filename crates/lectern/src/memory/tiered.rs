//! Three-tier conversation memory
//!
//! L1 holds raw turns, L2 holds summaries of folded L1 batches, and L3 is
//! an append-only index of student questions extracted when summaries are
//! evicted. `total_tokens` tracks the cost of L1 plus L2; L3 is free.
//!
//! Compression runs inline in [`TieredMemory::add`] whenever the running
//! total exceeds the configured threshold, and `add` waits for the
//! summarizer before returning. The batch being folded stays in L1 until
//! its summary text is ready, so a dropped `add` future never loses turns;
//! the next `add` resumes the pass. Each summary is bounded by
//! `summary_timeout_ms`; a timeout is treated like any summarizer error.

use std::ops::AddAssign;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Config, MemoryConfig};
use crate::error::Result;
use crate::memory::context::{AssembledContext, ContextAssembler};
use crate::memory::question::is_indexable_question;
use crate::memory::types::{MemoryStats, QuestionIndexEntry, Role, SummaryBlock, Turn};
use crate::summarizer::{self, LocalSummarizer, Summarizer, fallback_summary};
use crate::token::{self, TokenCounter, count_messages};

/// What one or more compression passes did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompressionReport {
    /// Compression passes run
    pub passes: usize,
    /// L1 batches folded into new summaries
    pub batches_folded: usize,
    /// Folds that used the local fallback text
    pub fallbacks_used: usize,
    /// Summaries evicted from L2
    pub summaries_evicted: usize,
    /// Entries appended to the question index
    pub questions_indexed: usize,
}

impl AddAssign for CompressionReport {
    fn add_assign(&mut self, other: Self) {
        self.passes += other.passes;
        self.batches_folded += other.batches_folded;
        self.fallbacks_used += other.fallbacks_used;
        self.summaries_evicted += other.summaries_evicted;
        self.questions_indexed += other.questions_indexed;
    }
}

/// Session-scoped tiered memory
pub struct TieredMemory {
    config: MemoryConfig,
    counter: Arc<dyn TokenCounter>,
    summarizer: Arc<dyn Summarizer>,
    l1: Vec<Turn>,
    l2: Vec<SummaryBlock>,
    l3: Vec<QuestionIndexEntry>,
    total_tokens: usize,
    total_turns: u64,
    compression: CompressionReport,
}

impl TieredMemory {
    /// Build a memory from full configuration
    ///
    /// Fails on zero capacities or when a remote summarizer is selected but
    /// its API key is missing.
    pub fn new(config: &Config) -> Result<Self> {
        let counter = token::from_config(&config.tokenizer)?;
        let summarizer = summarizer::from_config(&config.summarizer, &config.memory)?;
        Self::with_parts(config.memory.clone(), counter, summarizer)
    }

    /// Build a memory from explicit collaborators
    pub fn with_parts(
        config: MemoryConfig,
        counter: Arc<dyn TokenCounter>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        config.validate()?;
        debug!(
            "TieredMemory created: l1_capacity={}, l2_capacity={}, threshold={}, counter={}, summarizer={}",
            config.l1_capacity,
            config.l2_capacity,
            config.compression_threshold,
            counter.name(),
            summarizer.name()
        );
        Ok(Self {
            config,
            counter,
            summarizer,
            l1: Vec::new(),
            l2: Vec::new(),
            l3: Vec::new(),
            total_tokens: 0,
            total_turns: 0,
            compression: CompressionReport::default(),
        })
    }

    /// Build a memory that only ever uses the local summary
    pub fn local(config: MemoryConfig, counter: Arc<dyn TokenCounter>) -> Result<Self> {
        let summarizer = Arc::new(LocalSummarizer::new(config.summary_char_cap));
        Self::with_parts(config, counter, summarizer)
    }

    /// Record a turn, compressing if the token budget is exceeded
    ///
    /// Blank text is ignored and returns `false`. Never fails: summarizer
    /// errors are replaced by the local fallback summary.
    pub async fn add(&mut self, role: Role, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let token_cost = self.counter.count(text);
        self.l1.push(Turn::new(role, text, token_cost));
        self.total_tokens += token_cost;
        self.total_turns += 1;

        if self.total_tokens > self.config.compression_threshold {
            let report = self.compress().await;
            debug!(
                "Compression pass: folded={}, fallbacks={}, evicted={}, indexed={}, total_tokens={}",
                report.batches_folded,
                report.fallbacks_used,
                report.summaries_evicted,
                report.questions_indexed,
                self.total_tokens
            );
            self.compression += report;
        }

        true
    }

    /// Fold L1 overflow into L2, then evict L2 overflow into L3
    async fn compress(&mut self) -> CompressionReport {
        let mut report = CompressionReport {
            passes: 1,
            ..Default::default()
        };
        let batch_size = self.config.l1_capacity;

        while self.l1.len() > batch_size {
            let (summary_text, used_fallback) = self.summarize_batch(&self.l1[..batch_size]).await;
            let summary_cost = self.counter.count(&summary_text);

            let batch_cost: usize = self.l1.drain(..batch_size).map(|t| t.token_cost()).sum();
            self.l2.push(SummaryBlock::new(batch_size, summary_text, summary_cost));
            self.total_tokens = self.total_tokens - batch_cost + summary_cost;

            debug!(
                "Folded {} turns ({} tokens) into a {}-token summary",
                batch_size, batch_cost, summary_cost
            );
            report.batches_folded += 1;
            if used_fallback {
                report.fallbacks_used += 1;
            }
        }

        while self.l2.len() > self.config.l2_capacity {
            let evicted = self.l2.remove(0);

            // Suspect but kept: this scans the turns resident in L1 now, not
            // the turns the evicted summary was built from.
            let before = self.l3.len();
            let particles = &self.config.question_particles;
            self.l3.extend(
                self.l1
                    .iter()
                    .filter(|t| is_indexable_question(t, particles))
                    .map(QuestionIndexEntry::from),
            );

            self.total_tokens -= evicted.token_cost();
            report.summaries_evicted += 1;
            report.questions_indexed += self.l3.len() - before;
            debug!(
                "Evicted summary of {} turns ({} tokens), indexed {} questions",
                evicted.original_turn_count(),
                evicted.token_cost(),
                self.l3.len() - before
            );
        }

        report
    }

    /// Ask the summarizer for text, falling back locally on error or timeout
    async fn summarize_batch(&self, batch: &[Turn]) -> (String, bool) {
        let fallback = || (fallback_summary(batch, self.config.summary_char_cap), true);

        if !self.summarizer.is_available().await {
            debug!(
                "{} summarizer unavailable, using local summary",
                self.summarizer.name()
            );
            return fallback();
        }

        let timeout = self.config.summary_timeout();
        match tokio::time::timeout(timeout, self.summarizer.summarize(batch)).await {
            Ok(Ok(text)) => (text, false),
            Ok(Err(e)) => {
                warn!(
                    "{} summarizer failed, using local summary: {}",
                    self.summarizer.name(),
                    e
                );
                fallback()
            }
            Err(_) => {
                warn!(
                    "{} summarizer timed out after {:?}, using local summary",
                    self.summarizer.name(),
                    timeout
                );
                fallback()
            }
        }
    }

    /// Context string for reply generation, summaries first, newest turn last
    ///
    /// With a budget, the included token sum never exceeds `max_tokens`.
    pub fn get_context(&self, max_tokens: Option<usize>) -> String {
        self.assemble_context(max_tokens).text
    }

    /// Context plus accounting of what was included and dropped
    pub fn assemble_context(&self, max_tokens: Option<usize>) -> AssembledContext {
        ContextAssembler::new(max_tokens).assemble(&self.l1, &self.l2)
    }

    /// Cost of sending the assembled context as one system message
    ///
    /// Adds chat framing overhead on top of the context's own token cost.
    pub fn prompt_tokens(&self, max_tokens: Option<usize>) -> usize {
        let context = self.get_context(max_tokens);
        count_messages(self.counter.as_ref(), [("system", context.as_str())])
    }

    /// Student turns still in L1, newest first, at most `limit`
    pub fn recent_questions(&self, limit: usize) -> Vec<String> {
        self.l1
            .iter()
            .rev()
            .filter(|t| is_student(t.role()))
            .take(limit)
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Read-only snapshot of sizes and costs
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_turns: self.total_turns,
            total_tokens: self.total_tokens,
            l1_size: self.l1.len(),
            l2_size: self.l2.len(),
            l3_size: self.l3.len(),
            l1_tokens: self.l1.iter().map(Turn::token_cost).sum(),
            l2_tokens: self.l2.iter().map(SummaryBlock::token_cost).sum(),
        }
    }

    /// Compression activity since creation or the last `clear`
    pub fn compression_totals(&self) -> CompressionReport {
        self.compression
    }

    /// Empty every tier and reset the counters
    pub fn clear(&mut self) {
        self.l1.clear();
        self.l2.clear();
        self.l3.clear();
        self.total_tokens = 0;
        self.total_turns = 0;
        self.compression = CompressionReport::default();
    }

    /// Raw turns, oldest first
    pub fn l1_turns(&self) -> &[Turn] {
        &self.l1
    }

    /// Summaries, oldest first
    pub fn l2_summaries(&self) -> &[SummaryBlock] {
        &self.l2
    }

    /// Question index in append order
    pub fn question_index(&self) -> &[QuestionIndexEntry] {
        &self.l3
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.l1.is_empty() && self.l2.is_empty() && self.l3.is_empty()
    }
}

fn is_student(role: Role) -> bool {
    match role {
        Role::Secondary => true,
        Role::Primary | Role::Unknown => false,
    }
}

impl std::fmt::Debug for TieredMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredMemory")
            .field("config", &self.config)
            .field("counter", &self.counter.name())
            .field("summarizer", &self.summarizer.name())
            .field("l1", &self.l1.len())
            .field("l2", &self.l2.len())
            .field("l3", &self.l3.len())
            .field("total_tokens", &self.total_tokens)
            .field("total_turns", &self.total_turns)
            .field("compression", &self.compression)
            .finish()
    }
}
