//! Context assembly under a token budget
//!
//! Recent turns get first claim on the budget, walked newest to oldest and
//! stopping at the first turn that would overflow it. Summaries are
//! considered only while budget remains. The output reads oldest to
//! newest: summaries, then turns.

use serde::Serialize;

use crate::memory::types::{SummaryBlock, Turn};

const SUMMARY_LABEL: &str = "[Summary]";

/// Assembled context with accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssembledContext {
    /// Newline-joined context lines
    pub text: String,
    /// Sum of token costs of the included items
    pub tokens_used: usize,
    /// Budget the assembly ran under, `None` for unbounded
    pub budget: Option<usize>,
    pub turns_included: usize,
    pub turns_dropped: usize,
    pub summaries_included: usize,
    pub summaries_dropped: usize,
}

/// Budgeted walk over L1 and L2
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_tokens: Option<usize>,
}

impl ContextAssembler {
    pub fn new(max_tokens: Option<usize>) -> Self {
        Self { max_tokens }
    }

    /// Whether adding `cost` to `used` would overflow the budget
    fn overflows(&self, used: usize, cost: usize) -> bool {
        self.max_tokens.is_some_and(|max| used + cost > max)
    }

    fn has_room(&self, used: usize) -> bool {
        self.max_tokens.is_none_or(|max| used < max)
    }

    pub fn assemble(&self, turns: &[Turn], summaries: &[SummaryBlock]) -> AssembledContext {
        let mut used = 0;

        let mut turn_lines = Vec::new();
        for turn in turns.iter().rev() {
            if self.overflows(used, turn.token_cost()) {
                break;
            }
            turn_lines.push(format!("{}: {}", turn.role().label(), turn.text()));
            used += turn.token_cost();
        }

        let mut summary_lines = Vec::new();
        if self.has_room(used) {
            for summary in summaries.iter().rev() {
                if self.overflows(used, summary.token_cost()) {
                    break;
                }
                summary_lines.push(format!("{SUMMARY_LABEL}: {}", summary.summary_text()));
                used += summary.token_cost();
            }
        }

        let turns_included = turn_lines.len();
        let summaries_included = summary_lines.len();

        let text = summary_lines
            .into_iter()
            .rev()
            .chain(turn_lines.into_iter().rev())
            .collect::<Vec<_>>()
            .join("\n");

        AssembledContext {
            text,
            tokens_used: used,
            budget: self.max_tokens,
            turns_included,
            turns_dropped: turns.len() - turns_included,
            summaries_included,
            summaries_dropped: summaries.len() - summaries_included,
        }
    }
}
