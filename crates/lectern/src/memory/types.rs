//! Memory types for the Lectern tiers
//!
//! Defines the records held by each tier: raw turns (L1), summary blocks
//! (L2) and question index entries (L3), plus the stats snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who spoke a turn
///
/// Classification happens upstream; turns arrive already tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The teacher
    Primary,
    /// A student
    Secondary,
    /// Speaker could not be classified
    Unknown,
}

impl Role {
    /// Convert role to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
            Role::Unknown => "unknown",
        }
    }

    /// Human-readable speaker label used in context and summaries
    pub fn label(&self) -> &'static str {
        match self {
            Role::Primary => "Teacher",
            Role::Secondary => "Student",
            Role::Unknown => "Unknown",
        }
    }

    /// Parse a role tag, accepting both the wire names and the classroom names
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "primary" | "teacher" => Some(Role::Primary),
            "secondary" | "student" => Some(Role::Secondary),
            "unknown" => Some(Role::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single utterance held verbatim in L1
///
/// Fields are private: a turn never changes after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
    token_cost: usize,
}

impl Turn {
    /// Create a turn stamped with the current time
    pub fn new(role: Role, text: impl Into<String>, token_cost: usize) -> Self {
        Self::at(role, text, token_cost, Utc::now())
    }

    /// Create a turn with an explicit timestamp
    pub fn at(
        role: Role,
        text: impl Into<String>,
        token_cost: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            role,
            text: text.into(),
            created_at,
            token_cost,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn token_cost(&self) -> usize {
        self.token_cost
    }
}

/// Lossy compression of a contiguous run of L1 turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    original_turn_count: usize,
    summary_text: String,
    token_cost: usize,
    created_at: DateTime<Utc>,
}

impl SummaryBlock {
    /// Create a summary block stamped with the current time
    pub fn new(original_turn_count: usize, summary_text: String, token_cost: usize) -> Self {
        Self {
            original_turn_count,
            summary_text,
            token_cost,
            created_at: Utc::now(),
        }
    }

    pub fn original_turn_count(&self) -> usize {
        self.original_turn_count
    }

    pub fn summary_text(&self) -> &str {
        &self.summary_text
    }

    pub fn token_cost(&self) -> usize {
        self.token_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A student question recorded in L3 when a summary is evicted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionIndexEntry {
    pub question_text: String,
    pub asked_at: DateTime<Utc>,
}

impl From<&Turn> for QuestionIndexEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            question_text: turn.text.clone(),
            asked_at: turn.created_at,
        }
    }
}

/// Read-only snapshot of a memory's size and cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Turns ever recorded since construction or the last clear
    pub total_turns: u64,
    /// Running cost of L1 plus L2
    pub total_tokens: usize,
    pub l1_size: usize,
    pub l2_size: usize,
    pub l3_size: usize,
    pub l1_tokens: usize,
    pub l2_tokens: usize,
}
