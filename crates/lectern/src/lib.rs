//! Lectern - tiered conversation memory for live teaching assistants
//!
//! Keeps an ever-growing, role-tagged classroom dialogue under a fixed
//! token budget. Recent turns stay verbatim (L1), older turns are folded
//! into summaries (L2), and evicted summaries leave behind a sparse index
//! of student questions (L3).

pub mod config;
pub mod error;
pub mod export;
pub mod memory;
pub mod summarizer;
pub mod testing;
pub mod token;

pub use error::{LecternError, Result};
pub use export::{ExportFormat, Exporter};
pub use memory::{
    AssembledContext, CompressionReport, MemoryStats, QuestionIndexEntry, Role, SessionMemory,
    SummaryBlock, TieredMemory, Turn,
};
pub use summarizer::{Summarizer, SummarizerError};
pub use token::TokenCounter;
