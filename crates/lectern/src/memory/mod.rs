//! Tiered conversation memory
//!
//! - [`TieredMemory`]: the L1/L2/L3 store and its compression pass
//! - [`ContextAssembler`]: budgeted context rendering
//! - [`SessionMemory`]: shared, lockable handle for one classroom session

pub mod context;
pub mod question;
pub mod session;
pub mod tiered;
pub mod types;

pub use context::{AssembledContext, ContextAssembler};
pub use question::{is_indexable_question, is_question_like};
pub use session::SessionMemory;
pub use tiered::{CompressionReport, TieredMemory};
pub use types::{MemoryStats, QuestionIndexEntry, Role, SummaryBlock, Turn};
