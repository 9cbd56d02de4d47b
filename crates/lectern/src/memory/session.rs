//! Session-scoped memory handle
//!
//! One [`SessionMemory`] per classroom session, created when the session
//! starts and torn down when it ends. Clones share the same tiers; every
//! operation takes the session lock, so adds are serialized and reads see
//! a consistent snapshot.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::memory::context::AssembledContext;
use crate::memory::tiered::TieredMemory;
use crate::memory::types::{MemoryStats, Role};

/// Shared handle to one session's tiered memory
#[derive(Clone)]
pub struct SessionMemory {
    id: Uuid,
    inner: Arc<Mutex<TieredMemory>>,
}

impl SessionMemory {
    /// Start a session around an existing memory
    pub fn new(memory: TieredMemory) -> Self {
        let id = Uuid::new_v4();
        info!("Session {} started: {:?}", id, memory);
        Self {
            id,
            inner: Arc::new(Mutex::new(memory)),
        }
    }

    /// Start a session with collaborators built from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(TieredMemory::new(config)?))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Record a turn; waits for any compression it triggers
    pub async fn add(&self, role: Role, text: &str) -> bool {
        self.inner.lock().await.add(role, text).await
    }

    pub async fn get_context(&self, max_tokens: Option<usize>) -> String {
        self.inner.lock().await.get_context(max_tokens)
    }

    pub async fn assemble_context(&self, max_tokens: Option<usize>) -> AssembledContext {
        self.inner.lock().await.assemble_context(max_tokens)
    }

    pub async fn recent_questions(&self, limit: usize) -> Vec<String> {
        self.inner.lock().await.recent_questions(limit)
    }

    pub async fn stats(&self) -> MemoryStats {
        self.inner.lock().await.stats()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
        info!("Session {} cleared", self.id);
    }

    /// Run `f` against the memory under the session lock
    pub async fn read<R>(&self, f: impl FnOnce(&TieredMemory) -> R) -> R {
        let memory = self.inner.lock().await;
        f(&memory)
    }

    /// End the session, returning its final stats
    ///
    /// Other clones still holding the handle see an emptied memory.
    pub async fn teardown(self) -> MemoryStats {
        let mut memory = self.inner.lock().await;
        let stats = memory.stats();
        memory.clear();
        info!(
            "Session {} ended: {} turns, {} tokens resident, {} questions indexed",
            self.id, stats.total_turns, stats.total_tokens, stats.l3_size
        );
        stats
    }
}

impl std::fmt::Debug for SessionMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMemory").field("id", &self.id).finish()
    }
}
