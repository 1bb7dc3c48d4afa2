//! Storage collaborator interface.
//!
//! The scheduling core never talks to storage directly; everything durable
//! goes through [`RevisionStore`], keyed by (learner, item). The service
//! ships an in-memory implementation; a database-backed one plugs in
//! behind the same trait.

pub mod memory;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

use revision_core::{PerformanceSnapshot, RevisionItem};

pub use memory::MemoryStore;

/// Storage failures, propagated to callers unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Durable store for revision items and their performance log.
pub trait RevisionStore: Send + Sync {
    fn get_item(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<RevisionItem>, StoreError>;

    /// Insert or replace one item, keyed by (owner, item).
    fn put_item(&self, item: RevisionItem) -> Result<(), StoreError>;

    fn list_items(&self, learner_id: Uuid) -> Result<Vec<RevisionItem>, StoreError>;

    /// Append one snapshot to the item's performance log. Implementations
    /// cap the log and evict oldest-first.
    fn append_snapshot(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
        snapshot: PerformanceSnapshot,
    ) -> Result<(), StoreError>;

    /// The most recent `limit` snapshots, oldest first.
    fn recent_snapshots(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PerformanceSnapshot>, StoreError>;
}

/// Per-item write locks. Reviews of the same item serialize on these so
/// concurrent submissions cannot race the read-compute-write cycle;
/// reviews of different items, and all reads, proceed in parallel.
#[derive(Default)]
pub struct ItemLocks {
    locks: Mutex<HashMap<(Uuid, Uuid), Arc<tokio::sync::Mutex<()>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding one (learner, item) pair.
    pub fn lock_for(&self, learner_id: Uuid, item_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry((learner_id, item_id))
            .or_default()
            .clone()
    }
}
