//! In-memory store used by the service and its tests.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use uuid::Uuid;

use revision_core::{PerformanceSnapshot, RevisionItem};

use super::{RevisionStore, StoreError};

/// Snapshots retained per (learner, item); oldest evicted first.
pub const SNAPSHOT_CAP: usize = 100;

/// Map-backed [`RevisionStore`]. Nothing here blocks: the locks guard pure
/// in-memory maps and every operation is O(items of one learner) at worst.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<(Uuid, Uuid), RevisionItem>>,
    snapshots: RwLock<HashMap<(Uuid, Uuid), VecDeque<PerformanceSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevisionStore for MemoryStore {
    fn get_item(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<RevisionItem>, StoreError> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(&(learner_id, item_id)).cloned())
    }

    fn put_item(&self, item: RevisionItem) -> Result<(), StoreError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert((item.owner_id, item.item_id), item);
        Ok(())
    }

    fn list_items(&self, learner_id: Uuid) -> Result<Vec<RevisionItem>, StoreError> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        Ok(items
            .iter()
            .filter(|((owner, _), _)| *owner == learner_id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn append_snapshot(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
        snapshot: PerformanceSnapshot,
    ) -> Result<(), StoreError> {
        let mut logs = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        let log = logs.entry((learner_id, item_id)).or_default();
        log.push_back(snapshot);
        while log.len() > SNAPSHOT_CAP {
            log.pop_front();
        }
        Ok(())
    }

    fn recent_snapshots(
        &self,
        learner_id: Uuid,
        item_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PerformanceSnapshot>, StoreError> {
        let logs = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let log = match logs.get(&(learner_id, item_id)) {
            Some(log) => log,
            None => return Ok(Vec::new()),
        };
        let start = log.len().saturating_sub(limit);
        Ok(log.iter().skip(start).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use revision_core::{ContentType, DifficultyTier, Rating, ReviewEvent};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn item(owner: Uuid) -> RevisionItem {
        RevisionItem::new(
            owner,
            Uuid::new_v4(),
            ContentType::Fact,
            "geography",
            "capitals",
            "Capital of Kenya",
            now(),
        )
    }

    fn snapshot(accuracy_rating: Rating) -> PerformanceSnapshot {
        let event = ReviewEvent {
            rating: accuracy_rating,
            confidence: 3,
            time_spent_seconds: 20,
            hints_used: 0,
        };
        PerformanceSnapshot::from_event(&event, DifficultyTier::Medium, 0, "test", now())
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let it = item(owner);
        store.put_item(it.clone()).unwrap();

        let fetched = store.get_item(owner, it.item_id).unwrap().unwrap();
        assert_eq!(fetched.item_id, it.item_id);
        assert!(store.get_item(Uuid::new_v4(), it.item_id).unwrap().is_none());
    }

    #[test]
    fn list_is_scoped_to_learner() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.put_item(item(alice)).unwrap();
        store.put_item(item(alice)).unwrap();
        store.put_item(item(bob)).unwrap();

        assert_eq!(store.list_items(alice).unwrap().len(), 2);
        assert_eq!(store.list_items(bob).unwrap().len(), 1);
        assert!(store.list_items(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn snapshot_log_caps_and_evicts_oldest() {
        let store = MemoryStore::new();
        let learner = Uuid::new_v4();
        let item_id = Uuid::new_v4();

        // One Again snapshot, then enough Good ones to push it out.
        store
            .append_snapshot(learner, item_id, snapshot(Rating::Again))
            .unwrap();
        for _ in 0..SNAPSHOT_CAP {
            store
                .append_snapshot(learner, item_id, snapshot(Rating::Good))
                .unwrap();
        }

        let all = store
            .recent_snapshots(learner, item_id, SNAPSHOT_CAP * 2)
            .unwrap();
        assert_eq!(all.len(), SNAPSHOT_CAP);
        assert!(all.iter().all(|s| s.accuracy == 80.0));
    }

    #[test]
    fn recent_snapshots_returns_tail_oldest_first() {
        let store = MemoryStore::new();
        let learner = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        store
            .append_snapshot(learner, item_id, snapshot(Rating::Again))
            .unwrap();
        store
            .append_snapshot(learner, item_id, snapshot(Rating::Good))
            .unwrap();
        store
            .append_snapshot(learner, item_id, snapshot(Rating::Easy))
            .unwrap();

        let tail = store.recent_snapshots(learner, item_id, 2).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].accuracy, 80.0);
        assert_eq!(tail[1].accuracy, 95.0);
    }
}
