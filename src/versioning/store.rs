//! Version Store
//!
//! Append-only, per-entity ordered log of snapshots:
//! - `append` rejects an existing (entity, sequence) with `SequenceConflict`
//!   and a skipped sequence with `SequenceGap`
//! - existing snapshots are never rewritten or removed
//! - reads return owned copies, so re-querying yields a fresh consistent view

use std::collections::HashMap;
use std::sync::RwLock;

use super::chain::SnapshotChain;
use super::errors::{StoreError, StoreResult};
use super::{VersionSeq, VersionSnapshot};
use crate::entity::EntityId;

/// Snapshot persistence.
pub trait VersionStore: Send + Sync {
    /// Append a snapshot. All-or-nothing.
    fn append(&self, snapshot: &VersionSnapshot) -> StoreResult<()>;

    /// The highest-sequence snapshot of an entity.
    fn latest(&self, entity_id: &EntityId) -> StoreResult<Option<VersionSnapshot>>;

    /// All snapshots of an entity, ascending by sequence. Empty if untracked.
    fn history(&self, entity_id: &EntityId) -> StoreResult<Vec<VersionSnapshot>>;

    /// One specific version.
    fn get(&self, entity_id: &EntityId, sequence: VersionSeq) -> StoreResult<Option<VersionSnapshot>>;

    /// Ids of every entity with at least one snapshot, sorted.
    fn entities(&self) -> StoreResult<Vec<EntityId>>;
}

/// In-memory version store
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    chains: RwLock<HashMap<EntityId, SnapshotChain>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionStore for MemoryVersionStore {
    fn append(&self, snapshot: &VersionSnapshot) -> StoreResult<()> {
        let mut chains = self.chains.write().map_err(|_| StoreError::Poisoned)?;
        match chains.get_mut(snapshot.entity_id()) {
            Some(chain) => chain.push(snapshot.clone()),
            None => {
                // Rejected first snapshots must not leave an empty chain behind
                let mut chain = SnapshotChain::new(snapshot.entity_id().clone());
                chain.push(snapshot.clone())?;
                chains.insert(snapshot.entity_id().clone(), chain);
                Ok(())
            }
        }
    }

    fn latest(&self, entity_id: &EntityId) -> StoreResult<Option<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains.get(entity_id).and_then(|c| c.latest()).cloned())
    }

    fn history(&self, entity_id: &EntityId) -> StoreResult<Vec<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains
            .get(entity_id)
            .map(|c| c.snapshots().to_vec())
            .unwrap_or_default())
    }

    fn get(&self, entity_id: &EntityId, sequence: VersionSeq) -> StoreResult<Option<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains.get(entity_id).and_then(|c| c.get(sequence)).cloned())
    }

    fn entities(&self) -> StoreResult<Vec<EntityId>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<EntityId> = chains.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldMap;
    use chrono::Utc;

    fn snap(entity: &str, seq: u64) -> VersionSnapshot {
        VersionSnapshot::new(
            EntityId::new(entity),
            VersionSeq::new(seq),
            FieldMap::new(),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_latest_and_history() {
        let store = MemoryVersionStore::new();
        let id = EntityId::new("e1");
        assert!(store.latest(&id).unwrap().is_none());
        assert!(store.history(&id).unwrap().is_empty());

        store.append(&snap("e1", 0)).unwrap();
        store.append(&snap("e1", 1)).unwrap();

        assert_eq!(store.latest(&id).unwrap().unwrap().sequence(), VersionSeq::new(1));
        let sequences: Vec<u64> = store
            .history(&id)
            .unwrap()
            .iter()
            .map(|s| s.sequence().value())
            .collect();
        assert_eq!(sequences, vec![0, 1]);
        assert!(store.get(&id, VersionSeq::new(0)).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_append_conflicts_and_leaves_store_untouched() {
        let store = MemoryVersionStore::new();
        store.append(&snap("e1", 0)).unwrap();

        let result = store.append(&snap("e1", 0));
        assert!(matches!(result, Err(StoreError::SequenceConflict { .. })));
        assert_eq!(store.history(&EntityId::new("e1")).unwrap().len(), 1);
    }

    #[test]
    fn test_first_snapshot_must_be_zero() {
        let store = MemoryVersionStore::new();
        let result = store.append(&snap("e1", 1));
        assert!(matches!(result, Err(StoreError::SequenceGap { .. })));
        assert!(store.entities().unwrap().is_empty());
    }

    #[test]
    fn test_entities_are_independent_and_sorted() {
        let store = MemoryVersionStore::new();
        store.append(&snap("b", 0)).unwrap();
        store.append(&snap("a", 0)).unwrap();
        store.append(&snap("a", 1)).unwrap();

        assert_eq!(
            store.entities().unwrap(),
            vec![EntityId::new("a"), EntityId::new("b")]
        );
        assert_eq!(store.history(&EntityId::new("b")).unwrap().len(), 1);
    }
}
