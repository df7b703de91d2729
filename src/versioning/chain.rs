//! SnapshotChain - ordered version history of one entity
//!
//! Snapshots sit in sequence order with no gaps, so the snapshot for
//! sequence `n` is always at index `n`. The chain enforces that on append:
//! an existing sequence is a conflict, a skipped one is a gap.

use super::errors::{StoreError, StoreResult};
use super::{VersionSeq, VersionSnapshot};
use crate::entity::EntityId;

/// The complete version history of a single entity.
#[derive(Clone, Debug)]
pub struct SnapshotChain {
    entity_id: EntityId,
    snapshots: Vec<VersionSnapshot>,
}

impl SnapshotChain {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            snapshots: Vec::new(),
        }
    }

    #[inline]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[inline]
    pub fn snapshots(&self) -> &[VersionSnapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&VersionSnapshot> {
        self.snapshots.last()
    }

    pub fn get(&self, sequence: VersionSeq) -> Option<&VersionSnapshot> {
        usize::try_from(sequence.value())
            .ok()
            .and_then(|idx| self.snapshots.get(idx))
    }

    /// The only sequence the chain will accept next.
    pub fn next_sequence(&self) -> VersionSeq {
        VersionSeq::after(self.latest().map(|s| s.sequence()))
    }

    /// Checks that `snapshot` can be appended without a conflict or gap.
    pub fn check_append(&self, snapshot: &VersionSnapshot) -> StoreResult<()> {
        let expected = self.next_sequence();
        let found = snapshot.sequence();

        if found < expected {
            return Err(StoreError::SequenceConflict {
                entity_id: self.entity_id.clone(),
                sequence: found,
            });
        }
        if found > expected {
            return Err(StoreError::SequenceGap {
                entity_id: self.entity_id.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Appends after `check_append`.
    pub fn push(&mut self, snapshot: VersionSnapshot) -> StoreResult<()> {
        self.check_append(&snapshot)?;
        self.snapshots.push(snapshot);
        Ok(())
    }
}
