//! Per-entity critical sections
//!
//! Mutations of one entity are serialized; different entities proceed in
//! parallel. The table hands out one `Arc<Mutex<()>>` per entity id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::errors::{VersioningError, VersioningResult};
use crate::entity::EntityId;

#[derive(Debug, Default)]
pub struct EntityLocks {
    table: Mutex<HashMap<EntityId, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `id`, created on first use.
    pub fn handle(&self, id: &EntityId) -> VersioningResult<Arc<Mutex<()>>> {
        let mut table = self.table.lock().map_err(|_| VersioningError::LockPoisoned)?;
        Ok(Arc::clone(table.entry(id.clone()).or_default()))
    }

    /// Drops the table entry for `id` if nobody else holds its handle.
    pub fn release(&self, id: &EntityId) {
        if let Ok(mut table) = self.table.lock() {
            if table.get(id).map(|h| Arc::strong_count(h) == 1).unwrap_or(false) {
                table.remove(id);
            }
        }
    }

    /// Number of entities with a live lock entry.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
