//! Record store seam
//!
//! The versioner never owns entity persistence. It reads and commits through
//! this trait so that any persistence layer can sit underneath.

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::{RecordError, RecordResult};
use super::{Entity, EntityId};

/// Entity persistence used by the versioner.
pub trait RecordStore: Send + Sync {
    /// Fetch the current committed state of an entity.
    fn get(&self, id: &EntityId) -> RecordResult<Option<Entity>>;

    /// Insert a new entity. Fails with `AlreadyExists` if the id is taken.
    fn insert(&self, entity: &Entity) -> RecordResult<()>;

    /// Commit a new state for an existing entity. Fails with `NotFound`
    /// if the entity was deleted.
    fn commit(&self, entity: &Entity) -> RecordResult<()>;

    /// Delete an entity. Fails with `NotFound` if absent.
    fn delete(&self, id: &EntityId) -> RecordResult<()>;
}

/// In-memory record store for testing and embedding
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    entities: RwLock<HashMap<EntityId, Entity>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> RecordError {
    RecordError::Backend("Lock poisoned".to_string())
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, id: &EntityId) -> RecordResult<Option<Entity>> {
        let entities = self.entities.read().map_err(|_| poisoned())?;
        Ok(entities.get(id).cloned())
    }

    fn insert(&self, entity: &Entity) -> RecordResult<()> {
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        if entities.contains_key(entity.id()) {
            return Err(RecordError::AlreadyExists(entity.id().clone()));
        }
        entities.insert(entity.id().clone(), entity.clone());
        Ok(())
    }

    fn commit(&self, entity: &Entity) -> RecordResult<()> {
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        match entities.get_mut(entity.id()) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(())
            }
            None => Err(RecordError::NotFound(entity.id().clone())),
        }
    }

    fn delete(&self, id: &EntityId) -> RecordResult<()> {
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        entities
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RecordError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_record_store() {
        let store = InMemoryRecordStore::new();
        let id = EntityId::new("page-1");
        let entity = Entity::new(id.clone()).field("name", "A");

        store.insert(&entity).unwrap();
        assert_eq!(store.len(), 1);

        // Duplicate insert rejected
        assert!(matches!(
            store.insert(&entity),
            Err(RecordError::AlreadyExists(_))
        ));

        // Commit replaces state
        let updated = entity.clone().field("name", "B");
        store.commit(&updated).unwrap();
        let found = store.get(&id).unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("B")));

        // Delete
        store.delete(&id).unwrap();
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_after_delete_fails() {
        let store = InMemoryRecordStore::new();
        let entity = Entity::new(EntityId::new("gone"));
        store.insert(&entity).unwrap();
        store.delete(entity.id()).unwrap();

        assert!(matches!(store.commit(&entity), Err(RecordError::NotFound(_))));
        assert!(matches!(store.delete(entity.id()), Err(RecordError::NotFound(_))));
    }
}
