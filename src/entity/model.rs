//! Entity - the mutable record being versioned
//!
//! An entity is an id plus an ordered map of field name to JSON value.
//! Identity references (creator, author) are stored as ordinary fields
//! (`creator_id`, `author_id`, ...) and interpreted through reference slots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Ordered field map. Ordering keeps snapshots and journal bodies deterministic.
pub type FieldMap = BTreeMap<String, Value>;

/// Opaque entity key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an id from an existing key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A versioned record.
///
/// The id is fixed at construction; fields are freely mutable. Whether a
/// mutation is legal (e.g. touching the creator reference) is decided by the
/// versioner, not by the entity itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    fields: FieldMap,
}

impl Entity {
    /// Creates an entity with no fields.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }

    /// Creates an entity with an initial field map.
    pub fn with_fields(id: EntityId, fields: FieldMap) -> Self {
        Self { id, fields }
    }

    /// Builder-style field setter.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    #[inline]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Returns a field value, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Merges `changes` into the field map; later values win.
    pub fn merge(&mut self, changes: FieldMap) {
        self.fields.extend(changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_builder() {
        let entity = Entity::new(EntityId::new("page-1"))
            .field("name", "A")
            .field("creator_id", 7);

        assert_eq!(entity.id().as_str(), "page-1");
        assert_eq!(entity.get("name"), Some(&json!("A")));
        assert_eq!(entity.get("creator_id"), Some(&json!(7)));
        assert_eq!(entity.get("missing"), None);
    }

    #[test]
    fn test_merge_overwrites_existing() {
        let mut entity = Entity::new(EntityId::new("p")).field("name", "A");
        let mut changes = FieldMap::new();
        changes.insert("name".to_string(), json!("B"));
        changes.insert("body".to_string(), json!("text"));

        entity.merge(changes);

        assert_eq!(entity.get("name"), Some(&json!("B")));
        assert_eq!(entity.fields().len(), 2);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&EntityId::new("e1")).unwrap();
        assert_eq!(json, "\"e1\"");
    }
}
