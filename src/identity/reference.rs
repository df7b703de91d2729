//! Tagged identity references
//!
//! A reference slot names the entity field holding the identity id and
//! where the type tag comes from:
//!
//! - `TypeSource::Fixed("Author")` - the slot always points at one type
//! - `TypeSource::Field("author_type")` - the type is stored per entity
//!
//! A null or absent id field means the slot is empty.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ResolveError, ResolveResult};
use crate::entity::{Entity, FieldMap};

/// Non-owning reference to an identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRef {
    pub type_tag: String,
    pub id: String,
}

impl IdentityRef {
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_tag, self.id)
    }
}

/// A resolved identity record, owned by the identity store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub type_tag: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub attributes: FieldMap,
}

impl Identity {
    pub fn new(type_tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: id.into(),
            display_name: None,
            attributes: FieldMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The reference that resolves to this identity.
    pub fn reference(&self) -> IdentityRef {
        IdentityRef::new(self.type_tag.clone(), self.id.clone())
    }
}

/// The role a reference plays on an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Who created the entity. Immutable after creation.
    Creator,
    /// Who last authored the entity. Recorded on every snapshot.
    Author,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Creator => "creator",
            ReferenceKind::Author => "author",
        }
    }
}

/// Where a reference's type tag comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSource {
    Fixed(String),
    Field(String),
}

/// Declares how one reference kind is stored on an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSlot {
    pub kind: ReferenceKind,
    pub id_field: String,
    pub type_source: TypeSource,
}

impl ReferenceSlot {
    /// Slot whose target type is fixed.
    pub fn fixed(kind: ReferenceKind, id_field: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            kind,
            id_field: id_field.into(),
            type_source: TypeSource::Fixed(type_tag.into()),
        }
    }

    /// Slot whose target type is read from another field.
    pub fn polymorphic(
        kind: ReferenceKind,
        id_field: impl Into<String>,
        type_field: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id_field: id_field.into(),
            type_source: TypeSource::Field(type_field.into()),
        }
    }

    /// Fields on the entity that make up this reference.
    pub fn fields(&self) -> Vec<&str> {
        match &self.type_source {
            TypeSource::Fixed(_) => vec![self.id_field.as_str()],
            TypeSource::Field(type_field) => vec![self.id_field.as_str(), type_field.as_str()],
        }
    }

    /// Reads this slot's reference from an entity.
    ///
    /// Returns `Ok(None)` when the id field is absent or null.
    pub fn read(&self, entity: &Entity) -> ResolveResult<Option<IdentityRef>> {
        let id = match entity.get(&self.id_field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ResolveError::Malformed {
                    field: self.id_field.clone(),
                    reason: format!("expected string or number id, found {}", other),
                })
            }
        };

        let type_tag = match &self.type_source {
            TypeSource::Fixed(tag) => tag.clone(),
            TypeSource::Field(type_field) => match entity.get(type_field) {
                Some(Value::String(tag)) if !tag.is_empty() => tag.clone(),
                _ => {
                    return Err(ResolveError::Malformed {
                        field: type_field.clone(),
                        reason: "polymorphic reference has an id but no type tag".to_string(),
                    })
                }
            },
        };

        Ok(Some(IdentityRef { type_tag, id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    fn page() -> Entity {
        Entity::new(EntityId::new("page-1"))
    }

    #[test]
    fn test_fixed_slot_reads_numeric_id() {
        let slot = ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "Author");
        let entity = page().field("author_id", 7);

        let reference = slot.read(&entity).unwrap().unwrap();
        assert_eq!(reference, IdentityRef::new("Author", "7"));
    }

    #[test]
    fn test_null_or_missing_id_is_empty_slot() {
        let slot = ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "Author");
        assert_eq!(slot.read(&page()).unwrap(), None);
        assert_eq!(slot.read(&page().field("author_id", Value::Null)).unwrap(), None);
    }

    #[test]
    fn test_polymorphic_slot_reads_type_field() {
        let slot = ReferenceSlot::polymorphic(ReferenceKind::Creator, "creator_id", "creator_type");
        let entity = page().field("creator_id", "u-1").field("creator_type", "Admin");

        let reference = slot.read(&entity).unwrap().unwrap();
        assert_eq!(reference.type_tag, "Admin");
        assert_eq!(reference.id, "u-1");
        assert_eq!(slot.fields(), vec!["creator_id", "creator_type"]);
    }

    #[test]
    fn test_polymorphic_slot_without_type_is_malformed() {
        let slot = ReferenceSlot::polymorphic(ReferenceKind::Creator, "creator_id", "creator_type");
        let entity = page().field("creator_id", 3);

        assert!(matches!(
            slot.read(&entity),
            Err(ResolveError::Malformed { field, .. }) if field == "creator_type"
        ));
    }

    #[test]
    fn test_non_scalar_id_is_malformed() {
        let slot = ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "Author");
        let entity = page().field("author_id", true);
        assert!(matches!(slot.read(&entity), Err(ResolveError::Malformed { .. })));
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(IdentityRef::new("Author", "9").to_string(), "Author#9");
    }
}
