//! VersionSnapshot - immutable captured state of an entity
//!
//! A snapshot holds the versioned fields (exclusions already removed), the
//! author reference at capture time and the capture timestamp. Once built it
//! never changes; all fields are private and exposed through accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VersionSeq;
use crate::entity::{EntityId, FieldMap};
use crate::identity::IdentityRef;

/// One immutable version of an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    entity_id: EntityId,
    sequence: VersionSeq,
    fields: FieldMap,
    author: Option<IdentityRef>,
    captured_at: DateTime<Utc>,
}

impl VersionSnapshot {
    pub fn new(
        entity_id: EntityId,
        sequence: VersionSeq,
        fields: FieldMap,
        author: Option<IdentityRef>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id,
            sequence,
            fields,
            author,
            captured_at,
        }
    }

    #[inline]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[inline]
    pub fn sequence(&self) -> VersionSeq {
        self.sequence
    }

    /// Captured fields, excluding the configured exclusion set.
    #[inline]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Author at capture time. `None` when the entity had no author.
    #[inline]
    pub fn author(&self) -> Option<&IdentityRef> {
        self.author.as_ref()
    }

    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> VersionSnapshot {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), json!("A"));
        VersionSnapshot::new(
            EntityId::new("e1"),
            VersionSeq::new(3),
            fields,
            Some(IdentityRef::new("Author", "7")),
            Utc::now(),
        )
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = sample();
        assert_eq!(snapshot.entity_id().as_str(), "e1");
        assert_eq!(snapshot.sequence(), VersionSeq::new(3));
        assert_eq!(snapshot.field("name"), Some(&json!("A")));
        assert_eq!(snapshot.author().unwrap().id, "7");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["entity_id"], json!("e1"));
        assert_eq!(value["sequence"], json!(3));
        assert_eq!(value["author"]["type_tag"], json!("Author"));
        assert!(value["captured_at"].is_string());

        let back: VersionSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back.sequence(), VersionSeq::new(3));
    }
}
