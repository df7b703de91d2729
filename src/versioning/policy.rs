//! Versioning policy for one entity type
//!
//! An entity type declares, at construction time, which fields are excluded
//! from snapshots and where its identity references live. The policy is
//! handed to the snapshot engine; nothing is attached at runtime.

use super::classifier::ExclusionSpec;
use crate::identity::{ReferenceKind, ReferenceSlot};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersioningPolicy {
    exclusions: ExclusionSpec,
    references: Vec<ReferenceSlot>,
    skip_unchanged: bool,
}

impl VersioningPolicy {
    pub fn new(exclusions: ExclusionSpec) -> Self {
        Self {
            exclusions,
            references: Vec::new(),
            skip_unchanged: false,
        }
    }

    /// Declares a reference slot, replacing any slot of the same kind.
    pub fn with_reference(mut self, slot: ReferenceSlot) -> Self {
        self.references.retain(|s| s.kind != slot.kind);
        self.references.push(slot);
        self
    }

    /// When set, mutations that change neither versioned fields nor the
    /// author are committed without a new snapshot.
    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    #[inline]
    pub fn exclusions(&self) -> &ExclusionSpec {
        &self.exclusions
    }

    pub fn references(&self) -> &[ReferenceSlot] {
        &self.references
    }

    pub fn reference(&self, kind: ReferenceKind) -> Option<&ReferenceSlot> {
        self.references.iter().find(|s| s.kind == kind)
    }

    #[inline]
    pub fn skip_unchanged(&self) -> bool {
        self.skip_unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_declares_slots() {
        let policy = VersioningPolicy::new(ExclusionSpec::new(["creator_id"]))
            .with_reference(ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "Author"))
            .with_reference(ReferenceSlot::fixed(ReferenceKind::Creator, "creator_id", "Author"));

        assert!(policy.exclusions().contains("creator_id"));
        assert_eq!(policy.references().len(), 2);
        assert_eq!(
            policy.reference(ReferenceKind::Creator).unwrap().id_field,
            "creator_id"
        );
        assert!(!policy.skip_unchanged());
    }

    #[test]
    fn test_redeclaring_a_kind_replaces_it() {
        let policy = VersioningPolicy::default()
            .with_reference(ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "Author"))
            .with_reference(ReferenceSlot::fixed(ReferenceKind::Author, "editor_id", "Editor"));

        assert_eq!(policy.references().len(), 1);
        assert_eq!(policy.reference(ReferenceKind::Author).unwrap().id_field, "editor_id");
    }
}
