//! Reference Resolution Tests
//!
//! Tests for:
//! - Polymorphic author references resolve through one resolver
//! - Absent author is recorded as none; dangling author fails capture
//! - Creator reference must resolve on create and never changes

use std::sync::Arc;

use serde_json::json;
use versionfu::entity::{Entity, EntityId, FieldMap, InMemoryRecordStore};
use versionfu::identity::{
    Identity, IdentityRef, InMemoryIdentityStore, ReferenceKind, ReferenceResolver, ReferenceSlot,
    ResolveError,
};
use versionfu::versioning::{
    CaptureError, ExclusionSpec, MemoryVersionStore, SnapshotEngine, Versioner, VersioningError,
    VersioningPolicy,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn identities() -> Arc<InMemoryIdentityStore> {
    let store = InMemoryIdentityStore::new();
    store
        .register(Identity::new("User", "7").with_display_name("Ada"))
        .unwrap();
    store
        .register(Identity::new("Admin", "7").with_display_name("Root"))
        .unwrap();
    store
        .register(Identity::new("ApiClient", "ci").with_display_name("CI"))
        .unwrap();
    Arc::new(store)
}

/// Author read from `whodunnit_id` / `whodunnit_type`, creator fixed to User.
fn whodunnit_policy() -> VersioningPolicy {
    VersioningPolicy::new(ExclusionSpec::none())
        .with_reference(ReferenceSlot::polymorphic(
            ReferenceKind::Author,
            "whodunnit_id",
            "whodunnit_type",
        ))
        .with_reference(ReferenceSlot::fixed(ReferenceKind::Creator, "owner_id", "User"))
}

fn versioner(resolver: Arc<InMemoryIdentityStore>) -> Versioner {
    Versioner::new(
        SnapshotEngine::new(whodunnit_policy(), resolver),
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(MemoryVersionStore::new()),
    )
}

fn doc() -> Entity {
    Entity::new(EntityId::new("doc-1"))
        .field("title", "Draft")
        .field("owner_id", 7)
}

fn set(pairs: &[(&str, serde_json::Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Polymorphic resolution
// =============================================================================

#[test]
fn test_same_id_different_types_resolve_separately() {
    let resolver = identities();
    let user = resolver.resolve(&IdentityRef::new("User", "7")).unwrap();
    let admin = resolver.resolve(&IdentityRef::new("Admin", "7")).unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Ada"));
    assert_eq!(admin.display_name.as_deref(), Some("Root"));
}

#[test]
fn test_snapshot_author_follows_type_field() {
    let versioner = versioner(identities());
    let id = EntityId::new("doc-1");

    let v0 = versioner.create(doc()).unwrap();
    assert_eq!(v0.author(), None);

    let v1 = versioner
        .update(&id, set(&[("whodunnit_type", json!("Admin")), ("whodunnit_id", json!(7))]))
        .unwrap()
        .unwrap();
    assert_eq!(v1.author(), Some(&IdentityRef::new("Admin", "7")));

    let v2 = versioner
        .update(&id, set(&[("whodunnit_type", json!("ApiClient")), ("whodunnit_id", json!("ci"))]))
        .unwrap()
        .unwrap();
    assert_eq!(v2.author(), Some(&IdentityRef::new("ApiClient", "ci")));

    // Earlier snapshots keep the author they were captured with
    let history = versioner.history(&id).unwrap();
    assert_eq!(history[1].author(), Some(&IdentityRef::new("Admin", "7")));
}

#[test]
fn test_clearing_author_records_none() {
    let versioner = versioner(identities());
    let id = EntityId::new("doc-1");
    versioner
        .create(doc().field("whodunnit_type", "User").field("whodunnit_id", 7))
        .unwrap();

    let snapshot = versioner
        .update(&id, set(&[("whodunnit_id", json!(null))]))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.author(), None);
}

#[test]
fn test_dangling_polymorphic_author_fails_capture() {
    let versioner = versioner(identities());
    let id = EntityId::new("doc-1");
    versioner.create(doc()).unwrap();

    let err = versioner
        .update(&id, set(&[("whodunnit_type", json!("Robot")), ("whodunnit_id", json!(7))]))
        .unwrap_err();
    match err {
        VersioningError::Capture(CaptureError::UnresolvedAuthor { source, .. }) => {
            assert!(matches!(source, ResolveError::Unresolved { .. }));
        }
        other => panic!("expected unresolved author, got {}", other),
    }
    assert_eq!(versioner.history(&id).unwrap().len(), 1);
}

#[test]
fn test_author_removed_from_identity_store_fails_next_capture() {
    let resolver = identities();
    let versioner = versioner(resolver.clone());
    let id = EntityId::new("doc-1");
    versioner
        .create(doc().field("whodunnit_type", "ApiClient").field("whodunnit_id", "ci"))
        .unwrap();

    resolver.remove(&IdentityRef::new("ApiClient", "ci")).unwrap();

    let err = versioner.update(&id, set(&[("title", json!("Final"))])).unwrap_err();
    assert_eq!(err.code(), "VFU_CAPTURE_UNRESOLVED_AUTHOR");
}

#[test]
fn test_author_id_without_type_is_malformed() {
    let versioner = versioner(identities());
    let err = versioner
        .create(doc().field("whodunnit_id", 7))
        .unwrap_err();
    match err {
        VersioningError::Capture(CaptureError::UnresolvedAuthor { source, .. }) => {
            assert!(matches!(source, ResolveError::Malformed { .. }));
        }
        other => panic!("expected malformed author, got {}", other),
    }
}

// =============================================================================
// Creator
// =============================================================================

#[test]
fn test_unresolvable_creator_rejects_create() {
    let versioner = versioner(identities());
    let err = versioner
        .create(Entity::new(EntityId::new("doc-2")).field("owner_id", 404))
        .unwrap_err();
    assert!(matches!(err, VersioningError::Resolve(ResolveError::Unresolved { .. })));
    assert!(versioner.history(&EntityId::new("doc-2")).unwrap().is_empty());
}

#[test]
fn test_creator_cannot_be_reassigned() {
    let versioner = versioner(identities());
    let id = EntityId::new("doc-1");
    versioner.create(doc()).unwrap();

    let err = versioner.update(&id, set(&[("owner_id", json!(8))])).unwrap_err();
    assert!(matches!(
        err,
        VersioningError::ImmutableReference { kind: ReferenceKind::Creator, .. }
    ));
    assert_eq!(versioner.history(&id).unwrap().len(), 1);
}
