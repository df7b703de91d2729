//! Snapshot Engine
//!
//! Builds one `VersionSnapshot` per committed mutation:
//! - sequence = prior + 1, or 0 for the first snapshot
//! - fields = classified fields of the entity at commit time
//! - author = the entity's current author, which must resolve
//!
//! The engine does not append; ordering and atomicity belong to the caller
//! holding the entity's critical section.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::classifier::FieldClassifier;
use super::errors::CaptureError;
use super::policy::VersioningPolicy;
use super::{VersionSeq, VersionSnapshot};
use crate::entity::{Entity, EntityId, RecordStore};
use crate::identity::{Identity, IdentityRef, ReferenceKind, ReferenceResolver, ResolveResult};

/// Source of capture timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct SnapshotEngine {
    policy: VersioningPolicy,
    resolver: Arc<dyn ReferenceResolver>,
    clock: Arc<dyn Clock>,
}

impl SnapshotEngine {
    pub fn new(policy: VersioningPolicy, resolver: Arc<dyn ReferenceResolver>) -> Self {
        Self {
            policy,
            resolver,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[inline]
    pub fn policy(&self) -> &VersioningPolicy {
        &self.policy
    }

    /// Reads the reference of `kind` from the entity without resolving it.
    ///
    /// Entity types that declare no slot for `kind` have no such reference.
    pub fn reference(&self, kind: ReferenceKind, entity: &Entity) -> ResolveResult<Option<IdentityRef>> {
        match self.policy.reference(kind) {
            Some(slot) => slot.read(entity),
            None => Ok(None),
        }
    }

    /// Reads and resolves the reference of `kind`.
    pub fn resolve(&self, kind: ReferenceKind, entity: &Entity) -> ResolveResult<Option<Identity>> {
        self.reference(kind, entity)?
            .map(|reference| self.resolver.resolve(&reference))
            .transpose()
    }

    /// Captures a snapshot of `entity` following `prior`.
    pub fn capture(
        &self,
        entity: &Entity,
        prior: Option<VersionSeq>,
    ) -> Result<VersionSnapshot, CaptureError> {
        let author = self
            .resolve(ReferenceKind::Author, entity)
            .map_err(|source| CaptureError::UnresolvedAuthor {
                entity_id: entity.id().clone(),
                source,
            })?
            .map(|identity| identity.reference());

        let fields = FieldClassifier::project(entity.fields(), self.policy.exclusions());

        Ok(VersionSnapshot::new(
            entity.id().clone(),
            VersionSeq::after(prior),
            fields,
            author,
            self.clock.now(),
        ))
    }

    /// Re-reads the committed entity and captures it.
    ///
    /// Fails with `EntityVanished` if the entity was deleted in the meantime.
    pub fn capture_current(
        &self,
        records: &dyn RecordStore,
        id: &EntityId,
        prior: Option<VersionSeq>,
    ) -> Result<VersionSnapshot, CaptureError> {
        let entity = records
            .get(id)?
            .ok_or_else(|| CaptureError::EntityVanished(id.clone()))?;
        self.capture(&entity, prior)
    }

    /// True when capturing `entity` would reproduce `latest` apart from
    /// sequence and timestamp.
    pub fn is_unchanged(&self, entity: &Entity, latest: &VersionSnapshot) -> ResolveResult<bool> {
        let author = self.reference(ReferenceKind::Author, entity)?;
        if author.as_ref() != latest.author() {
            return Ok(false);
        }
        let fields = FieldClassifier::project(entity.fields(), self.policy.exclusions());
        Ok(&fields == latest.fields())
    }
}
