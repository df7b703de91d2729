//! Versioner - coordinates record commits with snapshot capture
//!
//! Every write runs inside the entity's critical section:
//!
//! 1. read the committed entity and apply the mutation to a copy
//! 2. reject changes to the creator reference
//! 3. capture the snapshot (resolves the author; failure writes nothing)
//! 4. commit the record
//! 5. append the snapshot, recapturing from the committed state on
//!    `SequenceConflict` until it lands or retries run out
//! 6. if the append still fails, undo the commit from step 4
//!
//! Steps 4 and 5 cannot be one transaction across an external record store,
//! so the append is retried at-least-once after the commit, and a commit
//! whose snapshot never lands is rolled back. Conflicts only
//! arise when several writers share one version store; inside a single
//! `Versioner` the entity lock already orders them.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::classifier::FieldClassifier;
use super::engine::SnapshotEngine;
use super::errors::{StoreError, VersioningError, VersioningResult};
use super::locks::EntityLocks;
use super::store::VersionStore;
use super::{VersionSeq, VersionSnapshot};
use crate::entity::{Entity, EntityId, FieldMap, RecordError, RecordStore};
use crate::identity::ReferenceKind;
use crate::observability::{Event, MetricsRegistry};

/// Default number of conflict retries per write.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 8;

pub struct Versioner {
    engine: SnapshotEngine,
    records: Arc<dyn RecordStore>,
    versions: Arc<dyn VersionStore>,
    locks: EntityLocks,
    metrics: Arc<MetricsRegistry>,
    max_conflict_retries: u32,
}

impl Versioner {
    pub fn new(
        engine: SnapshotEngine,
        records: Arc<dyn RecordStore>,
        versions: Arc<dyn VersionStore>,
    ) -> Self {
        Self {
            engine,
            records,
            versions,
            locks: EntityLocks::new(),
            metrics: Arc::new(MetricsRegistry::new()),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Shares a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    #[inline]
    pub fn engine(&self) -> &SnapshotEngine {
        &self.engine
    }

    #[inline]
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Creates an entity and captures version 0.
    ///
    /// The creator reference, if the entity type declares one, must resolve.
    /// Ids that are live or still carry history are rejected.
    pub fn create(&self, entity: Entity) -> VersioningResult<VersionSnapshot> {
        let id = entity.id().clone();
        let handle = self.locks.handle(&id)?;
        let _guard = handle.lock().map_err(|_| VersioningError::LockPoisoned)?;

        if self.records.get(&id)?.is_some() || self.versions.latest(&id)?.is_some() {
            return Err(VersioningError::EntityExists(id));
        }

        self.engine.resolve(ReferenceKind::Creator, &entity)?;
        let snapshot = self.capture(&entity, None)?;

        self.records.insert(&entity).map_err(|e| match e {
            RecordError::AlreadyExists(id) => VersioningError::EntityExists(id),
            other => other.into(),
        })?;
        let snapshot = self
            .append_with_retry(&id, snapshot)
            .map_err(|e| self.roll_back(&entity, None, e))?;

        self.metrics.increment_entities_created();
        info!(event = %Event::EntityCreated, entity_id = %id, "entity created");
        Ok(snapshot)
    }

    /// Applies `mutation` to the entity and captures the next version.
    ///
    /// Returns `None` only when the policy skips unchanged mutations and
    /// neither the versioned fields nor the author changed; the record is
    /// committed either way.
    pub fn mutate<F>(&self, id: &EntityId, mutation: F) -> VersioningResult<Option<VersionSnapshot>>
    where
        F: FnOnce(&mut Entity),
    {
        let handle = self.locks.handle(id)?;
        let _guard = handle.lock().map_err(|_| VersioningError::LockPoisoned)?;

        let current = self
            .records
            .get(id)?
            .ok_or_else(|| VersioningError::EntityNotFound(id.clone()))?;
        let mut next = current.clone();
        mutation(&mut next);
        self.check_creator_unchanged(&current, &next)?;

        let latest = self.versions.latest(id)?;
        if self.engine.policy().skip_unchanged() {
            if let Some(latest) = &latest {
                if self.engine.is_unchanged(&next, latest)? {
                    self.records.commit(&next)?;
                    self.metrics.increment_snapshots_skipped();
                    debug!(
                        event = %Event::SnapshotSkipped,
                        entity_id = %id,
                        sequence = latest.sequence().value(),
                        "no versioned change"
                    );
                    return Ok(None);
                }
            }
        }

        let snapshot = self.capture(&next, latest.map(|s| s.sequence()))?;
        self.records.commit(&next)?;
        self.append_with_retry(id, snapshot)
            .map(Some)
            .map_err(|e| self.roll_back(&next, Some(&current), e))
    }

    /// Merges `changes` into the entity's fields.
    pub fn update(&self, id: &EntityId, changes: FieldMap) -> VersioningResult<Option<VersionSnapshot>> {
        self.mutate(id, |entity| entity.merge(changes))
    }

    /// Restores the versioned fields of `sequence` onto the entity.
    ///
    /// Excluded fields keep their current values. The restore is itself a
    /// mutation and produces a new version.
    pub fn revert_to(
        &self,
        id: &EntityId,
        sequence: VersionSeq,
    ) -> VersioningResult<Option<VersionSnapshot>> {
        let target = self
            .versions
            .get(id, sequence)?
            .ok_or_else(|| VersioningError::VersionNotFound {
                entity_id: id.clone(),
                sequence,
            })?;
        let exclusions = self.engine.policy().exclusions().clone();

        let result = self.mutate(id, |entity| {
            let versioned = FieldClassifier::classify(
                entity.fields().keys().map(String::as_str),
                &exclusions,
            );
            for name in versioned {
                if target.field(&name).is_none() {
                    entity.remove(&name);
                }
            }
            entity.merge(target.fields().clone());
        })?;

        if let Some(snapshot) = &result {
            info!(
                event = %Event::EntityReverted,
                entity_id = %id,
                restored = sequence.value(),
                sequence = snapshot.sequence().value(),
                "entity reverted"
            );
        }
        Ok(result)
    }

    /// Deletes the entity. Its history stays queryable.
    pub fn delete(&self, id: &EntityId) -> VersioningResult<()> {
        {
            let handle = self.locks.handle(id)?;
            let _guard = handle.lock().map_err(|_| VersioningError::LockPoisoned)?;
            self.records.delete(id).map_err(|e| match e {
                RecordError::NotFound(id) => VersioningError::EntityNotFound(id),
                other => other.into(),
            })?;
        }
        self.locks.release(id);

        self.metrics.increment_entities_deleted();
        info!(event = %Event::EntityDeleted, entity_id = %id, "entity deleted");
        Ok(())
    }

    pub fn latest(&self, id: &EntityId) -> VersioningResult<Option<VersionSnapshot>> {
        Ok(self.versions.latest(id)?)
    }

    pub fn history(&self, id: &EntityId) -> VersioningResult<Vec<VersionSnapshot>> {
        Ok(self.versions.history(id)?)
    }

    pub fn find_version(
        &self,
        id: &EntityId,
        sequence: VersionSeq,
    ) -> VersioningResult<Option<VersionSnapshot>> {
        Ok(self.versions.get(id, sequence)?)
    }

    fn capture(&self, entity: &Entity, prior: Option<VersionSeq>) -> VersioningResult<VersionSnapshot> {
        self.engine.capture(entity, prior).map_err(|e| {
            self.metrics.increment_capture_failures();
            warn!(
                event = %Event::CaptureFailed,
                entity_id = %entity.id(),
                code = e.code(),
                error = %e,
                "capture failed"
            );
            e.into()
        })
    }

    /// Undoes the commit of `committed` after its append failed.
    ///
    /// `previous` is restored, or the entity removed when it was just
    /// created. Nothing is undone when the stored state is no longer ours:
    /// the entity vanished or another writer committed over it.
    fn roll_back(
        &self,
        committed: &Entity,
        previous: Option<&Entity>,
        cause: VersioningError,
    ) -> VersioningError {
        let id = committed.id();
        match self.records.get(id) {
            Ok(Some(stored)) if &stored == committed => {}
            _ => return cause,
        }

        let undone = match previous {
            Some(previous) => self.records.commit(previous),
            None => self.records.delete(id),
        };
        match undone {
            Ok(()) => {
                self.metrics.increment_commits_rolled_back();
                warn!(
                    event = %Event::CommitRolledBack,
                    entity_id = %id,
                    code = cause.code(),
                    error = %cause,
                    "append failed, commit rolled back"
                );
                cause
            }
            Err(source) => {
                error!(
                    event = %Event::CommitRolledBack,
                    entity_id = %id,
                    error = %source,
                    "append failed and rollback failed"
                );
                VersioningError::RollbackFailed {
                    entity_id: id.clone(),
                    append: Box::new(cause),
                    source,
                }
            }
        }
    }

    fn check_creator_unchanged(&self, current: &Entity, next: &Entity) -> VersioningResult<()> {
        let Some(slot) = self.engine.policy().reference(ReferenceKind::Creator) else {
            return Ok(());
        };
        let changed = slot
            .fields()
            .into_iter()
            .any(|field| current.get(field) != next.get(field));
        if changed {
            return Err(VersioningError::ImmutableReference {
                entity_id: current.id().clone(),
                kind: ReferenceKind::Creator,
            });
        }
        Ok(())
    }

    fn append_with_retry(
        &self,
        id: &EntityId,
        mut snapshot: VersionSnapshot,
    ) -> VersioningResult<VersionSnapshot> {
        let mut conflicts = 0u32;
        loop {
            match self.versions.append(&snapshot) {
                Ok(()) => {
                    self.metrics.increment_snapshots_captured();
                    info!(
                        event = %Event::SnapshotCaptured,
                        entity_id = %id,
                        sequence = snapshot.sequence().value(),
                        "snapshot captured"
                    );
                    return Ok(snapshot);
                }
                Err(StoreError::SequenceConflict { sequence, .. }) => {
                    conflicts += 1;
                    self.metrics.increment_sequence_conflicts();
                    warn!(
                        event = %Event::SequenceConflict,
                        entity_id = %id,
                        sequence = sequence.value(),
                        attempt = conflicts,
                        "sequence conflict"
                    );
                    if conflicts > self.max_conflict_retries {
                        warn!(
                            event = %Event::RetriesExhausted,
                            entity_id = %id,
                            attempts = conflicts,
                            "retries exhausted"
                        );
                        return Err(VersioningError::RetriesExhausted {
                            entity_id: id.clone(),
                            attempts: conflicts,
                        });
                    }
                    self.metrics.increment_conflict_retries();
                    let prior = self.versions.latest(id)?.map(|s| s.sequence());
                    snapshot = self
                        .engine
                        .capture_current(self.records.as_ref(), id, prior)
                        .map_err(|e| {
                            self.metrics.increment_capture_failures();
                            VersioningError::from(e)
                        })?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
