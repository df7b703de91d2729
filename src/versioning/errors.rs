//! # Versioning Errors
//!
//! - `CaptureError` - snapshot could not be built; not retryable without
//!   re-reading entity state
//! - `StoreError` - version store rejected or failed an append;
//!   `SequenceConflict` is retryable
//! - `VersioningError` - everything the `Versioner` can surface

use thiserror::Error;

use super::VersionSeq;
use crate::entity::{EntityId, RecordError};
use crate::identity::{ReferenceKind, ResolveError};
use crate::journal::JournalError;

/// Result type for version store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for versioner operations
pub type VersioningResult<T> = Result<T, VersioningError>;

/// Snapshot capture failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The entity was deleted while its snapshot was being captured
    #[error("Entity '{0}' vanished during capture")]
    EntityVanished(EntityId),

    /// The author reference does not resolve to an identity
    #[error("Author of entity '{entity_id}' could not be resolved: {source}")]
    UnresolvedAuthor {
        entity_id: EntityId,
        source: ResolveError,
    },

    /// The record store failed while re-reading the entity
    #[error("Record store failed during capture: {0}")]
    Record(#[from] RecordError),
}

impl CaptureError {
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::EntityVanished(_) => "VFU_CAPTURE_ENTITY_VANISHED",
            CaptureError::UnresolvedAuthor { .. } => "VFU_CAPTURE_UNRESOLVED_AUTHOR",
            CaptureError::Record(_) => "VFU_CAPTURE_RECORD",
        }
    }
}

/// Version store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// A snapshot with this (entity, sequence) already exists
    #[error("Sequence conflict on entity '{entity_id}': version {sequence} already exists")]
    SequenceConflict {
        entity_id: EntityId,
        sequence: VersionSeq,
    },

    /// The snapshot skips ahead of the next expected sequence
    #[error("Sequence gap on entity '{entity_id}': expected version {expected}, got {found}")]
    SequenceGap {
        entity_id: EntityId,
        expected: VersionSeq,
        found: VersionSeq,
    },

    /// Durable journal failure
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// A store lock was poisoned by a panicking writer
    #[error("Version store lock poisoned")]
    Poisoned,

    /// The store was opened for queries only
    #[error("Version store is read-only; snapshot for entity '{0}' rejected")]
    ReadOnly(EntityId),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::SequenceConflict { .. } => "VFU_SEQUENCE_CONFLICT",
            StoreError::SequenceGap { .. } => "VFU_SEQUENCE_GAP",
            StoreError::Journal(e) => e.code(),
            StoreError::Poisoned => "VFU_STORE_POISONED",
            StoreError::ReadOnly(_) => "VFU_STORE_READ_ONLY",
        }
    }

    /// Conflicts are resolved by re-reading the prior sequence and recapturing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::SequenceConflict { .. })
    }
}

/// Errors surfaced by the `Versioner`
#[derive(Debug, Error)]
pub enum VersioningError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Record(#[from] RecordError),

    /// A mutation tried to change a reference that is fixed at creation
    #[error("The {} reference of entity '{entity_id}' cannot change after creation", .kind.as_str())]
    ImmutableReference {
        entity_id: EntityId,
        kind: ReferenceKind,
    },

    /// Create of an id that is live or still has version history
    #[error("Entity '{0}' already exists or has version history")]
    EntityExists(EntityId),

    #[error("Entity '{0}' not found")]
    EntityNotFound(EntityId),

    #[error("Version {sequence} of entity '{entity_id}' not found")]
    VersionNotFound {
        entity_id: EntityId,
        sequence: VersionSeq,
    },

    /// Every retry lost the race for the next sequence
    #[error("Gave up on entity '{entity_id}' after {attempts} sequence conflicts")]
    RetriesExhausted { entity_id: EntityId, attempts: u32 },

    /// The snapshot append failed and the record commit could not be undone
    #[error("Append for entity '{entity_id}' failed ({append}) and the commit could not be undone: {source}")]
    RollbackFailed {
        entity_id: EntityId,
        append: Box<VersioningError>,
        source: RecordError,
    },

    #[error("Entity lock poisoned")]
    LockPoisoned,
}

impl VersioningError {
    pub fn code(&self) -> &'static str {
        match self {
            VersioningError::Capture(e) => e.code(),
            VersioningError::Store(e) => e.code(),
            VersioningError::Resolve(e) => e.code(),
            VersioningError::Record(e) => e.code(),
            VersioningError::ImmutableReference { .. } => "VFU_IMMUTABLE_REFERENCE",
            VersioningError::EntityExists(_) => "VFU_ENTITY_EXISTS",
            VersioningError::EntityNotFound(_) => "VFU_ENTITY_NOT_FOUND",
            VersioningError::VersionNotFound { .. } => "VFU_VERSION_NOT_FOUND",
            VersioningError::RetriesExhausted { .. } => "VFU_RETRIES_EXHAUSTED",
            VersioningError::RollbackFailed { .. } => "VFU_ROLLBACK_FAILED",
            VersioningError::LockPoisoned => "VFU_LOCK_POISONED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            VersioningError::Store(e) => e.is_retryable(),
            VersioningError::RetriesExhausted { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        let conflict = StoreError::SequenceConflict {
            entity_id: EntityId::new("e1"),
            sequence: VersionSeq::new(1),
        };
        let gap = StoreError::SequenceGap {
            entity_id: EntityId::new("e1"),
            expected: VersionSeq::new(1),
            found: VersionSeq::new(3),
        };
        assert!(conflict.is_retryable());
        assert!(!gap.is_retryable());
        assert!(!VersioningError::from(CaptureError::EntityVanished(EntityId::new("e1"))).is_retryable());
    }

    #[test]
    fn test_error_codes_pass_through() {
        let err = VersioningError::from(StoreError::SequenceConflict {
            entity_id: EntityId::new("e1"),
            sequence: VersionSeq::new(1),
        });
        assert_eq!(err.code(), "VFU_SEQUENCE_CONFLICT");
        assert!(err.to_string().contains("version 1 already exists"));
    }

    #[test]
    fn test_immutable_reference_message_names_kind() {
        let err = VersioningError::ImmutableReference {
            entity_id: EntityId::new("page-1"),
            kind: ReferenceKind::Creator,
        };
        assert!(err.to_string().contains("creator reference"));
    }
}
