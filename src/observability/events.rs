//! Observable events
//!
//! Every log line emitted by the crate carries one of these as its `event`
//! field. Events are explicit and typed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Entity lifecycle
    /// Entity created with its initial snapshot
    EntityCreated,
    /// Entity removed from the record store; history kept
    EntityDeleted,
    /// Entity restored to an earlier version
    EntityReverted,

    // Capture
    /// Snapshot appended to the version store
    SnapshotCaptured,
    /// Mutation committed without a snapshot (nothing versioned changed)
    SnapshotSkipped,
    /// Snapshot could not be built
    CaptureFailed,
    /// Append lost the race for a sequence number
    SequenceConflict,
    /// Conflict retries exhausted
    RetriesExhausted,
    /// Record commit undone because its snapshot could not be appended
    CommitRolledBack,

    // Journal
    /// Journal opened and index rebuilt
    JournalOpened,
    /// Journal record written and fsynced
    JournalAppend,
    /// Journal checksum or framing failure (FATAL)
    JournalCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::EntityCreated => "ENTITY_CREATED",
            Event::EntityDeleted => "ENTITY_DELETED",
            Event::EntityReverted => "ENTITY_REVERTED",
            Event::SnapshotCaptured => "SNAPSHOT_CAPTURED",
            Event::SnapshotSkipped => "SNAPSHOT_SKIPPED",
            Event::CaptureFailed => "CAPTURE_FAILED",
            Event::SequenceConflict => "SEQUENCE_CONFLICT",
            Event::RetriesExhausted => "RETRIES_EXHAUSTED",
            Event::CommitRolledBack => "COMMIT_ROLLED_BACK",
            Event::JournalOpened => "JOURNAL_OPENED",
            Event::JournalAppend => "JOURNAL_APPEND",
            Event::JournalCorruption => "JOURNAL_CORRUPTION",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::JournalCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
