//! Metrics registry
//!
//! - Counters only, monotonic, reset on process start
//! - Thread-safe via relaxed atomics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Versioning counters shared by the versioner and the journal.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Snapshots appended
    snapshots_captured: AtomicU64,
    /// Mutations committed without a snapshot
    snapshots_skipped: AtomicU64,
    /// Captures that failed (vanished entity, dangling author)
    capture_failures: AtomicU64,
    /// Appends that lost a sequence race
    sequence_conflicts: AtomicU64,
    /// Recaptures after a lost race
    conflict_retries: AtomicU64,
    /// Record commits undone after a failed append
    commits_rolled_back: AtomicU64,
    /// Entities created
    entities_created: AtomicU64,
    /// Entities deleted
    entities_deleted: AtomicU64,
    /// Bytes written to the journal
    journal_bytes_written: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_snapshots_captured(&self) {
        self.snapshots_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_skipped(&self) {
        self.snapshots_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_capture_failures(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sequence_conflicts(&self) {
        self.sequence_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflict_retries(&self) {
        self.conflict_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commits_rolled_back(&self) {
        self.commits_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_entities_created(&self) {
        self.entities_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_entities_deleted(&self) {
        self.entities_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_journal_bytes(&self, bytes: u64) {
        self.journal_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_captured: self.snapshots_captured.load(Ordering::Relaxed),
            snapshots_skipped: self.snapshots_skipped.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            sequence_conflicts: self.sequence_conflicts.load(Ordering::Relaxed),
            conflict_retries: self.conflict_retries.load(Ordering::Relaxed),
            commits_rolled_back: self.commits_rolled_back.load(Ordering::Relaxed),
            entities_created: self.entities_created.load(Ordering::Relaxed),
            entities_deleted: self.entities_deleted.load(Ordering::Relaxed),
            journal_bytes: self.journal_bytes_written.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub snapshots_captured: u64,
    pub snapshots_skipped: u64,
    pub capture_failures: u64,
    pub sequence_conflicts: u64,
    pub conflict_retries: u64,
    pub commits_rolled_back: u64,
    pub entities_created: u64,
    pub entities_deleted: u64,
    pub journal_bytes: u64,
}
