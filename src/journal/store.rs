//! Durable version store
//!
//! On open the whole journal is scanned, every checksum verified and the
//! per-entity chains rebuilt in memory. Appends go to the journal first and
//! reach the in-memory index only after fsync. The writer mutex orders all
//! appends, so the sequence check and the write cannot interleave.
//! A store opened read-only holds no writer and never touches the file
//! after the scan.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{error, info, trace};

use super::errors::{JournalError, JournalResult};
use super::reader::JournalReader;
use super::writer::{journal_path, JournalWriter};
use crate::entity::EntityId;
use crate::observability::{Event, MetricsRegistry};
use crate::versioning::{
    SnapshotChain, StoreError, StoreResult, VersionSeq, VersionSnapshot, VersionStore,
};

pub struct JournalVersionStore {
    /// `None` when opened read-only
    writer: Option<Mutex<JournalWriter>>,
    chains: RwLock<HashMap<EntityId, SnapshotChain>>,
    metrics: Arc<MetricsRegistry>,
}

impl JournalVersionStore {
    /// Opens (or creates) the journal under `data_dir` and rebuilds the index.
    ///
    /// Checksum failures and out-of-order sequences are fatal corruption.
    pub fn open(data_dir: &Path) -> JournalResult<Self> {
        let writer = JournalWriter::open(data_dir)?;
        let chains = Self::rebuild_index(&journal_path(data_dir))?;

        info!(
            event = %Event::JournalOpened,
            path = %writer.path().display(),
            entities = chains.len(),
            "journal opened"
        );

        Ok(Self {
            writer: Some(Mutex::new(writer)),
            chains: RwLock::new(chains),
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    /// Scans an existing journal without opening it for writing.
    ///
    /// A missing journal is a read failure; nothing is created. Every
    /// `append` is rejected with `StoreError::ReadOnly`.
    pub fn open_read_only(data_dir: &Path) -> JournalResult<Self> {
        let path = journal_path(data_dir);
        let chains = Self::rebuild_index(&path)?;

        info!(
            event = %Event::JournalOpened,
            path = %path.display(),
            entities = chains.len(),
            read_only = true,
            "journal opened"
        );

        Ok(Self {
            writer: None,
            chains: RwLock::new(chains),
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    pub fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    /// Shares a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Total snapshots across all entities.
    pub fn snapshot_count(&self) -> StoreResult<usize> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains.values().map(SnapshotChain::len).sum())
    }

    fn rebuild_index(path: &Path) -> JournalResult<HashMap<EntityId, SnapshotChain>> {
        let mut chains: HashMap<EntityId, SnapshotChain> = HashMap::new();
        let mut reader = JournalReader::open(path)?;

        loop {
            let offset = reader.current_offset();
            let snapshot = match reader.read_next() {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => break,
                Err(e) => {
                    error!(event = %Event::JournalCorruption, error = %e, "journal unreadable");
                    return Err(e);
                }
            };

            let chain = chains
                .entry(snapshot.entity_id().clone())
                .or_insert_with(|| SnapshotChain::new(snapshot.entity_id().clone()));
            if let Err(e) = chain.push(snapshot) {
                error!(event = %Event::JournalCorruption, offset, error = %e, "journal out of order");
                return Err(JournalError::corruption_at_offset(offset, e.to_string()));
            }
        }

        Ok(chains)
    }
}

impl VersionStore for JournalVersionStore {
    fn append(&self, snapshot: &VersionSnapshot) -> StoreResult<()> {
        let mut writer = self
            .writer
            .as_ref()
            .ok_or_else(|| StoreError::ReadOnly(snapshot.entity_id().clone()))?
            .lock()
            .map_err(|_| StoreError::Poisoned)?;

        {
            let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
            match chains.get(snapshot.entity_id()) {
                Some(chain) => chain.check_append(snapshot)?,
                None => SnapshotChain::new(snapshot.entity_id().clone()).check_append(snapshot)?,
            }
        }

        let bytes = writer.append(snapshot)?;
        self.metrics.add_journal_bytes(bytes);
        trace!(
            event = %Event::JournalAppend,
            entity_id = %snapshot.entity_id(),
            sequence = snapshot.sequence().value(),
            bytes,
            "journal append"
        );

        let mut chains = self.chains.write().map_err(|_| StoreError::Poisoned)?;
        chains
            .entry(snapshot.entity_id().clone())
            .or_insert_with(|| SnapshotChain::new(snapshot.entity_id().clone()))
            .push(snapshot.clone())
    }

    fn latest(&self, entity_id: &EntityId) -> StoreResult<Option<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains.get(entity_id).and_then(|c| c.latest()).cloned())
    }

    fn history(&self, entity_id: &EntityId) -> StoreResult<Vec<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains
            .get(entity_id)
            .map(|c| c.snapshots().to_vec())
            .unwrap_or_default())
    }

    fn get(&self, entity_id: &EntityId, sequence: VersionSeq) -> StoreResult<Option<VersionSnapshot>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        Ok(chains.get(entity_id).and_then(|c| c.get(sequence)).cloned())
    }

    fn entities(&self) -> StoreResult<Vec<EntityId>> {
        let chains = self.chains.read().map_err(|_| StoreError::Poisoned)?;
        let mut ids: Vec<EntityId> = chains.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldMap;
    use chrono::Utc;
    use tempfile::TempDir;

    fn snap(entity: &str, seq: u64) -> VersionSnapshot {
        VersionSnapshot::new(EntityId::new(entity), VersionSeq::new(seq), FieldMap::new(), None, Utc::now())
    }

    #[test]
    fn test_conflicting_append_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = JournalVersionStore::open(temp.path()).unwrap();
        store.append(&snap("e1", 0)).unwrap();
        let size_before = std::fs::metadata(journal_path(temp.path())).unwrap().len();

        let result = store.append(&snap("e1", 0));
        assert!(matches!(result, Err(StoreError::SequenceConflict { .. })));

        let size_after = std::fs::metadata(journal_path(temp.path())).unwrap().len();
        assert_eq!(size_before, size_after);
    }

    #[test]
    fn test_metrics_count_journal_bytes() {
        let temp = TempDir::new().unwrap();
        let metrics = Arc::new(MetricsRegistry::new());
        let store = JournalVersionStore::open(temp.path())
            .unwrap()
            .with_metrics(Arc::clone(&metrics));

        store.append(&snap("e1", 0)).unwrap();
        let size = std::fs::metadata(journal_path(temp.path())).unwrap().len();
        assert_eq!(metrics.snapshot().journal_bytes, size);
        assert_eq!(store.snapshot_count().unwrap(), 1);
    }

    #[test]
    fn test_read_only_store_serves_history_and_rejects_appends() {
        let temp = TempDir::new().unwrap();
        {
            let store = JournalVersionStore::open(temp.path()).unwrap();
            store.append(&snap("e1", 0)).unwrap();
            store.append(&snap("e1", 1)).unwrap();
        }
        let path = journal_path(temp.path());
        let before = std::fs::read(&path).unwrap();

        let store = JournalVersionStore::open_read_only(temp.path()).unwrap();
        assert!(store.is_read_only());
        assert_eq!(store.history(&EntityId::new("e1")).unwrap().len(), 2);

        let err = store.append(&snap("e1", 2)).unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly(_)));
        assert_eq!(err.code(), "VFU_STORE_READ_ONLY");
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_read_only_open_does_not_create_journal() {
        let temp = TempDir::new().unwrap();
        let err = JournalVersionStore::open_read_only(temp.path()).err().unwrap();
        assert_eq!(err.code(), "VFU_JOURNAL_READ_FAILED");
        assert!(!temp.path().join(crate::journal::JOURNAL_DIR).exists());
    }
}
