//! Journal writer with fsync enforcement
//!
//! Append-only: each snapshot is written as one framed record and fsynced
//! before the append is acknowledged. A failed write is truncated back to
//! the previous end of file so no partial record survives. If that
//! truncation fails too, the writer halts and refuses every later append.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{JournalError, JournalResult};
use super::record;
use crate::versioning::VersionSnapshot;

/// Journal directory under the data directory.
pub const JOURNAL_DIR: &str = "versions";
/// Journal file name.
pub const JOURNAL_FILE: &str = "journal.dat";

/// `<data_dir>/versions/journal.dat`
pub fn journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join(JOURNAL_DIR).join(JOURNAL_FILE)
}

/// Destination of framed records.
trait RecordSink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl RecordSink for File {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(self, bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes `bytes` at `offset` and fsyncs.
///
/// On failure the sink is cut back to `offset`. A failed cut leaves a
/// partial record behind and is reported as `Halted`.
fn append_record<S: RecordSink>(sink: &mut S, offset: u64, bytes: &[u8]) -> JournalResult<()> {
    let written = sink
        .write_all(bytes)
        .map_err(|e| JournalError::write_failed("Failed to write journal record", e))
        .and_then(|()| {
            sink.sync()
                .map_err(|e| JournalError::write_failed("fsync failed after journal write", e))
        });

    if let Err(write_err) = written {
        if let Err(e) = sink.truncate(offset) {
            return Err(JournalError::Halted {
                offset,
                reason: format!("{}; partial record could not be truncated: {}", write_err, e),
            });
        }
        return Err(write_err);
    }
    Ok(())
}

pub struct JournalWriter {
    /// Path to the journal file
    path: PathBuf,
    /// Journal file, opened for append
    file: File,
    /// End of the last acknowledged record
    current_offset: u64,
    /// Set once a partial record could not be removed
    halted: bool,
}

impl JournalWriter {
    /// Opens or creates the journal under `data_dir`.
    pub fn open(data_dir: &Path) -> JournalResult<Self> {
        let dir = data_dir.join(JOURNAL_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                JournalError::write_failed(
                    format!("Failed to create journal directory: {}", dir.display()),
                    e,
                )
            })?;
        }

        let path = journal_path(data_dir);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                JournalError::write_failed(format!("Failed to open journal: {}", path.display()), e)
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| JournalError::write_failed("Failed to read journal metadata", e))?
            .len();

        Ok(Self {
            path,
            file,
            current_offset,
            halted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Appends one snapshot and fsyncs. Returns the bytes written.
    pub fn append(&mut self, snapshot: &VersionSnapshot) -> JournalResult<u64> {
        if self.halted {
            return Err(JournalError::Halted {
                offset: self.current_offset,
                reason: "writer halted after an unrecoverable write failure".to_string(),
            });
        }

        let bytes = record::encode(snapshot)?;
        if let Err(e) = append_record(&mut self.file, self.current_offset, &bytes) {
            self.halted = matches!(e, JournalError::Halted { .. });
            return Err(e);
        }

        self.current_offset += bytes.len() as u64;
        Ok(bytes.len() as u64)
    }
}
