//! Sequential journal reader
//!
//! Every record's checksum is verified as it is read. Any framing or
//! checksum failure is reported as corruption at the record's byte offset.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{JournalError, JournalResult};
use super::record::{self, MIN_RECORD_SIZE};
use crate::versioning::VersionSnapshot;

pub struct JournalReader {
    /// Path to the journal file
    path: PathBuf,
    /// Buffered handle, opened read-only
    reader: BufReader<File>,
    /// Start of the next record to read
    current_offset: u64,
    /// File size at open; records past it are not read
    file_size: u64,
}

impl JournalReader {
    pub fn open(path: &Path) -> JournalResult<Self> {
        let file = File::open(path).map_err(|e| {
            JournalError::read_failed(format!("Failed to open journal: {}", path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| JournalError::read_failed("Failed to read journal metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next snapshot, or `None` at end of file.
    pub fn read_next(&mut self) -> JournalResult<Option<VersionSnapshot>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(JournalError::corruption_at_offset(
                self.current_offset,
                format!("Truncated journal: {} trailing bytes", remaining),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            JournalError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 || record_length > remaining {
            return Err(JournalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Invalid record length {} with {} bytes remaining",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            JournalError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (snapshot, consumed) = record::decode(&record_buf)
            .map_err(|e| JournalError::corruption_at_offset(self.current_offset, e.to_string()))?;
        self.current_offset += consumed as u64;

        Ok(Some(snapshot))
    }

    /// Reads every remaining snapshot. Any corruption fails the whole read.
    pub fn read_all(&mut self) -> JournalResult<Vec<VersionSnapshot>> {
        let mut snapshots = Vec::new();
        while let Some(snapshot) = self.read_next()? {
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }
}
