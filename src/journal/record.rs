//! Journal record framing
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Snapshot Body    | (JSON-encoded VersionSnapshot)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + body)
//! +------------------+
//! ```

use std::io;

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::JournalResult;
use crate::versioning::VersionSnapshot;

/// Length prefix + at least one body byte + checksum.
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 4;

/// Frames a snapshot for the journal.
pub fn encode(snapshot: &VersionSnapshot) -> JournalResult<Vec<u8>> {
    let body = serde_json::to_vec(snapshot)?;
    let record_length = (4 + body.len() + 4) as u32;

    let mut record = Vec::with_capacity(record_length as usize);
    record.extend_from_slice(&record_length.to_le_bytes());
    record.extend_from_slice(&body);
    let checksum = compute_checksum(&record);
    record.extend_from_slice(&checksum.to_le_bytes());

    Ok(record)
}

/// Decodes one framed record, verifying its checksum.
///
/// Returns the snapshot and the number of bytes consumed.
pub fn decode(data: &[u8]) -> io::Result<(VersionSnapshot, usize)> {
    if data.len() < MIN_RECORD_SIZE {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
    }

    let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if record_length < MIN_RECORD_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid record length: {}", record_length),
        ));
    }
    if record_length > data.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "Record length {} exceeds available {} bytes",
                record_length,
                data.len()
            ),
        ));
    }

    let checksum_offset = record_length - 4;
    let stored = u32::from_le_bytes([
        data[checksum_offset],
        data[checksum_offset + 1],
        data[checksum_offset + 2],
        data[checksum_offset + 3],
    ]);
    if !verify_checksum(&data[..checksum_offset], stored) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Checksum mismatch"));
    }

    let snapshot: VersionSnapshot = serde_json::from_slice(&data[4..checksum_offset])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid body: {}", e)))?;

    Ok((snapshot, record_length))
}
