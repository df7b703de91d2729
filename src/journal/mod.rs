//! Durable snapshot journal
//!
//! A file-backed `VersionStore`: one append-only record file at
//! `<data_dir>/versions/journal.dat`.
//!
//! - Append-only, no in-place updates
//! - CRC32 checksum verified on every read
//! - fsync before an append is acknowledged
//! - Halt on corruption: a bad record fails the open, never skipped

mod checksum;
mod errors;
mod reader;
mod record;
mod store;
mod writer;

pub use checksum::compute_checksum;
pub use errors::{JournalError, JournalResult, Severity};
pub use reader::JournalReader;
pub use store::JournalVersionStore;
pub use writer::{journal_path, JournalWriter, JOURNAL_DIR, JOURNAL_FILE};
