//! Journal error types
//!
//! Error codes:
//! - VFU_JOURNAL_WRITE_FAILED (ERROR severity)
//! - VFU_JOURNAL_READ_FAILED (ERROR severity)
//! - VFU_JOURNAL_ENCODE_FAILED (ERROR severity)
//! - VFU_JOURNAL_CORRUPTION (FATAL severity)
//! - VFU_JOURNAL_HALTED (FATAL severity)

use std::fmt;
use std::io;

use thiserror::Error;

/// Severity levels for journal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, process continues
    Error,
    /// The journal cannot be trusted; stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("[ERROR] VFU_JOURNAL_WRITE_FAILED: {message}")]
    WriteFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[ERROR] VFU_JOURNAL_READ_FAILED: {message}")]
    ReadFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("[ERROR] VFU_JOURNAL_ENCODE_FAILED: {0}")]
    EncodeFailed(#[from] serde_json::Error),

    #[error("[FATAL] VFU_JOURNAL_CORRUPTION: {reason} (byte_offset: {offset})")]
    Corruption { offset: u64, reason: String },

    /// A partial record could not be removed; no further appends are taken
    #[error("[FATAL] VFU_JOURNAL_HALTED: {reason} (byte_offset: {offset})")]
    Halted { offset: u64, reason: String },
}

impl JournalError {
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        JournalError::WriteFailed {
            message: message.into(),
            source,
        }
    }

    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        JournalError::ReadFailed {
            message: message.into(),
            source,
        }
    }

    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        JournalError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            JournalError::WriteFailed { .. } => "VFU_JOURNAL_WRITE_FAILED",
            JournalError::ReadFailed { .. } => "VFU_JOURNAL_READ_FAILED",
            JournalError::EncodeFailed(_) => "VFU_JOURNAL_ENCODE_FAILED",
            JournalError::Corruption { .. } => "VFU_JOURNAL_CORRUPTION",
            JournalError::Halted { .. } => "VFU_JOURNAL_HALTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            JournalError::Corruption { .. } | JournalError::Halted { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_is_fatal() {
        let err = JournalError::corruption_at_offset(1024, "checksum mismatch");
        assert!(err.is_fatal());
        assert_eq!(err.code(), "VFU_JOURNAL_CORRUPTION");

        let display = err.to_string();
        assert!(display.contains("FATAL"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("byte_offset: 1024"));
    }

    #[test]
    fn test_write_failed_not_fatal() {
        let err = JournalError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert!(!err.is_fatal());
        assert_eq!(err.severity(), Severity::Error);
        assert!(std::error::Error::source(&err).is_some());
    }
}
