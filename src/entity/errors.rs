//! Record store errors

use thiserror::Error;

use super::EntityId;

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors raised by a `RecordStore`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// No entity with this id
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    /// Insert of an id that is already present
    #[error("Entity already exists: {0}")]
    AlreadyExists(EntityId),

    /// Backing store failure
    #[error("Record store error: {0}")]
    Backend(String),
}

impl RecordError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RecordError::NotFound(_) => "VFU_RECORD_NOT_FOUND",
            RecordError::AlreadyExists(_) => "VFU_RECORD_EXISTS",
            RecordError::Backend(_) => "VFU_RECORD_BACKEND",
        }
    }
}
