//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::journal::JournalError;
use crate::versioning::StoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("VFU_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    #[error("VFU_CLI_IO_ERROR: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("VFU_CLI_ALREADY_INITIALIZED: journal already exists at {0}")]
    AlreadyInitialized(String),

    #[error("VFU_CLI_NOT_INITIALIZED: no journal at {0}. Run 'versionfu init' first.")]
    NotInitialized(String),

    #[error("VFU_CLI_NOT_FOUND: {0}")]
    NotFound(String),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Journal(e) => e.code(),
            CliError::Store(e) => e.code(),
            CliError::Io(_) | CliError::Json(_) => "VFU_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "VFU_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "VFU_CLI_NOT_INITIALIZED",
            CliError::NotFound(_) => "VFU_CLI_NOT_FOUND",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
