//! # Identity Errors

use thiserror::Error;

/// Result type for reference resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Reference resolution errors
///
/// Missing references are always surfaced; nothing is defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No identity matches the tagged reference
    #[error("Unresolved reference {type_tag}#{id}")]
    Unresolved { type_tag: String, id: String },

    /// The entity carries a reference field that cannot be interpreted
    #[error("Malformed reference in field '{field}': {reason}")]
    Malformed { field: String, reason: String },

    /// Identity store failure
    #[error("Identity store error: {0}")]
    Backend(String),
}

impl ResolveError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::Unresolved { .. } => "VFU_UNRESOLVED_REFERENCE",
            ResolveError::Malformed { .. } => "VFU_MALFORMED_REFERENCE",
            ResolveError::Backend(_) => "VFU_IDENTITY_BACKEND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_display_names_reference() {
        let err = ResolveError::Unresolved {
            type_tag: "Author".to_string(),
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Unresolved reference Author#42");
        assert_eq!(err.code(), "VFU_UNRESOLVED_REFERENCE");
    }
}
