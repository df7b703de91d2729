//! Versioning configuration
//!
//! Loaded from a JSON file. Only `data_dir` is required; everything else
//! has a default. The file is validated once on load and rejected as a
//! whole on any problem.
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "exclusions": ["updated_at", "view_count"],
//!   "references": [
//!     {"kind": "creator", "id_field": "creator_id", "type_source": {"fixed": "User"}},
//!     {"kind": "author", "id_field": "whodunnit_id", "type_source": {"field": "whodunnit_type"}}
//!   ],
//!   "skip_unchanged": true
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::RecordStore;
use crate::identity::{ReferenceKind, ReferenceResolver, ReferenceSlot};
use crate::journal::{JournalError, JournalVersionStore};
use crate::observability::MetricsRegistry;
use crate::versioning::{
    ExclusionSpec, SnapshotEngine, VersionStore, Versioner, VersioningPolicy,
    DEFAULT_MAX_CONFLICT_RETRIES,
};

/// Upper bound on `max_conflict_retries`.
pub const MAX_CONFLICT_RETRIES_LIMIT: u32 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VFU_CONFIG_READ_FAILED: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("VFU_CONFIG_PARSE_FAILED: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("VFU_CONFIG_INVALID: {0}")]
    Invalid(String),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "VFU_CONFIG_READ_FAILED",
            ConfigError::Parse(_) => "VFU_CONFIG_PARSE_FAILED",
            ConfigError::Invalid(_) => "VFU_CONFIG_INVALID",
            ConfigError::Journal(e) => e.code(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Directory holding `versions/journal.dat` (required)
    pub data_dir: String,

    /// Fields never captured in snapshots
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Creator / author reference slots
    #[serde(default = "default_references")]
    pub references: Vec<ReferenceSlot>,

    /// Skip the snapshot when no versioned field changed
    #[serde(default)]
    pub skip_unchanged: bool,

    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_references() -> Vec<ReferenceSlot> {
    vec![
        ReferenceSlot::fixed(ReferenceKind::Creator, "creator_id", "User"),
        ReferenceSlot::fixed(ReferenceKind::Author, "author_id", "User"),
    ]
}

fn default_max_conflict_retries() -> u32 {
    DEFAULT_MAX_CONFLICT_RETRIES
}

fn default_log_filter() -> String {
    "versionfu=info".to_string()
}

impl VersioningConfig {
    /// Config with defaults for everything but the data directory.
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            exclusions: Vec::new(),
            references: default_references(),
            skip_unchanged: false,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            log_filter: default_log_filter(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: VersioningConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        for kind in [ReferenceKind::Creator, ReferenceKind::Author] {
            let count = self.references.iter().filter(|s| s.kind == kind).count();
            if count > 1 {
                return Err(ConfigError::Invalid(format!(
                    "{} reference declared {} times",
                    kind.as_str(),
                    count
                )));
            }
        }

        for slot in &self.references {
            if slot.fields().iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "{} reference has an empty field name",
                    slot.kind.as_str()
                )));
            }
        }

        if self.max_conflict_retries > MAX_CONFLICT_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_conflict_retries must be <= {}",
                MAX_CONFLICT_RETRIES_LIMIT
            )));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn policy(&self) -> VersioningPolicy {
        self.references.iter().cloned().fold(
            VersioningPolicy::new(ExclusionSpec::new(self.exclusions.iter()))
                .with_skip_unchanged(self.skip_unchanged),
            VersioningPolicy::with_reference,
        )
    }

    /// Opens the durable version store under `data_dir`.
    pub fn open_journal(&self, metrics: Arc<MetricsRegistry>) -> ConfigResult<JournalVersionStore> {
        Ok(JournalVersionStore::open(self.data_path())?.with_metrics(metrics))
    }

    /// Wires a `Versioner` from this configuration.
    pub fn versioner(
        &self,
        resolver: Arc<dyn ReferenceResolver>,
        records: Arc<dyn RecordStore>,
        versions: Arc<dyn VersionStore>,
    ) -> Versioner {
        let engine = SnapshotEngine::new(self.policy(), resolver);
        Versioner::new(engine, records, versions)
            .with_max_conflict_retries(self.max_conflict_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::TypeSource;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = VersioningConfig::from_json(r#"{"data_dir": "/tmp/vfu"}"#).unwrap();
        assert!(config.exclusions.is_empty());
        assert!(!config.skip_unchanged);
        assert_eq!(config.max_conflict_retries, DEFAULT_MAX_CONFLICT_RETRIES);
        assert_eq!(config.log_filter, "versionfu=info");

        let policy = config.policy();
        let author = policy.reference(ReferenceKind::Author).unwrap();
        assert_eq!(author.id_field, "author_id");
        assert_eq!(author.type_source, TypeSource::Fixed("User".into()));
        assert!(policy.reference(ReferenceKind::Creator).is_some());
    }

    #[test]
    fn test_polymorphic_reference_parses() {
        let config = VersioningConfig::from_json(
            r#"{
                "data_dir": "d",
                "exclusions": ["updated_at"],
                "references": [
                    {"kind": "author", "id_field": "whodunnit_id", "type_source": {"field": "whodunnit_type"}}
                ]
            }"#,
        )
        .unwrap();

        let policy = config.policy();
        assert!(policy.exclusions().contains("updated_at"));
        assert!(policy.reference(ReferenceKind::Creator).is_none());
        assert_eq!(
            policy.reference(ReferenceKind::Author).unwrap().fields(),
            vec!["whodunnit_id", "whodunnit_type"]
        );
    }

    #[test]
    fn test_missing_data_dir_is_parse_error() {
        let err = VersioningConfig::from_json("{}").unwrap_err();
        assert_eq!(err.code(), "VFU_CONFIG_PARSE_FAILED");
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let err = VersioningConfig::from_json(r#"{"data_dir": "  "}"#).unwrap_err();
        assert_eq!(err.code(), "VFU_CONFIG_INVALID");
    }

    #[test]
    fn test_duplicate_reference_kind_rejected() {
        let mut config = VersioningConfig::new("d");
        config
            .references
            .push(ReferenceSlot::fixed(ReferenceKind::Author, "editor_id", "User"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_reference_field_rejected() {
        let mut config = VersioningConfig::new("d");
        config.references = vec![ReferenceSlot::polymorphic(ReferenceKind::Author, "author_id", "")];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty field name"));
    }

    #[test]
    fn test_retry_limit_enforced() {
        let mut config = VersioningConfig::new("d");
        config.max_conflict_retries = MAX_CONFLICT_RETRIES_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = VersioningConfig::load(Path::new("/nonexistent/versionfu.json")).unwrap_err();
        assert_eq!(err.code(), "VFU_CONFIG_READ_FAILED");
    }
}
