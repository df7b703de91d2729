//! CLI command implementations
//!
//! Every command loads and validates the configuration first. Query
//! commands scan the journal through a read-only store: the file is never
//! created, opened for writing or appended to.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::config::VersioningConfig;
use crate::entity::EntityId;
use crate::journal::{journal_path, JournalVersionStore, JOURNAL_DIR};
use crate::observability::{self, Event, MetricsRegistry};
use crate::versioning::{VersionSeq, VersionStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and print the JSON envelope.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let result = VersioningConfig::load(cli.command.config_path())
        .map_err(CliError::from)
        .and_then(|config| {
            observability::init_logging(&config.log_filter);
            info!(
                event = %Event::ConfigLoaded,
                data_dir = %config.data_dir,
                "configuration loaded"
            );
            execute(&cli.command, &config)
        });

    match result {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(e)
        }
    }
}

/// Loads the command's configuration and runs it.
pub fn run_command(cmd: &Command) -> CliResult<Value> {
    let config = VersioningConfig::load(cmd.config_path())?;
    execute(cmd, &config)
}

fn execute(cmd: &Command, config: &VersioningConfig) -> CliResult<Value> {
    match cmd {
        Command::Init { .. } => init(config),
        Command::Entities { .. } => entities(config),
        Command::History { entity, .. } => history(config, entity),
        Command::Latest { entity, .. } => latest(config, entity),
        Command::Show {
            entity, sequence, ..
        } => show(config, entity, *sequence),
        Command::Verify { .. } => verify(config),
    }
}

/// Creates `<data_dir>/versions/journal.dat`, empty.
fn init(config: &VersioningConfig) -> CliResult<Value> {
    let data_dir = config.data_path();
    let path = journal_path(data_dir);

    if path.exists() {
        return Err(CliError::AlreadyInitialized(path.display().to_string()));
    }

    fs::create_dir_all(data_dir.join(JOURNAL_DIR))?;
    let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
    file.sync_all()?;

    Ok(json!({
        "initialized": true,
        "journal": path.display().to_string()
    }))
}

fn open_existing(config: &VersioningConfig) -> CliResult<JournalVersionStore> {
    let data_dir: &Path = config.data_path();
    let path = journal_path(data_dir);
    if !path.exists() {
        return Err(CliError::NotInitialized(path.display().to_string()));
    }
    let store = JournalVersionStore::open_read_only(data_dir)?;
    Ok(store.with_metrics(Arc::new(MetricsRegistry::new())))
}

fn entities(config: &VersioningConfig) -> CliResult<Value> {
    let store = open_existing(config)?;
    let ids = store.entities()?;
    Ok(json!({ "entities": ids }))
}

fn history(config: &VersioningConfig, entity: &str) -> CliResult<Value> {
    let store = open_existing(config)?;
    let id = EntityId::new(entity);
    let snapshots = store.history(&id)?;
    if snapshots.is_empty() {
        return Err(CliError::NotFound(format!("no history for entity '{}'", id)));
    }
    Ok(json!({
        "entity_id": id,
        "snapshots": snapshots
    }))
}

fn latest(config: &VersioningConfig, entity: &str) -> CliResult<Value> {
    let store = open_existing(config)?;
    let id = EntityId::new(entity);
    match store.latest(&id)? {
        Some(snapshot) => Ok(serde_json::to_value(snapshot)?),
        None => Err(CliError::NotFound(format!("no history for entity '{}'", id))),
    }
}

fn show(config: &VersioningConfig, entity: &str, sequence: u64) -> CliResult<Value> {
    let store = open_existing(config)?;
    let id = EntityId::new(entity);
    match store.get(&id, VersionSeq::new(sequence))? {
        Some(snapshot) => Ok(serde_json::to_value(snapshot)?),
        None => Err(CliError::NotFound(format!(
            "entity '{}' has no version {}",
            id, sequence
        ))),
    }
}

/// Full scan. Opening the store already verifies every checksum and the
/// sequence order of every chain.
fn verify(config: &VersioningConfig) -> CliResult<Value> {
    let store = open_existing(config)?;
    let bytes = fs::metadata(journal_path(config.data_path()))?.len();

    Ok(json!({
        "verified": true,
        "entities": store.entities()?.len(),
        "snapshots": store.snapshot_count()?,
        "bytes": bytes
    }))
}
