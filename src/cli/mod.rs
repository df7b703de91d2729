//! CLI module for versionfu
//!
//! Inspection of a version journal:
//! - init: create the journal layout (the only command that writes)
//! - entities / history / latest / show: query snapshots, read-only
//! - verify: full checksum scan, read-only

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
