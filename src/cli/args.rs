//! CLI argument definitions using clap
//!
//! Commands:
//! - versionfu init --config <path>
//! - versionfu entities --config <path>
//! - versionfu history <entity> --config <path>
//! - versionfu latest <entity> --config <path>
//! - versionfu show <entity> <sequence> --config <path>
//! - versionfu verify --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// versionfu - inspect a record version journal
#[derive(Parser, Debug)]
#[command(name = "versionfu")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the journal directory layout
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },

    /// List entity ids that have history
    Entities {
        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },

    /// Print every snapshot of an entity, oldest first
    History {
        entity: String,

        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },

    /// Print the newest snapshot of an entity
    Latest {
        entity: String,

        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },

    /// Print one snapshot by sequence number
    Show {
        entity: String,
        sequence: u64,

        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },

    /// Scan the whole journal and verify every checksum
    Verify {
        /// Path to configuration file
        #[arg(long, default_value = "./versionfu.json")]
        config: PathBuf,
    },
}

impl Command {
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Command::Init { config }
            | Command::Entities { config }
            | Command::History { config, .. }
            | Command::Latest { config, .. }
            | Command::Show { config, .. }
            | Command::Verify { config } => config,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
