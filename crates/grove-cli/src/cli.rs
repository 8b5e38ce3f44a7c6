use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Inspect and operate the Grove offline upload queue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local queue database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a captured record and append it to the queue
    Enqueue {
        /// Path to a field record JSON file
        file: PathBuf,
        /// Reject records without a GPS fix
        #[arg(long)]
        require_location: bool,
        /// Payload field that must be present and non-empty (repeatable)
        #[arg(long = "require", value_name = "FIELD")]
        required_fields: Vec<String>,
    },
    /// List pending queue entries, oldest first
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show queue delivery status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drain pending entries into a local content-addressed store
    Drain {
        /// Directory of the content store
        #[arg(long, value_name = "DIR")]
        store: PathBuf,
        /// Dead-letter entries after this many failed attempts
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List dead-lettered entries
    DeadLetters {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop every pending entry
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
    /// Validate a record file without enqueuing it
    Validate {
        /// Path to a field record JSON file
        file: PathBuf,
        /// Reject records without a GPS fix
        #[arg(long)]
        require_location: bool,
        /// Payload field that must be present and non-empty (repeatable)
        #[arg(long = "require", value_name = "FIELD")]
        required_fields: Vec<String>,
    },
}
