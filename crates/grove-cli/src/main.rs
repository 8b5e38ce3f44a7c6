//! Grove CLI - operate the offline capture queue from the terminal
//!
//! Records captured in the field land in a durable SQLite-backed queue;
//! this tool inspects that queue, replays it into a content-addressed
//! store, and validates record files before they enter it.

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::CliError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = commands::common::resolve_db_path(cli.db_path)?;
    tracing::debug!(db = %db_path.display(), "using queue database");

    match cli.command {
        Commands::Enqueue {
            file,
            require_location,
            required_fields,
        } => commands::enqueue::run_enqueue(&file, require_location, &required_fields, &db_path),
        Commands::List { limit, json } => commands::list::run_list(limit, json, &db_path),
        Commands::Status { json } => commands::status::run_status(json, &db_path),
        Commands::Drain {
            store,
            max_attempts,
            json,
        } => commands::drain::run_drain(&store, max_attempts, json, &db_path).await,
        Commands::DeadLetters { json } => commands::dead_letters::run_dead_letters(json, &db_path),
        Commands::Purge { yes } => commands::purge::run_purge(yes, &db_path),
        Commands::Validate {
            file,
            require_location,
            required_fields,
        } => commands::validate::run_validate(&file, require_location, &required_fields),
    }
}
