use std::path::Path;

use grove_core::queue::QueueConfig;

use crate::commands::common::{format_timestamp, open_queue};
use crate::error::CliError;

pub fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let queue = open_queue(db_path, QueueConfig::default())?;
    let status = queue.status()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Pending:      {}", status.pending);
    println!("Dead-letters: {}", status.dead_lettered);
    if let Some(oldest) = status.oldest_enqueued_at {
        println!("Oldest entry: {}", format_timestamp(oldest));
    }
    for entry in &status.entries {
        let error = entry
            .last_error
            .as_deref()
            .map(|e| format!("  last error: {e}"))
            .unwrap_or_default();
        println!(
            "  {}  {}  attempts {}{}",
            entry.id, entry.derived_id, entry.attempt_count, error
        );
    }
    Ok(())
}
