use std::path::Path;

use grove_core::queue::QueueConfig;
use serde::Serialize;

use crate::commands::common::{format_timestamp, open_queue};
use crate::error::CliError;

#[derive(Serialize)]
struct DeadItem {
    id: String,
    derived_id: String,
    attempt_count: u32,
    last_error: Option<String>,
    dead_since: i64,
}

pub fn run_dead_letters(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let queue = open_queue(db_path, QueueConfig::default())?;
    let dead = queue.dead_letters()?;

    if as_json {
        let items: Vec<DeadItem> = dead
            .iter()
            .map(|item| DeadItem {
                id: item.entry.id.to_string(),
                derived_id: item.entry.record.derived_id.clone(),
                attempt_count: item.entry.attempt_count,
                last_error: item.entry.last_error.clone(),
                dead_since: item.dead_since,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if dead.is_empty() {
        println!("No dead-lettered entries.");
        return Ok(());
    }

    for item in &dead {
        let error = item
            .entry
            .last_error
            .as_deref()
            .map(|e| format!("  last error: {e}"))
            .unwrap_or_default();
        println!(
            "{}  {}  parked {}  attempts {}{}",
            item.entry.id,
            item.entry.record.derived_id,
            format_timestamp(item.dead_since),
            item.entry.attempt_count,
            error
        );
    }
    Ok(())
}
