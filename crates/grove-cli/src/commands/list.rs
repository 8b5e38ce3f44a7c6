use std::path::Path;

use grove_core::queue::QueueConfig;

use crate::commands::common::{format_entry_lines, open_queue};
use crate::error::CliError;

pub fn run_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let queue = open_queue(db_path, QueueConfig::default())?;
    let mut entries = queue.entries()?;
    entries.truncate(limit);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    for line in format_entry_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}
