//! Shared helpers for queue commands

use std::path::{Path, PathBuf};

use grove_core::db::Database;
use grove_core::models::{FieldRecord, QueueEntry};
use grove_core::queue::QueueConfig;
use grove_core::validate::RecordValidator;
use grove_core::UploadQueue;

use crate::error::CliError;

/// Resolve the queue database path: explicit flag, or the platform data dir.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join("grove").join("queue.db"))
        .ok_or(CliError::NoDataDir)
}

/// Open the queue over the database at `db_path`.
pub fn open_queue(db_path: &Path, config: QueueConfig) -> Result<UploadQueue, CliError> {
    let db = Database::open(db_path)?;
    Ok(UploadQueue::new(db, config))
}

/// Load a field record from a JSON file.
pub fn load_record(path: &Path) -> Result<FieldRecord, CliError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Build a validator from the command-line requirements.
pub fn build_validator(require_location: bool, required_fields: &[String]) -> RecordValidator {
    let mut validator = RecordValidator::new();
    if require_location {
        validator = validator.with_required_location();
    }
    for field in required_fields {
        validator = validator.with_required_field(field.clone());
    }
    validator
}

/// Human-readable lines for queue entries.
pub fn format_entry_lines(entries: &[QueueEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let when = format_timestamp(entry.enqueued_at);
            let error = entry
                .last_error
                .as_deref()
                .map(|e| format!("  last error: {e}"))
                .unwrap_or_default();
            format!(
                "{}  {}  enqueued {}  attempts {}{}",
                entry.id, entry.record.derived_id, when, entry.attempt_count, error
            )
        })
        .collect()
}

/// Unix-ms timestamp as a UTC string.
pub fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms).map_or_else(
        || format!("@{ms}"),
        |ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
