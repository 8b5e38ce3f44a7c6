use std::path::Path;

use grove_core::queue::QueueConfig;

use crate::commands::common::{build_validator, load_record, open_queue};
use crate::error::CliError;

pub fn run_enqueue(
    file: &Path,
    require_location: bool,
    required_fields: &[String],
    db_path: &Path,
) -> Result<(), CliError> {
    let record = load_record(file)?;
    build_validator(require_location, required_fields).validate(&record)?;

    let queue = open_queue(db_path, QueueConfig::default())?;
    let entry = queue.enqueue(record)?;
    println!("Enqueued {} as {}", entry.record.derived_id, entry.id);
    Ok(())
}
