use std::path::Path;

use grove_core::queue::QueueConfig;

use crate::commands::common::open_queue;
use crate::error::CliError;

pub fn run_purge(confirmed: bool, db_path: &Path) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::PurgeNotConfirmed);
    }

    let queue = open_queue(db_path, QueueConfig::default())?;
    let dropped = queue.purge()?;
    println!("Dropped {dropped} pending entries.");
    Ok(())
}
