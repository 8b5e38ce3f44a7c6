use std::path::Path;

use crate::commands::common::{build_validator, load_record};
use crate::error::CliError;

pub fn run_validate(
    file: &Path,
    require_location: bool,
    required_fields: &[String],
) -> Result<(), CliError> {
    let record = load_record(file)?;
    build_validator(require_location, required_fields).validate(&record)?;
    println!("{} is valid.", record.derived_id);
    Ok(())
}
