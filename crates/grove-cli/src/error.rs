use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] grove_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record rejected: {0}")]
    Validation(#[from] grove_core::validate::ValidationError),
    #[error("Could not determine a data directory; pass --db-path")]
    NoDataDir,
    #[error("Refusing to purge without --yes")]
    PurgeNotConfirmed,
}
