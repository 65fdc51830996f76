use thiserror::Error;

/// Errors raised while building or writing the legacy CSV files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// A station has no elevation, so its metadata row would be malformed
    #[error("Station {0} has no elevation")]
    MissingElevation(String),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;
