/// Error types for the CDEC snow crates
use thiserror::Error;

/// Main error type for CDEC operations
#[derive(Error, Debug)]
pub enum CdecError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// CDEC answered with a non-success status
    #[error("CDEC returned status {status} for {url}")]
    ResponseStatus { status: u16, url: String },

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Failed to parse the station search result page
    #[error("Failed to parse station search results: {0}")]
    StationSearch(String),

    /// Boundary file could not be read or holds no polygon
    #[error("Failed to load boundary {path}: {reason}")]
    Boundary { path: String, reason: String },

    /// Boundary coordinate system could not be resolved or applied
    #[error("Projection error: {0}")]
    Projection(String),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using CdecError
pub type Result<T> = std::result::Result<T, CdecError>;
