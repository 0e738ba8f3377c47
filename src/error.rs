//! Error types for the ETL core.
//!
//! The pipelines themselves work with `anyhow::Result` and attach context as
//! they go. The ingestion and output boundaries return [`EtlError`] so callers
//! can tell operational faults apart:
//!
//! ```
//! use sparkify_lake::error::EtlError;
//!
//! fn report(err: &EtlError) -> &'static str {
//!     match err {
//!         EtlError::Read(_) => "input could not be read",
//!         EtlError::Write(_) => "output could not be written",
//!         EtlError::Config(_) => "configuration is incomplete",
//!         _ => "other failure",
//!     }
//! }
//!
//! assert_eq!(report(&EtlError::Read("song_data".to_owned())), "input could not be read");
//! ```
//!
//! A log event that finds no matching song is *not* an error. Inner joins drop
//! it silently and nothing in this module represents that case.

use std::fmt;

/// Main error type for ETL operations.
#[derive(Debug)]
pub enum EtlError {
    /// I/O errors not attributed to a specific dataset or table
    Io(std::io::Error),

    /// Raw input could not be listed, opened or parsed
    Read(String),

    /// An output table could not be written
    Write(String),

    /// Failure inside the dataframe engine
    Engine(String),

    /// Missing or malformed configuration
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Read(msg) => write!(f, "Read error: {msg}"),
            Self::Write(msg) => write!(f, "Write error: {msg}"),
            Self::Engine(msg) => write!(f, "Engine error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EtlError {}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<polars::error::PolarsError> for EtlError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Engine(err.to_string())
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<walkdir::Error> for EtlError {
    fn from(err: walkdir::Error) -> Self {
        Self::Read(err.to_string())
    }
}

/// Result type alias for ETL boundary operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait that files an error under the read or write side of the
/// run, prefixed with what was being touched.
pub trait ResultExt<T> {
    /// Classify a failure as a read fault.
    fn read_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Classify a failure as a write fault.
    fn write_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EtlError>,
{
    fn read_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: EtlError = e.into();
            EtlError::Read(format!("{}: {}", f(), err))
        })
    }

    fn write_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: EtlError = e.into();
            EtlError::Write(format!("{}: {}", f(), err))
        })
    }
}
