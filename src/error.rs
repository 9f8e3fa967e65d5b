//! Custom error types and result handling for Hondana operations.
//!
//! This module defines the error handling system used throughout Hondana.
//! All fallible operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! Missing cover or content files are *not* errors: they are counted in the
//! [`ExportReport`](crate::types::ExportReport) and logged, and the export continues.
use std::path::PathBuf;

/// Type alias for Results with Hondana errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Hondana operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Template compilation or rendering errors
    #[error(transparent)]
    Template(#[from] upon::Error),
    /// Hugo front matter serialization errors
    #[error(transparent)]
    Toml(#[from] toml::ser::Error),
    #[error(transparent)]
    HondanaBuilder(#[from] crate::hondana::HondanaConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// The library metadata file (or another required resource) is missing
    #[error("Not found: {0}")]
    NotFound(String),
    /// The metadata file exists but is not a JSON array of objects
    #[error("Malformed metadata: {0}")]
    MalformedData(String),
    /// Post-export check failed (output missing or empty)
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}
