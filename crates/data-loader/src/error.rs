//! Error types for the data-loader crate.
//!
//! Loading the rating table happens once at process startup, so every
//! variant here is treated as a fatal configuration error by the binary.

use thiserror::Error;

/// Errors that can occur while loading and parsing the rating dataset
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// The CSV header does not name a required column
    #[error("Missing column '{column}' in header of {file}")]
    MissingColumn { file: String, column: String },

    /// The file parsed cleanly but held no ratings
    #[error("No ratings found in {0}")]
    EmptyDataset(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
