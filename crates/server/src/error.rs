//! Coordinator error types.
//!
//! Transport failures with individual workers never show up here: they are
//! logged where they happen and only reduce what gets merged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The requested user has no ratings in the table
    #[error("No data found for user {0}")]
    UserNotFound(String),

    /// No worker addresses are configured
    #[error("No worker nodes configured")]
    NoWorkers,

    /// The result endpoint could not be opened
    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Not every expected worker reported back in time
    #[error("Timed out waiting for worker results ({completed}/{expected} completed)")]
    FanInTimedOut { completed: usize, expected: usize },

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
