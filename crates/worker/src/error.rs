//! Error types for the worker node.

use protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to bind worker listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to coordinator at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Training task failed: {0}")]
    Training(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
