//! Worker crate: the node process that trains on one shard per request.
//!
//! The coordinator dials a worker, streams a rating batch and closes its
//! write side. The worker trains a latent-factor model on that shard, then
//! dials the coordinator back and reports its top-K ranking.

pub mod config;
pub mod error;
pub mod node;

pub use config::{DEFAULT_NODE_PORT, WorkerConfig};
pub use error::{Result, WorkerError};
pub use node::WorkerNode;
