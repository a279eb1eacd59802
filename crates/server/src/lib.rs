//! Coordinator crate for the sharded recommendation engine.
//!
//! ## Main Components
//!
//! - **partitioner**: split the rating table into one shard per worker
//! - **distributor**: send shards to workers over the node protocol
//! - **fan_in**: fixed-count barrier that accepts and merges worker results
//! - **reducer**: lock-protected global ranking with (sum, count) averaging
//! - **orchestrator**: drives a run through all of the above
//! - **api**: axum HTTP boundary
//!
//! ## Example Usage
//!
//! ```ignore
//! use server::{CoordinatorConfig, RecommendationOrchestrator};
//!
//! let config = CoordinatorConfig::new(vec!["10.0.0.2:9002".into(), "10.0.0.3:9002".into()]);
//! let orchestrator = RecommendationOrchestrator::new(Arc::new(table), config);
//! let top = orchestrator.get_recommendations("7").await?;
//! ```

pub mod api;
pub mod config;
pub mod distributor;
pub mod error;
pub mod fan_in;
pub mod orchestrator;
pub mod partitioner;
pub mod reducer;

pub use api::{create_router, serve_http, ApiError, AppState, RecommendResponse};
pub use config::{CoordinatorConfig, FanInPolicy};
pub use distributor::{distribute, DistributionReport};
pub use error::{CoordinatorError, Result};
pub use fan_in::{FanIn, FanInReport};
pub use orchestrator::{RecommendationOrchestrator, RunPhase};
pub use partitioner::partition;
pub use reducer::{AggregationReducer, DEFAULT_FINAL_SIZE, DEFAULT_INTERMEDIATE_CAPACITY};
