//! # Recommendation Orchestrator
//!
//! This module drives one recommendation request through the cluster:
//! 1. Partition the rating table into one shard per worker
//! 2. Open the result endpoint
//! 3. Send every shard to its worker, one after the other
//! 4. Wait on the fan-in barrier while handlers merge incoming rankings
//! 5. Finalize the global ranking and return it
//!
//! Runs are serialized: every run binds the same result port, and a run's
//! reducer only lives for that run.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use data_loader::{DatasetShard, RatingTable, Recommendation};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::{CoordinatorConfig, FanInPolicy};
use crate::distributor::distribute;
use crate::error::{CoordinatorError, Result};
use crate::fan_in::FanIn;
use crate::partitioner::partition;
use crate::reducer::AggregationReducer;

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Partitioned,
    Distributed,
    Awaiting(usize),
    Finalized,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Init => write!(f, "INIT"),
            RunPhase::Partitioned => write!(f, "PARTITIONED"),
            RunPhase::Distributed => write!(f, "DISTRIBUTED"),
            RunPhase::Awaiting(n) => write!(f, "AWAITING({})", n),
            RunPhase::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Coordinator for the partition → distribute → train → aggregate pipeline
pub struct RecommendationOrchestrator {
    table: Arc<RatingTable>,
    config: Arc<CoordinatorConfig>,
    run_lock: Mutex<()>,
}

impl RecommendationOrchestrator {
    pub fn new(table: Arc<RatingTable>, config: CoordinatorConfig) -> Self {
        Self {
            table,
            config: Arc::new(config),
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn table(&self) -> &RatingTable {
        &self.table
    }

    /// Main entry point: compute the top-R ranking for `user_id`
    pub async fn get_recommendations(&self, user_id: &str) -> Result<Vec<Recommendation>> {
        let _run = self.run_lock.lock().await;
        self.run(user_id, None).await
    }

    /// Same as [`get_recommendations`](Self::get_recommendations), but with a
    /// result endpoint that is already bound
    pub async fn get_recommendations_with_listener(
        &self,
        user_id: &str,
        listener: TcpListener,
    ) -> Result<Vec<Recommendation>> {
        let _run = self.run_lock.lock().await;
        self.run(user_id, Some(listener)).await
    }

    #[instrument(skip(self, listener))]
    async fn run(&self, user_id: &str, listener: Option<TcpListener>) -> Result<Vec<Recommendation>> {
        let start_time = Instant::now();
        let nodes = self.config.node_count();
        debug!("Run for user {} entered {}", user_id, RunPhase::Init);

        let shards = self.partition(user_id, nodes).await?;
        debug!("Run for user {} entered {}", user_id, RunPhase::Partitioned);

        // Listen before sending anything so no worker can report too early
        let listener = match listener {
            Some(listener) => listener,
            None => self.bind_result_endpoint().await?,
        };

        let report = distribute(&shards, &self.config.worker_addrs).await;
        if report.sent < nodes {
            warn!(
                "Shards delivered to {}/{} workers (unreachable: {:?}, interrupted: {:?})",
                report.sent, nodes, report.dial_failures, report.write_failures
            );
        }
        debug!("Run for user {} entered {}", user_id, RunPhase::Distributed);

        let expected = match self.config.fan_in_policy {
            FanInPolicy::AwaitAll => nodes,
            FanInPolicy::SkipFailedDials => nodes.saturating_sub(report.dial_failures.len()),
        };
        debug!("Run for user {} entered {}", user_id, RunPhase::Awaiting(expected));

        let reducer = Arc::new(AggregationReducer::new(
            self.config.intermediate_capacity,
            self.config.final_size,
        ));
        let fan_in = FanIn::new(expected).with_timeout(self.config.fan_in_timeout);
        fan_in.collect(&listener, reducer.clone()).await?;

        let recommendations = reducer.finalize().await;
        debug!("Run for user {} entered {}", user_id, RunPhase::Finalized);

        info!(
            "Total time to get recommendations for user {}: {:.2?}",
            user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    async fn partition(&self, user_id: &str, nodes: usize) -> Result<Vec<DatasetShard>> {
        let table = self.table.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || partition(&table, &user_id, nodes)).await?
    }

    async fn bind_result_endpoint(&self) -> Result<TcpListener> {
        let addr = &self.config.result_listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| CoordinatorError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Listening for worker results on {}", addr);
        Ok(listener)
    }
}
