//! Fan-in barrier over the result endpoint.
//!
//! Accepts worker connections on one listener and spawns a handler per
//! connection that parses the result batch and merges it into the reducer.
//! Accepting and handling run side by side. The barrier releases once
//! `expected` handlers have completed, whether they merged a batch or failed;
//! an accept failure counts as a completed (failed) handler too.
//!
//! Without a timeout the barrier waits forever. With one, expiry aborts the
//! outstanding handlers and fails the run.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use protocol::read_result_batch;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoordinatorError, Result};
use crate::reducer::AggregationReducer;

/// Counts at the moment the barrier released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanInReport {
    /// Handlers that finished, successfully or not
    pub completed: usize,
    /// Handlers whose batch was merged
    pub merged: usize,
    /// Recommendations merged across all handlers
    pub recommendations: usize,
    /// Handlers that could not read a batch, plus failed accepts
    pub failed: usize,
}

#[derive(Debug)]
enum HandlerOutcome {
    Merged(usize),
    Failed,
}

/// Fixed-count barrier for one orchestration run
#[derive(Debug, Clone, Copy)]
pub struct FanIn {
    expected: usize,
    timeout: Option<Duration>,
}

impl FanIn {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Accept and merge until `expected` handlers have completed.
    #[instrument(skip_all, fields(expected = self.expected))]
    pub async fn collect(
        &self,
        listener: &TcpListener,
        reducer: Arc<AggregationReducer>,
    ) -> Result<FanInReport> {
        let mut report = FanInReport::default();
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut handlers: JoinSet<HandlerOutcome> = JoinSet::new();
        let mut accepted = 0usize;

        while report.completed < self.expected {
            tokio::select! {
                conn = listener.accept(), if accepted < self.expected => {
                    accepted += 1;
                    match conn {
                        Ok((stream, peer)) => {
                            info!("Accepted result connection from {}", peer);
                            handlers.spawn(handle_result_connection(stream, peer, reducer.clone()));
                        }
                        Err(e) => {
                            warn!("Failed to accept result connection: {}", e);
                            report.completed += 1;
                            report.failed += 1;
                        }
                    }
                }
                Some(joined) = handlers.join_next() => {
                    report.completed += 1;
                    match joined {
                        Ok(HandlerOutcome::Merged(count)) => {
                            report.merged += 1;
                            report.recommendations += count;
                        }
                        Ok(HandlerOutcome::Failed) => report.failed += 1,
                        Err(e) => {
                            warn!("Result handler task failed: {}", e);
                            report.failed += 1;
                        }
                    }
                    debug!("{}/{} result handlers completed", report.completed, self.expected);
                }
                _ = expire(deadline) => {
                    handlers.abort_all();
                    warn!(
                        "Fan-in timed out with {}/{} handlers completed",
                        report.completed, self.expected
                    );
                    return Err(CoordinatorError::FanInTimedOut {
                        completed: report.completed,
                        expected: self.expected,
                    });
                }
            }
        }

        info!(
            "All {} result handlers completed ({} merged with {} recommendations, {} failed)",
            report.completed, report.merged, report.recommendations, report.failed
        );
        Ok(report)
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn handle_result_connection(
    stream: TcpStream,
    peer: SocketAddr,
    reducer: Arc<AggregationReducer>,
) -> HandlerOutcome {
    match read_result_batch(BufReader::new(stream)).await {
        Ok(results) => {
            let size = reducer.merge(&results).await;
            debug!("Merged {} results from {}, global ranking holds {}", results.len(), peer, size);
            HandlerOutcome::Merged(results.len())
        }
        Err(e) => {
            warn!("Failed to read results from {}: {}", peer, e);
            HandlerOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Recommendation;
    use protocol::write_result_batch;
    use tokio::io::AsyncWriteExt;

    async fn send_results(addr: SocketAddr, recs: Vec<Recommendation>) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_result_batch(&mut stream, &recs).await.unwrap();
        stream.shutdown().await.unwrap();
    }

    /// Send half a line, then abort the connection with a reset
    #[allow(deprecated)]
    async fn send_then_reset(addr: SocketAddr) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"A,4.0").await.unwrap();
        stream.set_linger(Some(Duration::ZERO)).unwrap();
        drop(stream);
    }

    #[tokio::test]
    async fn test_collect_merges_every_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reducer = Arc::new(AggregationReducer::default());

        for score in [4.0, 2.0] {
            tokio::spawn(send_results(addr, vec![Recommendation::new("A", score)]));
        }

        let report = FanIn::new(2).collect(&listener, reducer.clone()).await.unwrap();
        assert_eq!(
            report,
            FanInReport {
                completed: 2,
                merged: 2,
                recommendations: 2,
                failed: 0
            }
        );
        assert_eq!(reducer.snapshot().await, vec![Recommendation::new("A", 3.0)]);
    }

    #[tokio::test]
    async fn test_failed_handler_still_counts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reducer = Arc::new(AggregationReducer::default());

        send_results(addr, vec![Recommendation::new("A", 4.0)]).await;
        // A reset mid-batch fails that handler (or its accept); either counts
        send_then_reset(addr).await;

        let report = FanIn::new(2).collect(&listener, reducer.clone()).await.unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(report.merged, 1);
        assert_eq!(report.recommendations, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_zero_expected_returns_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let reducer = Arc::new(AggregationReducer::default());

        let report = FanIn::new(0).collect(&listener, reducer).await.unwrap();
        assert_eq!(report, FanInReport::default());
    }

    #[tokio::test]
    async fn test_timeout_when_worker_never_reports() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reducer = Arc::new(AggregationReducer::default());

        tokio::spawn(send_results(addr, vec![Recommendation::new("A", 4.0)]));

        let err = FanIn::new(2)
            .with_timeout(Some(Duration::from_millis(300)))
            .collect(&listener, reducer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::FanInTimedOut { completed: 1, expected: 2 }
        ));
    }
}
