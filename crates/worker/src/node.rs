//! Worker node - receives a shard, trains, reports its top-K
//!
//! ## Flow per inbound connection
//! 1. Read a rating batch until the coordinator closes its write side
//! 2. Run the factorization engine on a blocking thread
//! 3. Dial the coordinator's result endpoint and send the ranking plus
//!    the `FIN_TOP5` sentinel
//!
//! A batch that cannot be read still gets an (empty) reply so the
//! coordinator's fan-in count is reached.

use std::sync::Arc;

use data_loader::{DatasetShard, Recommendation};
use factorization::FactorizationEngine;
use protocol::{ProtocolError, read_rating_batch, write_result_batch};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, instrument, warn};

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};

/// A worker node bound to one coordinator
#[derive(Clone)]
pub struct WorkerNode {
    config: Arc<WorkerConfig>,
    engine: Arc<FactorizationEngine>,
}

impl WorkerNode {
    pub fn new(config: WorkerConfig) -> Self {
        let engine = FactorizationEngine::new(config.factorization.clone());
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Bind the configured listen address
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|source| WorkerError::Bind {
                addr: self.config.listen_addr.clone(),
                source,
            })
    }

    /// Accept shards forever, one task per connection.
    ///
    /// Accept failures are logged and the loop keeps going.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        match listener.local_addr() {
            Ok(addr) => info!("Worker listening on {}", addr),
            Err(e) => warn!("Worker listening on unknown address: {}", e),
        }

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let node = self.clone();
            tokio::spawn(async move {
                info!("Receiving shard from {}", peer);
                if let Err(e) = node.handle_connection(stream).await {
                    error!("Shard from {} was not answered: {}", peer, e);
                }
            });
        }
    }

    /// Handle one shard end to end and return how many items were reported
    #[instrument(skip(self, stream))]
    pub async fn handle_connection(&self, stream: TcpStream) -> Result<usize> {
        let top = match read_rating_batch(BufReader::new(stream)).await {
            Ok(shard) => self.train(shard).await?,
            Err(ProtocolError::MissingTargetUser) => {
                warn!("Rating batch had no target user, replying with an empty result");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read rating batch ({}), replying with an empty result", e);
                Vec::new()
            }
        };

        self.report(&top).await?;
        Ok(top.len())
    }

    async fn train(&self, shard: DatasetShard) -> Result<Vec<Recommendation>> {
        info!(
            "Training on {} ratings for target user {}",
            shard.ratings.len(),
            shard.target_user_id
        );
        let engine = self.engine.clone();
        let top = tokio::task::spawn_blocking(move || engine.recommend(&shard)).await?;
        Ok(top)
    }

    /// Send a result batch to the coordinator
    pub async fn report(&self, top: &[Recommendation]) -> Result<()> {
        let addr = &self.config.coordinator_addr;
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| WorkerError::Connect {
                addr: addr.clone(),
                source,
            })?;

        write_result_batch(&mut stream, top).await?;
        stream.shutdown().await.map_err(ProtocolError::from)?;

        info!("Sent {} recommendations to {}", top.len(), addr);
        Ok(())
    }
}
