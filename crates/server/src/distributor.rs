//! Sequential shard distribution to the worker nodes.
//!
//! Workers are dialed one after the other. A worker that cannot be reached
//! or that drops the connection mid-batch is logged and skipped; nothing is
//! retried and the remaining workers are still served.

use data_loader::DatasetShard;
use protocol::write_rating_batch;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// What happened while handing shards out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionReport {
    /// Workers that received their complete shard
    pub sent: usize,
    /// Workers that could not be dialed
    pub dial_failures: Vec<String>,
    /// Workers that were dialed but failed while the shard was being written
    pub write_failures: Vec<String>,
}

/// Send `shards[i]` to `worker_addrs[i]` for every pair.
#[instrument(skip_all, fields(workers = worker_addrs.len()))]
pub async fn distribute(shards: &[DatasetShard], worker_addrs: &[String]) -> DistributionReport {
    let mut report = DistributionReport::default();

    for (addr, shard) in worker_addrs.iter().zip(shards) {
        let mut stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Error connecting to worker {}: {}", addr, e);
                report.dial_failures.push(addr.clone());
                continue;
            }
        };

        let sent = async {
            write_rating_batch(&mut stream, shard).await?;
            stream.shutdown().await?;
            Ok::<_, protocol::ProtocolError>(())
        }
        .await;

        match sent {
            Ok(()) => {
                info!("Sent {} ratings to {}", shard.len(), addr);
                report.sent += 1;
            }
            Err(e) => {
                warn!("Error sending shard to {}: {}", addr, e);
                report.write_failures.push(addr.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;
    use protocol::read_rating_batch;
    use tokio::io::BufReader;
    use tokio::net::TcpListener;

    async fn closed_port_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn test_distribute_sends_each_shard_to_its_worker() {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let second = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addrs = vec![
            first.local_addr().unwrap().to_string(),
            second.local_addr().unwrap().to_string(),
        ];

        let shards = vec![
            DatasetShard {
                target_user_id: "7".to_string(),
                ratings: vec![Rating::new("7", "1", 4.0)],
            },
            DatasetShard {
                target_user_id: "7".to_string(),
                ratings: vec![Rating::new("7", "1", 4.0), Rating::new("8", "2", 3.5)],
            },
        ];

        let receive = |listener: TcpListener| async move {
            let (stream, _) = listener.accept().await.unwrap();
            read_rating_batch(BufReader::new(stream)).await.unwrap()
        };
        let first_rx = tokio::spawn(receive(first));
        let second_rx = tokio::spawn(receive(second));

        let report = distribute(&shards, &addrs).await;
        assert_eq!(report.sent, 2);
        assert!(report.dial_failures.is_empty());

        assert_eq!(first_rx.await.unwrap(), shards[0]);
        assert_eq!(second_rx.await.unwrap(), shards[1]);
    }

    #[tokio::test]
    async fn test_distribute_skips_unreachable_worker() {
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = closed_port_addr().await;
        let addrs = vec![dead.clone(), live.local_addr().unwrap().to_string()];
        let shards = vec![DatasetShard::new("7"), DatasetShard::new("7")];

        let rx = tokio::spawn(async move {
            let (stream, _) = live.accept().await.unwrap();
            read_rating_batch(BufReader::new(stream)).await.unwrap()
        });

        let report = distribute(&shards, &addrs).await;
        assert_eq!(report.sent, 1);
        assert_eq!(report.dial_failures, vec![dead]);
        assert_eq!(rx.await.unwrap().target_user_id, "7");
    }
}
