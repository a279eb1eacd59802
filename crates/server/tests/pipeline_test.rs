//! End-to-end runs of the coordinator against real worker nodes on loopback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use data_loader::{DatasetShard, Rating, RatingTable, Recommendation};
use factorization::{FactorizationConfig, FactorizationEngine};
use server::{CoordinatorConfig, CoordinatorError, FanInPolicy, RecommendationOrchestrator};
use tokio::net::TcpListener;
use worker::{WorkerConfig, WorkerNode};

const SEED: u64 = 42;

fn ratings() -> Vec<Rating> {
    vec![
        Rating::new("u1", "m1", 5.0),
        Rating::new("u1", "m2", 3.0),
        Rating::new("u1", "m3", 4.0),
        Rating::new("u2", "m1", 4.0),
        Rating::new("u2", "m4", 5.0),
        Rating::new("u2", "m5", 2.0),
        Rating::new("u3", "m2", 3.5),
        Rating::new("u3", "m6", 4.5),
        Rating::new("u3", "m7", 1.0),
    ]
}

fn table() -> Arc<RatingTable> {
    Arc::new(ratings().into_iter().collect())
}

/// Start a seeded worker reporting to `coordinator_addr`
async fn start_worker(coordinator_addr: &str) -> String {
    let config = WorkerConfig::default()
        .with_listen_addr("127.0.0.1:0")
        .with_coordinator_addr(coordinator_addr)
        .with_factorization(FactorizationConfig::default().with_seed(SEED));

    let node = WorkerNode::new(config);
    let listener = node.bind().await.expect("Failed to bind worker");
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(node.serve(listener));
    addr
}

async fn closed_port_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Scores as they come back over the wire
fn wire_rounded(score: f64) -> f64 {
    format!("{:.2}", score).parse().unwrap()
}

#[tokio::test]
async fn test_single_worker_result_truncated_to_final_size() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result_addr = listener.local_addr().unwrap().to_string();
    let worker_addr = start_worker(&result_addr).await;

    let orchestrator =
        RecommendationOrchestrator::new(table(), CoordinatorConfig::new(vec![worker_addr]));
    let top = orchestrator
        .get_recommendations_with_listener("u1", listener)
        .await
        .unwrap();

    // With one node the shard is the whole table, so the engine run locally
    // on the same data and seed predicts what the worker reports.
    let engine = FactorizationEngine::new(FactorizationConfig::default().with_seed(SEED));
    let local = engine.recommend(&DatasetShard {
        target_user_id: "u1".to_string(),
        ratings: ratings(),
    });
    assert_eq!(local.len(), 4);

    let local_scores: HashMap<String, f64> = local
        .iter()
        .map(|r| (r.item_id.clone(), wire_rounded(r.score)))
        .collect();
    let mut expected_scores: Vec<f64> = local_scores.values().copied().collect();
    expected_scores.sort_by(|a, b| b.partial_cmp(a).unwrap());
    expected_scores.truncate(3);

    assert_eq!(top.len(), 3);
    let scores: Vec<f64> = top.iter().map(|r| r.score).collect();
    assert_eq!(scores, expected_scores);
    for rec in &top {
        assert_eq!(local_scores.get(&rec.item_id), Some(&rec.score));
    }
}

#[tokio::test]
async fn test_three_workers_produce_a_sorted_final_ranking() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result_addr = listener.local_addr().unwrap().to_string();

    let mut workers = Vec::new();
    for _ in 0..3 {
        workers.push(start_worker(&result_addr).await);
    }

    let orchestrator = RecommendationOrchestrator::new(table(), CoordinatorConfig::new(workers));
    let top = orchestrator
        .get_recommendations_with_listener("u1", listener)
        .await
        .unwrap();

    assert!(!top.is_empty() && top.len() <= 3);
    assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(top.iter().all(|r| !["m1", "m2", "m3"].contains(&r.item_id.as_str())));

    let mut ids: Vec<&str> = top.iter().map(|r| r.item_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), top.len());
}

#[tokio::test]
async fn test_skip_failed_dials_finishes_without_dead_worker() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result_addr = listener.local_addr().unwrap().to_string();
    let live = start_worker(&result_addr).await;
    let dead = closed_port_addr().await;

    let config = CoordinatorConfig::new(vec![dead, live])
        .with_fan_in_policy(FanInPolicy::SkipFailedDials);
    let orchestrator = RecommendationOrchestrator::new(table(), config);

    let top: Vec<Recommendation> = orchestrator
        .get_recommendations_with_listener("u1", listener)
        .await
        .unwrap();
    assert!(!top.is_empty());
}

#[tokio::test]
async fn test_await_all_times_out_on_dead_worker() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result_addr = listener.local_addr().unwrap().to_string();
    let live = start_worker(&result_addr).await;
    let dead = closed_port_addr().await;

    let config = CoordinatorConfig::new(vec![dead, live])
        .with_fan_in_timeout(Duration::from_secs(2));
    let orchestrator = RecommendationOrchestrator::new(table(), config);

    let err = orchestrator
        .get_recommendations_with_listener("u1", listener)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::FanInTimedOut { completed: 1, expected: 2 }
    ));
}

#[tokio::test]
async fn test_unknown_user_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let worker = closed_port_addr().await;
    let orchestrator = RecommendationOrchestrator::new(table(), CoordinatorConfig::new(vec![worker]));

    let err = orchestrator
        .get_recommendations_with_listener("u404", listener)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No data found for user u404");
}
