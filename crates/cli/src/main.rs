use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{RatingTable, Recommendation};
use factorization::FactorizationConfig;
use server::{
    AppState, CoordinatorConfig, FanInPolicy, RecommendationOrchestrator, serve_http,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::info;
use worker::{WorkerConfig, WorkerNode};

/// shardrec - distributed matrix-factorization movie recommender
#[derive(Parser)]
#[command(name = "shardrec")]
#[command(about = "Sharded collaborative-filtering recommender: coordinator and worker nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator with its HTTP API
    Serve {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        cluster: ClusterArgs,

        /// Address the HTTP API listens on
        #[arg(long, env = "SHARDREC_HTTP_ADDR", default_value = "0.0.0.0:8080")]
        http_addr: String,
    },

    /// Run a worker node
    Worker {
        /// Address to accept shards on
        #[arg(long, env = "SHARDREC_LISTEN", default_value = "0.0.0.0:9002")]
        listen: String,

        /// Coordinator result endpoint to report to
        #[arg(long, env = "SHARDREC_COORDINATOR", default_value = "127.0.0.1:9002")]
        coordinator: String,

        /// Latent factor dimension
        #[arg(long, env = "SHARDREC_FACTORS", default_value = "3")]
        factors: usize,

        /// Training passes over the shard
        #[arg(long, env = "SHARDREC_EPOCHS", default_value = "10")]
        epochs: usize,

        #[arg(long, env = "SHARDREC_LEARNING_RATE", default_value = "0.01")]
        learning_rate: f64,

        /// Items reported back per request
        #[arg(long, env = "SHARDREC_TOP_K", default_value = "5")]
        top_k: usize,

        /// Fixed seed for reproducible training
        #[arg(long, env = "SHARDREC_SEED")]
        seed: Option<u64>,
    },

    /// Run a single recommendation against the cluster and print it
    Recommend {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        cluster: ClusterArgs,

        /// User ID to get recommendations for
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// Ratings CSV (movieId,userId,rating)
    #[arg(long, env = "SHARDREC_DATA", default_value = "data/ratings.csv")]
    data: PathBuf,

    /// Read at most this many rows, e.g. 2000000; the whole file when omitted
    #[arg(long, env = "SHARDREC_LIMIT")]
    limit: Option<usize>,
}

#[derive(Args)]
struct ClusterArgs {
    /// Worker addresses, comma separated
    #[arg(long, env = "SHARDREC_WORKERS", value_delimiter = ',', required = true)]
    workers: Vec<String>,

    /// Endpoint workers report results to
    #[arg(long, env = "SHARDREC_RESULT_ADDR", default_value = "0.0.0.0:9002")]
    result_addr: String,

    /// Fail a request if workers have not all reported after this many seconds
    #[arg(long, env = "SHARDREC_FAN_IN_TIMEOUT_SECS")]
    fan_in_timeout_secs: Option<u64>,

    /// Stop waiting for workers that could not be reached
    #[arg(long, env = "SHARDREC_REDUCE_ON_DIAL_FAILURE")]
    reduce_on_dial_failure: bool,
}

impl ClusterArgs {
    fn coordinator_config(&self) -> CoordinatorConfig {
        let policy = if self.reduce_on_dial_failure {
            FanInPolicy::SkipFailedDials
        } else {
            FanInPolicy::AwaitAll
        };

        let mut config = CoordinatorConfig::new(self.workers.clone())
            .with_result_listen_addr(self.result_addr.clone())
            .with_fan_in_policy(policy);
        if let Some(secs) = self.fan_in_timeout_secs {
            config = config.with_fan_in_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            dataset,
            cluster,
            http_addr,
        } => handle_serve(dataset, cluster, http_addr).await?,
        Commands::Worker {
            listen,
            coordinator,
            factors,
            epochs,
            learning_rate,
            top_k,
            seed,
        } => {
            let mut factorization = FactorizationConfig::default()
                .with_factors(factors)
                .with_epochs(epochs)
                .with_learning_rate(learning_rate)
                .with_top_k(top_k);
            if let Some(seed) = seed {
                factorization = factorization.with_seed(seed);
            }
            let config = WorkerConfig::default()
                .with_listen_addr(listen)
                .with_coordinator_addr(coordinator)
                .with_factorization(factorization);
            handle_worker(config).await?
        }
        Commands::Recommend {
            dataset,
            cluster,
            user_id,
        } => handle_recommend(dataset, cluster, user_id).await?,
    }

    Ok(())
}

/// Load the rating table; any failure here is fatal
fn load_table(dataset: &DatasetArgs) -> Result<Arc<RatingTable>> {
    println!("Loading ratings from {}...", dataset.data.display());
    let start = Instant::now();
    let table = RatingTable::load_from_csv(&dataset.data, dataset.limit)
        .context("Failed to load ratings dataset")?;
    println!(
        "{} Loaded {} ratings from {} users in {:?}",
        "✓".green(),
        table.rating_count(),
        table.user_count(),
        start.elapsed()
    );
    Ok(Arc::new(table))
}

/// Handle the 'serve' command
async fn handle_serve(dataset: DatasetArgs, cluster: ClusterArgs, http_addr: String) -> Result<()> {
    let table = load_table(&dataset)?;
    let config = cluster.coordinator_config();
    info!(
        "Coordinating {} workers: {}",
        config.node_count(),
        config.worker_addrs.join(", ")
    );

    let state = AppState::new(RecommendationOrchestrator::new(table, config));
    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP address {}", http_addr))?;
    println!("Server running on http://{}", http_addr);

    serve_http(listener, state).await.context("HTTP server failed")
}

/// Handle the 'worker' command
async fn handle_worker(config: WorkerConfig) -> Result<()> {
    let node = WorkerNode::new(config);
    let listener = node.bind().await.context("Failed to start worker")?;
    println!(
        "Worker listening on {}, reporting to {}",
        node.config().listen_addr,
        node.config().coordinator_addr
    );
    node.serve(listener).await.context("Worker stopped")
}

/// Handle the 'recommend' command
async fn handle_recommend(dataset: DatasetArgs, cluster: ClusterArgs, user_id: String) -> Result<()> {
    let table = load_table(&dataset)?;
    let orchestrator = RecommendationOrchestrator::new(table, cluster.coordinator_config());

    let start = Instant::now();
    let recommendations = orchestrator
        .get_recommendations(&user_id)
        .await
        .with_context(|| format!("Failed to get recommendations for user {}", user_id))?;

    print_recommendations(&user_id, &recommendations);
    println!("Computed in {:?}", start.elapsed());
    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(user_id: &str, recommendations: &[Recommendation]) {
    println!("{}", format!("Recommendations for user {}:", user_id).bold().blue());
    if recommendations.is_empty() {
        println!("  {}", "(no recommendations)".yellow());
        return;
    }
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. Movie {} - Predicted rating: {:.2}",
            (i + 1).to_string().green(),
            rec.item_id,
            rec.score
        );
    }
}
