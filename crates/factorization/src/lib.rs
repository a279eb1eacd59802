//! # Factorization Crate
//!
//! The computation each worker node runs on its shard: a latent-factor model
//! trained with stochastic gradient descent, then used to rank the items the
//! target user has not rated yet.
//!
//! ## Components
//!
//! - **matrix**: sparse user → item → value matrix with a stable iteration order
//! - **factors**: fixed-dimension latent vectors per id
//! - **engine**: training loop and top-K ranking
//! - **config**: hyper-parameters (F = 3, learning rate 0.01, 10 epochs, K = 5)
//!
//! ## Example Usage
//!
//! ```ignore
//! use factorization::{FactorizationConfig, FactorizationEngine};
//!
//! let engine = FactorizationEngine::new(FactorizationConfig::default().with_seed(42));
//! let top5 = engine.recommend(&shard);
//! ```

pub mod config;
pub mod engine;
pub mod factors;
pub mod matrix;

pub use config::FactorizationConfig;
pub use engine::{FactorizationEngine, TrainedModel, sgd_step};
pub use factors::{LatentFactors, dot};
pub use matrix::RatingMatrix;
