//! SGD Matrix Factorization - per-worker training and ranking
//!
//! ## Algorithm
//! 1. Build the sparse rating matrix from the shard
//! 2. Give every user and item a random vector in `[0, 1)^F`
//! 3. For each epoch, visit every observed rating once in matrix order and
//!    apply a sequential gradient step (user first, then item using the
//!    freshly updated user vector)
//! 4. Score every item the target user has not rated by the dot product of
//!    the two vectors and keep the K best
//!
//! The update order in step 3 is asymmetric on purpose; changing it changes
//! every ranking the workers produce.

use crate::config::FactorizationConfig;
use crate::factors::{LatentFactors, dot};
use crate::matrix::RatingMatrix;
use data_loader::{DatasetShard, Recommendation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// User and item vectors learned from one shard
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub users: LatentFactors,
    pub items: LatentFactors,
    /// Root mean squared training error observed during each epoch
    pub epoch_rmse: Vec<f64>,
}

/// Apply one sequential SGD step and return the prediction error.
///
/// `user` is updated from the untouched `item`, then `item` is updated from
/// the already-updated `user`.
pub fn sgd_step(user: &mut [f64], item: &mut [f64], value: f64, learning_rate: f64) -> f64 {
    let error = value - dot(user, item);
    for (u, i) in user.iter_mut().zip(item.iter()) {
        *u += learning_rate * error * i;
    }
    for (i, u) in item.iter_mut().zip(user.iter()) {
        *i += learning_rate * error * u;
    }
    error
}

/// Trains latent factors on a shard and ranks items for its target user
#[derive(Debug, Clone, Default)]
pub struct FactorizationEngine {
    config: FactorizationConfig,
}

impl FactorizationEngine {
    pub fn new(config: FactorizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactorizationConfig {
        &self.config
    }

    /// Run the whole worker computation for one shard
    #[instrument(skip(self, shard), fields(target = %shard.target_user_id, ratings = shard.ratings.len()))]
    pub fn recommend(&self, shard: &DatasetShard) -> Vec<Recommendation> {
        let matrix = RatingMatrix::from_ratings(&shard.ratings);
        let model = self.train(&matrix);
        let top = self.rank_unseen(&model, &matrix, &shard.target_user_id);

        info!(
            "Ranked top {} of {} items for user {}",
            top.len(),
            model.items.len(),
            shard.target_user_id
        );
        top
    }

    /// Train with a generator seeded from the config
    pub fn train(&self, matrix: &RatingMatrix) -> TrainedModel {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.train_with_rng(matrix, &mut rng)
    }

    pub fn train_with_rng<R: Rng>(&self, matrix: &RatingMatrix, rng: &mut R) -> TrainedModel {
        let dim = self.config.factors;
        let mut users = LatentFactors::random(matrix.user_ids(), dim, rng);
        let mut items = LatentFactors::random(matrix.item_ids(), dim, rng);

        let observed = matrix.len();
        let mut epoch_rmse = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let mut squared_error = 0.0;
            for (user_id, item_id, value) in matrix.entries() {
                // Both lookups succeed: every id in the matrix was initialised above.
                if let (Some(user), Some(item)) = (users.get_mut(user_id), items.get_mut(item_id)) {
                    let error = sgd_step(user, item, value, self.config.learning_rate);
                    squared_error += error * error;
                }
            }

            let rmse = if observed > 0 {
                (squared_error / observed as f64).sqrt()
            } else {
                0.0
            };
            debug!("Epoch {}/{} done, rmse={:.4}", epoch + 1, self.config.epochs, rmse);
            epoch_rmse.push(rmse);
        }

        TrainedModel {
            users,
            items,
            epoch_rmse,
        }
    }

    /// Score every item `target_user_id` has not rated and keep the best K.
    ///
    /// Equal scores keep item order. A target without a vector scores every
    /// item as zero.
    pub fn rank_unseen(
        &self,
        model: &TrainedModel,
        matrix: &RatingMatrix,
        target_user_id: &str,
    ) -> Vec<Recommendation> {
        let target = model.users.get(target_user_id);

        let candidates: Vec<&String> = matrix
            .item_ids()
            .into_iter()
            .filter(|item_id| !matrix.has_rated(target_user_id, item_id))
            .collect();

        let mut scored: Vec<Recommendation> = candidates
            .par_iter()
            .filter_map(|item_id| {
                let item = model.items.get(item_id)?;
                let score = target.map_or(0.0, |target| dot(target, item));
                Some(Recommendation::new(item_id.as_str(), score))
            })
            .collect();

        // Stable sort keeps first-seen order for ties.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.config.top_k);
        scored
    }
}
