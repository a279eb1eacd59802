//! Aggregation reducer - merges per-node rankings into one global ranking
//!
//! The reducer owns the global ranking ("GlobalTop") and guards it with a
//! single lock; every merge and the final truncation run under that lock.
//!
//! ## Merge rule
//! Every score received for an item is kept as a running `(sum, count)`
//! pair, so an item's average is always the mean of all its samples, never
//! an average of averages. After each merge the ranking is rebuilt, sorted
//! descending and cut to M entries; items that fall off are forgotten along
//! with their samples.
//!
//! Merging the same batch twice is not idempotent: each call adds samples.

use std::collections::{HashMap, HashSet};

use data_loader::{ItemId, Recommendation};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default bound M on the intermediate ranking
pub const DEFAULT_INTERMEDIATE_CAPACITY: usize = 15;

/// Default length R of the final ranking
pub const DEFAULT_FINAL_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScoreSamples {
    sum: f64,
    count: u32,
}

impl ScoreSamples {
    fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Debug, Default)]
struct GlobalTop {
    samples: HashMap<ItemId, ScoreSamples>,
    ranking: Vec<Recommendation>,
}

impl GlobalTop {
    /// Re-rank every tracked item and keep the best `limit`
    fn rebuild(&mut self, limit: usize) {
        let mut ranking: Vec<Recommendation> = self
            .samples
            .iter()
            .map(|(item_id, samples)| Recommendation::new(item_id.as_str(), samples.average()))
            .collect();

        sort_ranking(&mut ranking);
        ranking.truncate(limit);

        let kept: HashSet<&str> = ranking.iter().map(|r| r.item_id.as_str()).collect();
        self.samples.retain(|item_id, _| kept.contains(item_id.as_str()));
        self.ranking = ranking;
    }
}

/// Descending by score; item id breaks ties so equal inputs rank equally.
fn sort_ranking(ranking: &mut [Recommendation]) {
    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

/// Shared, lock-protected global ranking for one orchestration run
#[derive(Debug)]
pub struct AggregationReducer {
    capacity: usize,
    final_size: usize,
    state: Mutex<GlobalTop>,
}

impl Default for AggregationReducer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERMEDIATE_CAPACITY, DEFAULT_FINAL_SIZE)
    }
}

impl AggregationReducer {
    /// `capacity` is the intermediate bound M, `final_size` the output length R
    pub fn new(capacity: usize, final_size: usize) -> Self {
        Self {
            capacity,
            final_size,
            state: Mutex::new(GlobalTop::default()),
        }
    }

    /// Fold one node's ranking into the global one.
    ///
    /// Returns the size of the global ranking afterwards.
    pub async fn merge(&self, results: &[Recommendation]) -> usize {
        let mut top = self.state.lock().await;
        for rec in results {
            if !rec.score.is_finite() {
                warn!("Ignoring non-finite score {} for item {}", rec.score, rec.item_id);
                continue;
            }
            top.samples.entry(rec.item_id.clone()).or_default().add(rec.score);
        }
        top.rebuild(self.capacity);

        debug!(
            "Merged {} results, global ranking now holds {} items",
            results.len(),
            top.ranking.len()
        );
        top.ranking.len()
    }

    /// Cut the global ranking to R entries and return it.
    ///
    /// Scores are re-read from the retained samples and any repeated item is
    /// collapsed into its first (highest-ranked) position.
    pub async fn finalize(&self) -> Vec<Recommendation> {
        let mut top = self.state.lock().await;

        let mut seen: HashSet<ItemId> = HashSet::new();
        let mut finalized: Vec<Recommendation> = Vec::with_capacity(self.final_size);
        for rec in &top.ranking {
            if finalized.len() == self.final_size {
                break;
            }
            if !seen.insert(rec.item_id.clone()) {
                continue;
            }
            let score = top
                .samples
                .get(&rec.item_id)
                .map(ScoreSamples::average)
                .unwrap_or(rec.score);
            finalized.push(Recommendation::new(rec.item_id.as_str(), score));
        }

        top.samples.retain(|item_id, _| seen.contains(item_id));
        top.ranking = finalized.clone();

        info!("Final top {}: {:?}", finalized.len(), finalized);
        finalized
    }

    /// Current global ranking
    pub async fn snapshot(&self) -> Vec<Recommendation> {
        self.state.lock().await.ranking.clone()
    }

    /// Number of samples retained for an item, if it is still ranked
    pub async fn sample_count(&self, item_id: &str) -> Option<u32> {
        self.state.lock().await.samples.get(item_id).map(|s| s.count)
    }
}
