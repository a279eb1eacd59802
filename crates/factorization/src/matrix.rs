//! Sparse user → item → value matrix built from a shard.
//!
//! Users and items are kept in sorted order so that initialisation, training
//! and ranking visit them in the same sequence on every run. Combined with a
//! fixed seed this makes a worker's output reproducible.

use data_loader::{ItemId, Rating, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// Observed ratings of one shard, indexed for training.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    rows: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
}

impl RatingMatrix {
    /// Build the matrix. A repeated (user, item) pair keeps the last value.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut rows: BTreeMap<UserId, BTreeMap<ItemId, f64>> = BTreeMap::new();
        for rating in ratings {
            rows.entry(rating.user_id.clone())
                .or_default()
                .insert(rating.item_id.clone(), rating.value);
        }
        Self { rows }
    }

    /// Distinct users, sorted
    pub fn user_ids(&self) -> impl Iterator<Item = &UserId> {
        self.rows.keys()
    }

    /// Distinct items across all users, sorted
    pub fn item_ids(&self) -> BTreeSet<&ItemId> {
        self.rows.values().flat_map(|items| items.keys()).collect()
    }

    /// Every observed `(user, item, value)` triple in matrix order
    pub fn entries(&self) -> impl Iterator<Item = (&UserId, &ItemId, f64)> {
        self.rows
            .iter()
            .flat_map(|(user, items)| items.iter().map(move |(item, value)| (user, item, *value)))
    }

    pub fn has_rated(&self, user_id: &str, item_id: &str) -> bool {
        self.rows
            .get(user_id)
            .is_some_and(|items| items.contains_key(item_id))
    }

    pub fn user_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored cells (after de-duplication)
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
