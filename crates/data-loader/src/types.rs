//! Core domain types shared by the coordinator and the worker nodes.
//!
//! Identifiers are kept as opaque strings: the dataset, the wire protocol and
//! the HTTP boundary all treat user and movie ids as text, and nothing in the
//! pipeline does arithmetic on them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a user as it appears in the dataset
pub type UserId = String;

/// Identifier of a rated item (a movie)
pub type ItemId = String;

// =============================================================================
// Rating Types
// =============================================================================

/// A single rating from a user for an item.
///
/// Ratings are immutable once created; shards and matrices clone them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

impl Rating {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, value: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            value,
        }
    }
}

/// The rating subset assigned to one worker node for one request.
///
/// Every shard carries the complete history of `target_user_id` plus a
/// disjoint slice of everybody else's ratings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetShard {
    pub target_user_id: UserId,
    pub ratings: Vec<Rating>,
}

impl DatasetShard {
    pub fn new(target_user_id: impl Into<UserId>) -> Self {
        Self {
            target_user_id: target_user_id.into(),
            ratings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// A scored item, produced by a worker and merged by the coordinator.
///
/// The serde names match the JSON contract of the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "MovieID")]
    pub item_id: ItemId,
    #[serde(rename = "Rating")]
    pub score: f64,
}

impl Recommendation {
    pub fn new(item_id: impl Into<ItemId>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

// =============================================================================
// RatingTable - the in-memory dataset
// =============================================================================

/// All ratings grouped by the user who made them.
///
/// Per-user vectors keep the order in which ratings were inserted.
#[derive(Debug, Clone, Default)]
pub struct RatingTable {
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
}

impl RatingTable {
    /// Creates a new, empty table
    pub fn new() -> Self {
        Self {
            user_ratings: HashMap::new(),
        }
    }

    /// Insert a rating under its user
    pub fn insert(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id.clone())
            .or_default()
            .push(rating);
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user is unknown
    pub fn get_user_ratings(&self, user_id: &str) -> &[Rating] {
        self.user_ratings
            .get(user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_ratings.contains_key(user_id)
    }

    /// Iterate over `(user, ratings)` pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &Vec<Rating>)> {
        self.user_ratings.iter()
    }

    pub fn user_count(&self) -> usize {
        self.user_ratings.len()
    }

    pub fn rating_count(&self) -> usize {
        self.user_ratings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ratings.is_empty()
    }
}

impl FromIterator<Rating> for RatingTable {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        let mut table = RatingTable::new();
        for rating in iter {
            table.insert(rating);
        }
        table
    }
}
