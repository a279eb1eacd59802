//! # Data Loader Crate
//!
//! Domain types shared across the coordinator and the worker nodes, and the
//! CSV loader that builds the in-memory rating table at startup.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, DatasetShard, Recommendation, RatingTable)
//! - **parser**: Parse the ratings CSV into Rust structs
//! - **index**: Build a RatingTable from a file
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::RatingTable;
//! use std::path::Path;
//!
//! let table = RatingTable::load_from_csv(Path::new("data/ratings.csv"), Some(2_000_000))?;
//! println!("User 7 rated {} movies", table.get_user_ratings("7").len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    // Core types
    Rating,
    DatasetShard,
    Recommendation,
    RatingTable,
};
