//! Building a [`RatingTable`] from the dataset file.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::RatingTable;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

impl RatingTable {
    /// Load the rating table from a CSV file.
    ///
    /// This is the main entry point used at startup. `limit` caps the number
    /// of data rows read (the first `limit` rows win).
    pub fn load_from_csv(path: &Path, limit: Option<usize>) -> Result<Self> {
        info!("Loading ratings from {:?}", path);

        let file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let ratings = parser::parse_ratings(BufReader::new(file), &name, limit)?;
        let table: RatingTable = ratings.into_iter().collect();
        table.ensure_not_empty(&name)?;

        info!(
            "Loaded {} ratings from {} users",
            table.rating_count(),
            table.user_count()
        );
        Ok(table)
    }

    fn ensure_not_empty(&self, name: &str) -> Result<()> {
        if self.is_empty() {
            return Err(DataLoadError::EmptyDataset(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        let err = RatingTable::load_from_csv(Path::new("does/not/exist.csv"), None).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ratings-{}.csv", std::process::id()));
        std::fs::write(&path, "movieId,userId,rating\n1,7,4.5\n2,7,3.0\n1,8,5.0\n").unwrap();

        let table = RatingTable::load_from_csv(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.user_count(), 2);
        assert_eq!(table.rating_count(), 3);
        assert_eq!(table.get_user_ratings("7").len(), 2);
    }

    #[test]
    fn test_header_only_file_is_empty_dataset() {
        let path = std::env::temp_dir().join(format!("ratings-empty-{}.csv", std::process::id()));
        std::fs::write(&path, "movieId,userId,rating\n").unwrap();

        let err = RatingTable::load_from_csv(&path, None).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, DataLoadError::EmptyDataset(_)));
    }
}
