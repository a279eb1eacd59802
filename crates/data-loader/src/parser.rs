//! Parser for the rating CSV file.
//!
//! Expected layout: a header row naming at least the `movieId`, `userId` and
//! `rating` columns (in any order, extra columns are ignored), followed by
//! one rating per line:
//!
//! ```text
//! movieId,userId,rating
//! 1,7,4.5
//! ```

use crate::error::{DataLoadError, Result};
use crate::types::Rating;
use rayon::prelude::*;
use std::io::Read;

const ITEM_COLUMN: &str = "movieId";
const USER_COLUMN: &str = "userId";
const RATING_COLUMN: &str = "rating";

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    item: usize,
    user: usize,
    rating: usize,
}

impl Columns {
    fn width(&self) -> usize {
        self.item.max(self.user).max(self.rating) + 1
    }
}

fn resolve_columns(header: &str, file: &str) -> Result<Columns> {
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let find = |column: &str| {
        names
            .iter()
            .position(|name| *name == column)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            })
    };

    Ok(Columns {
        item: find(ITEM_COLUMN)?,
        user: find(USER_COLUMN)?,
        rating: find(RATING_COLUMN)?,
    })
}

fn parse_line(line: &str, line_no: usize, columns: Columns, file: &str) -> Result<Rating> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < columns.width() {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!(
                "expected at least {} fields but found {}",
                columns.width(),
                fields.len()
            ),
        });
    }

    let value = fields[columns.rating]
        .parse::<f64>()
        .map_err(|e| DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!("Invalid rating: {}", e),
        })?;

    Ok(Rating::new(fields[columns.user], fields[columns.item], value))
}

/// Parse ratings from any reader.
///
/// `file` only labels error messages. When `limit` is set, data rows after
/// the first `limit` are ignored. Rows are parsed in parallel but returned in
/// file order.
pub fn parse_ratings<R: Read>(mut reader: R, file: &str, limit: Option<usize>) -> Result<Vec<Rating>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    let mut lines = content.lines().enumerate();
    let columns = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, header)) => break resolve_columns(header, file)?,
            None => return Err(DataLoadError::EmptyDataset(file.to_string())),
        }
    };

    let rows: Vec<(usize, &str)> = lines
        .filter(|(_, line)| !line.trim().is_empty())
        .take(limit.unwrap_or(usize::MAX))
        .map(|(idx, line)| (idx + 1, line))
        .collect();

    rows.par_iter()
        .map(|&(line_no, line)| parse_line(line, line_no, columns, file))
        .collect()
}
