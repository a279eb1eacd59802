//! Dataset partitioner.
//!
//! Splits the rating table into one shard per worker node. Each shard gets a
//! full copy of the target user's history; every other rating goes to
//! exactly one shard, dealt round-robin as the other users are traversed.

use data_loader::{DatasetShard, RatingTable};
use tracing::{debug, info, instrument};

use crate::error::{CoordinatorError, Result};

#[instrument(skip(table), fields(users = table.user_count()))]
pub fn partition(table: &RatingTable, target_user_id: &str, nodes: usize) -> Result<Vec<DatasetShard>> {
    if nodes == 0 {
        return Err(CoordinatorError::NoWorkers);
    }
    if !table.contains_user(target_user_id) {
        return Err(CoordinatorError::UserNotFound(target_user_id.to_string()));
    }

    let history = table.get_user_ratings(target_user_id);
    let mut shards: Vec<DatasetShard> = (0..nodes)
        .map(|_| DatasetShard {
            target_user_id: target_user_id.to_string(),
            ratings: history.to_vec(),
        })
        .collect();

    let mut counter = 0usize;
    for (user_id, ratings) in table.iter() {
        if user_id == target_user_id {
            continue;
        }
        for rating in ratings {
            shards[counter % nodes].ratings.push(rating.clone());
            counter += 1;
        }
    }

    info!(
        "Partitioned {} foreign ratings across {} shards ({} target ratings each)",
        counter,
        nodes,
        history.len()
    );
    for (i, shard) in shards.iter().enumerate() {
        debug!("Shard {} holds {} ratings", i, shard.len());
    }

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;

    fn key(r: &Rating) -> (String, String) {
        (r.user_id.clone(), r.item_id.clone())
    }

    fn sample_table() -> RatingTable {
        let mut ratings = Vec::new();
        for user in 1..=6 {
            for item in 0..(user + 2) {
                ratings.push(Rating::new(
                    format!("u{user}"),
                    format!("m{item}"),
                    ((user + item) % 5 + 1) as f64,
                ));
            }
        }
        ratings.into_iter().collect()
    }

    #[test]
    fn test_partition_completeness_and_disjointness() {
        let table = sample_table();
        for nodes in 1..=4 {
            let shards = partition(&table, "u3", nodes).unwrap();
            assert_eq!(shards.len(), nodes);

            let history: Vec<(String, String)> =
                table.get_user_ratings("u3").iter().map(key).collect();

            let mut foreign: Vec<(String, String)> = Vec::new();
            for shard in &shards {
                assert_eq!(shard.target_user_id, "u3");
                let own: Vec<(String, String)> = shard
                    .ratings
                    .iter()
                    .filter(|r| r.user_id == "u3")
                    .map(key)
                    .collect();
                assert_eq!(own, history, "every shard carries the whole target history");

                foreign.extend(shard.ratings.iter().filter(|r| r.user_id != "u3").map(key));
            }

            let mut expected: Vec<(String, String)> = table
                .iter()
                .filter(|(user, _)| user.as_str() != "u3")
                .flat_map(|(_, ratings)| ratings.iter().map(key))
                .collect();

            foreign.sort();
            expected.sort();
            // Equal as sorted multisets: nothing lost, nothing duplicated.
            assert_eq!(foreign, expected);
        }
    }

    #[test]
    fn test_partition_is_balanced() {
        let table = sample_table();
        let shards = partition(&table, "u1", 3).unwrap();
        let foreign: Vec<usize> = shards
            .iter()
            .map(|s| s.ratings.iter().filter(|r| r.user_id != "u1").count())
            .collect();

        let max = foreign.iter().max().unwrap();
        let min = foreign.iter().min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn test_unknown_user_fails() {
        let table = sample_table();
        let err = partition(&table, "nobody", 3).unwrap_err();
        assert!(matches!(err, CoordinatorError::UserNotFound(ref u) if u == "nobody"));
    }

    #[test]
    fn test_zero_nodes_fails() {
        let table = sample_table();
        assert!(matches!(partition(&table, "u1", 0), Err(CoordinatorError::NoWorkers)));
    }

    #[test]
    fn test_single_node_gets_everything() {
        let table: RatingTable = vec![
            Rating::new("u1", "a", 5.0),
            Rating::new("u1", "b", 3.0),
            Rating::new("u1", "c", 4.0),
            Rating::new("u2", "a", 4.0),
            Rating::new("u2", "d", 2.0),
            Rating::new("u2", "e", 1.0),
            Rating::new("u3", "b", 3.5),
            Rating::new("u3", "f", 4.5),
            Rating::new("u3", "g", 2.5),
        ]
        .into_iter()
        .collect();

        let shards = partition(&table, "u1", 1).unwrap();
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].len(), 9);
    }
}
