//! Partitioning of diff records into independently mined shards.

use std::collections::BTreeMap;

use crate::core::config::ShardBy;
use crate::core::model::DiffRecord;

/// Shard id for records without a merge timestamp.
pub const UNKNOWN_SHARD: &str = "unknown";
/// Shard id when sharding is disabled.
pub const SINGLE_SHARD: &str = "all";

/// A disjoint slice of the training records.
#[derive(Debug, Clone)]
pub struct Shard {
    /// Stable identifier, e.g. `2019`
    pub id: String,
    /// Records owned by this shard
    pub records: Vec<DiffRecord>,
}

/// Split `records` into shards ordered by id.
pub fn partition_records(records: Vec<DiffRecord>, shard_by: ShardBy) -> Vec<Shard> {
    let mut shards: BTreeMap<String, Vec<DiffRecord>> = BTreeMap::new();
    for record in records {
        let id = match shard_by {
            ShardBy::None => SINGLE_SHARD.to_string(),
            ShardBy::Year => record
                .year()
                .map_or_else(|| UNKNOWN_SHARD.to_string(), |year| year.to_string()),
        };
        shards.entry(id).or_default().push(record);
    }
    shards
        .into_iter()
        .map(|(id, records)| Shard { id, records })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(year: Option<i32>) -> DiffRecord {
        DiffRecord {
            file_name: Some("a.py".to_string()),
            merged_at: year.map(|y| Utc.with_ymd_and_hms(y, 6, 1, 0, 0, 0).unwrap()),
            condition: vec!["x = 1".to_string()],
            consequent: vec!["x = 2".to_string()],
        }
    }

    #[test]
    fn year_sharding_groups_and_orders() {
        let shards = partition_records(
            vec![record(Some(2020)), record(None), record(Some(2019)), record(Some(2020))],
            ShardBy::Year,
        );
        let ids: Vec<_> = shards.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2019", "2020", "unknown"]);
        assert_eq!(shards[1].records.len(), 2);
    }

    #[test]
    fn single_shard_keeps_everything() {
        let shards = partition_records(vec![record(Some(2020)), record(None)], ShardBy::None);
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].id, SINGLE_SHARD);
        assert_eq!(shards[0].records.len(), 2);
    }

    #[test]
    fn empty_input_yields_no_shards() {
        assert!(partition_records(Vec::new(), ShardBy::Year).is_empty());
    }
}
