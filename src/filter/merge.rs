//! Cross-shard merging of mined patterns.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::core::model::{Pattern, Token};

/// Sum the supports of identical patterns.
///
/// The result is sorted by descending support, ties by token order, so it
/// does not depend on the order in which shards were merged.
pub fn merge_patterns<I>(patterns: I) -> Vec<Pattern>
where
    I: IntoIterator<Item = Pattern>,
{
    let mut totals: IndexMap<Vec<Token>, usize> = IndexMap::new();
    for pattern in patterns {
        *totals.entry(pattern.tokens).or_insert(0) += pattern.support;
    }

    let mut merged: Vec<Pattern> = totals
        .into_iter()
        .map(|(tokens, support)| Pattern::new(tokens, support))
        .collect();
    merged.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.tokens.cmp(&b.tokens)));
    merged
}

/// Per-shard mining results.
///
/// Storing a shard again replaces its earlier patterns, so a re-run shard is
/// never counted twice in [`ShardResults::merged`].
#[derive(Debug, Clone, Default)]
pub struct ShardResults {
    shards: BTreeMap<String, Vec<Pattern>>,
}

impl ShardResults {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the patterns of `shard`, returning what it held before.
    pub fn insert(&mut self, shard: impl Into<String>, patterns: Vec<Pattern>) -> Option<Vec<Pattern>> {
        self.shards.insert(shard.into(), patterns)
    }

    /// Patterns stored for `shard`.
    pub fn get(&self, shard: &str) -> Option<&[Pattern]> {
        self.shards.get(shard).map(Vec::as_slice)
    }

    /// Shard ids in sorted order.
    pub fn shard_ids(&self) -> impl Iterator<Item = &str> {
        self.shards.keys().map(String::as_str)
    }

    /// Number of stored shards.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// True when no shard is stored.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// All shards merged by [`merge_patterns`].
    pub fn merged(&self) -> Vec<Pattern> {
        merge_patterns(self.shards.values().flatten().cloned())
    }
}
