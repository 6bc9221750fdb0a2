//! Removal of patterns wholly contained in a longer kept pattern.

use crate::core::model::Pattern;

/// Keep the most specific patterns.
///
/// Patterns are visited longest first (sum of rendered token lengths, stable
/// for ties) and kept unless they are an order-preserving sub-sequence of a
/// pattern already kept. The result is in visiting order.
pub fn prune_redundant(mut patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns.sort_by_key(|pattern| std::cmp::Reverse(pattern.total_len()));

    let mut kept: Vec<Pattern> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if kept.iter().any(|other| pattern.is_subsequence_of(other)) {
            continue;
        }
        kept.push(pattern);
    }
    kept
}
