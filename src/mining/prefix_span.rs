//! PrefixSpan sequential pattern miner.
//!
//! Every order-preserving (not necessarily contiguous) sub-sequence occurring
//! in at least `min_support` corpus sequences is reported with its support.
//! Expansion is depth-first over projected databases, driven by an explicit
//! stack so pathological corpora cannot exhaust the call stack.

use std::rc::Rc;
use std::time::Instant;

use ahash::{AHashMap, AHashSet};

use crate::core::errors::{FixmineError, Result};
use crate::core::model::{Pattern, Token, TokenSequence};

/// Output of one mining run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiningOutcome {
    /// Frequent patterns in discovery order
    pub patterns: Vec<Pattern>,
    /// Input sequences longer than the length ceiling, left unmined
    pub oversized: Vec<TokenSequence>,
}

/// Suffixes of corpus sequences still to be searched.
type ProjectedDb<'c> = Rc<Vec<&'c [Token]>>;

/// A pattern waiting to be emitted and expanded.
struct Frame<'c> {
    prefix: Vec<Token>,
    support: usize,
    parent: ProjectedDb<'c>,
}

/// Depth-first projected-database miner.
#[derive(Debug, Clone)]
pub struct PrefixSpan {
    min_support: usize,
    max_sequence_len: usize,
}

impl PrefixSpan {
    /// Create a miner. `min_support` must be at least 1.
    pub fn new(min_support: usize, max_sequence_len: usize) -> Result<Self> {
        if min_support < 1 {
            return Err(FixmineError::validation_mismatch(
                "min_support must be a positive integer",
                "min_support",
                ">= 1",
                min_support.to_string(),
            ));
        }
        Ok(Self {
            min_support,
            max_sequence_len,
        })
    }

    /// Minimum support threshold.
    pub fn min_support(&self) -> usize {
        self.min_support
    }

    /// Mine every frequent sub-sequence of `corpus`.
    ///
    /// Patterns come out in depth-first order; siblings are ordered by
    /// descending support, then by token.
    pub fn mine(&self, corpus: &[TokenSequence]) -> MiningOutcome {
        let started = Instant::now();
        let (minable, oversized): (Vec<&TokenSequence>, Vec<&TokenSequence>) = corpus
            .iter()
            .partition(|sequence| sequence.len() <= self.max_sequence_len);

        let root: ProjectedDb<'_> = Rc::new(
            minable
                .iter()
                .copied()
                .filter(|sequence| !sequence.is_empty())
                .map(Vec::as_slice)
                .collect(),
        );

        let mut patterns = Vec::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();
        self.push_children(&mut stack, &[], &root);

        while let Some(frame) = stack.pop() {
            let projected = match frame.prefix.last() {
                Some(item) => project(&frame.parent, item),
                None => Vec::new(),
            };
            if !projected.is_empty() {
                self.push_children(&mut stack, &frame.prefix, &Rc::new(projected));
            }
            patterns.push(Pattern::new(frame.prefix, frame.support));
        }

        tracing::info!(
            "Mined {} patterns from {} sequences ({} oversized) in {:?}",
            patterns.len(),
            minable.len(),
            oversized.len(),
            started.elapsed()
        );

        MiningOutcome {
            patterns,
            oversized: oversized.into_iter().cloned().collect(),
        }
    }

    /// Push one frame per frequent item, first item on top.
    fn push_children<'c>(&self, stack: &mut Vec<Frame<'c>>, prefix: &[Token], db: &ProjectedDb<'c>) {
        let frequent = self.frequent_items(db);
        for (item, support) in frequent.into_iter().rev() {
            let mut child = Vec::with_capacity(prefix.len() + 1);
            child.extend_from_slice(prefix);
            child.push(item.clone());
            stack.push(Frame {
                prefix: child,
                support,
                parent: Rc::clone(db),
            });
        }
    }

    /// Items present in at least `min_support` sequences, sorted by
    /// `(-support, item)`.
    fn frequent_items<'c>(&self, db: &[&'c [Token]]) -> Vec<(&'c Token, usize)> {
        let mut counts: AHashMap<&'c Token, usize> = AHashMap::new();
        let mut seen: AHashSet<&'c Token> = AHashSet::new();
        for &sequence in db {
            seen.clear();
            for token in sequence {
                if seen.insert(token) {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut frequent: Vec<_> = counts
            .into_iter()
            .filter(|(_, support)| *support >= self.min_support)
            .collect();
        frequent.sort_by(|(a, a_support), (b, b_support)| {
            b_support.cmp(a_support).then_with(|| a.cmp(b))
        });
        frequent
    }
}

/// Suffixes strictly after the first occurrence of `item`; sequences without
/// it, or where it is the last token, drop out.
fn project<'c>(db: &[&'c [Token]], item: &Token) -> Vec<&'c [Token]> {
    db.iter()
        .copied()
        .filter_map(|sequence| {
            let position = sequence.iter().position(|token| token == item)?;
            let suffix = &sequence[position + 1..];
            (!suffix.is_empty()).then_some(suffix)
        })
        .collect()
}
