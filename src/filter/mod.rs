//! Pattern filter: shard merge, validity, redundancy pruning and confidence.

pub mod confidence;
pub mod merge;
pub mod redundancy;
pub mod validity;

use tracing::{debug, info};

use crate::core::config::FilterConfig;
use crate::core::errors::Result;
use crate::core::model::{Pattern, ScoredPattern};

pub use confidence::{Confidence, ConfidenceEvaluator, HeldOutHunk};
pub use merge::{merge_patterns, ShardResults};
pub use redundancy::prune_redundant;
pub use validity::{brackets_balanced, check_validity, is_symbols_only, Invalidity};

/// How many patterns each stage let through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Distinct patterns after merging
    pub merged: usize,
    /// Dropped as symbols only
    pub symbols_only: usize,
    /// Dropped for lacking a removed or an added token
    pub no_change: usize,
    /// Dropped for unbalanced brackets
    pub unbalanced: usize,
    /// Dropped for low merged support
    pub low_support: usize,
    /// Dropped as contained in a longer pattern
    pub redundant: usize,
    /// Dropped under the confidence threshold
    pub low_confidence: usize,
    /// Final artifact size
    pub kept: usize,
}

/// Turns raw mined patterns into the scored artifact.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    min_pruning_support: usize,
    confidence_threshold: f64,
}

impl PatternFilter {
    /// Create a filter from configuration.
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_pruning_support: config.min_pruning_support,
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Run every stage and return the artifact sorted by descending support.
    pub fn filter<I>(
        &self,
        patterns: I,
        held_out: &ConfidenceEvaluator,
    ) -> Result<(Vec<ScoredPattern>, FilterReport)>
    where
        I: IntoIterator<Item = Pattern>,
    {
        let mut report = FilterReport::default();

        let merged = merge_patterns(patterns);
        report.merged = merged.len();

        let mut candidates = Vec::with_capacity(merged.len());
        for pattern in merged {
            match check_validity(&pattern) {
                Ok(()) => {}
                Err(reason) => {
                    debug!("Dropping {:?}: {}", pattern.rendered(), reason);
                    match reason {
                        Invalidity::SymbolsOnly => report.symbols_only += 1,
                        Invalidity::NoChange => report.no_change += 1,
                        Invalidity::UnbalancedBrackets => report.unbalanced += 1,
                    }
                    continue;
                }
            }
            if pattern.support < self.min_pruning_support {
                report.low_support += 1;
                continue;
            }
            candidates.push(pattern);
        }

        let before_pruning = candidates.len();
        let pruned = prune_redundant(candidates);
        report.redundant = before_pruning - pruned.len();

        let scores = held_out.evaluate_all(&pruned)?;
        let mut scored: Vec<ScoredPattern> = pruned
            .into_iter()
            .zip(scores)
            .filter_map(|(pattern, confidence)| {
                let value = confidence.value();
                if value < self.confidence_threshold {
                    report.low_confidence += 1;
                    None
                } else {
                    Some(ScoredPattern::new(pattern, value))
                }
            })
            .collect();

        scored.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.tokens.cmp(&b.tokens)));
        report.kept = scored.len();

        info!(
            "Filtered {} merged patterns down to {} (invalid: {}, low support: {}, redundant: {}, low confidence: {})",
            report.merged,
            report.kept,
            report.symbols_only + report.no_change + report.unbalanced,
            report.low_support,
            report.redundant,
            report.low_confidence
        );
        Ok((scored, report))
    }
}
