//! Confidence of a pattern against held-out hunks.
//!
//! A held-out hunk is triggerable by a pattern when every trigger token occurs
//! as a substring of its condition, and actually changed when every
//! change-projection token also occurs in its consequent. Confidence is
//! changed / triggerable, or 0 when nothing was triggerable.

use aho_corasick::AhoCorasick;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::errors::{FixmineError, Result};
use crate::core::model::Pattern;

/// A held-out hunk reduced to the text patterns are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldOutHunk {
    /// Condition text
    pub condition: String,
    /// Consequent text
    pub consequent: String,
}

impl HeldOutHunk {
    /// Create a held-out hunk.
    pub fn new(condition: impl Into<String>, consequent: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            consequent: consequent.into(),
        }
    }
}

/// Counts behind one confidence value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Confidence {
    /// Hunks whose condition holds every trigger token
    pub triggerable: usize,
    /// Triggerable hunks whose consequent holds every change token
    pub changed: usize,
}

impl Confidence {
    /// `changed / triggerable`, or 0 without triggerable hunks.
    pub fn value(&self) -> f64 {
        if self.triggerable == 0 {
            0.0
        } else {
            self.changed as f64 / self.triggerable as f64
        }
    }
}

/// Matches "all of these tokens occur somewhere" in one scan.
struct AllSubstrings {
    automaton: Option<AhoCorasick>,
    needles: usize,
    vacuous: bool,
}

impl AllSubstrings {
    fn new(tokens: &[&str]) -> Result<Self> {
        let mut needles: Vec<&str> = tokens.iter().copied().filter(|t| !t.is_empty()).collect();
        needles.sort_unstable();
        needles.dedup();

        let automaton = if needles.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&needles).map_err(|e| {
                FixmineError::internal(format!("failed to build token matcher: {e}"))
            })?)
        };
        Ok(Self {
            automaton,
            needles: needles.len(),
            vacuous: tokens.is_empty(),
        })
    }

    fn all_in(&self, haystack: &str) -> bool {
        if self.vacuous {
            return false;
        }
        let Some(automaton) = &self.automaton else {
            return true;
        };
        let mut found = vec![false; self.needles];
        let mut missing = self.needles;
        for hit in automaton.find_overlapping_iter(haystack) {
            let slot = &mut found[hit.pattern().as_usize()];
            if !*slot {
                *slot = true;
                missing -= 1;
                if missing == 0 {
                    return true;
                }
            }
        }
        false
    }
}

/// Scores patterns against a held-out corpus.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceEvaluator {
    corpus: Vec<HeldOutHunk>,
}

impl ConfidenceEvaluator {
    /// Create an evaluator over `corpus`.
    pub fn new(corpus: Vec<HeldOutHunk>) -> Self {
        Self { corpus }
    }

    /// Number of held-out hunks.
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    /// True when there is nothing to score against.
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Counts for one pattern.
    pub fn evaluate(&self, pattern: &Pattern) -> Result<Confidence> {
        let trigger = AllSubstrings::new(&pattern.trigger_sequence())?;
        let change = AllSubstrings::new(&pattern.change_projection())?;

        let mut confidence = Confidence::default();
        for hunk in &self.corpus {
            if !trigger.all_in(&hunk.condition) {
                continue;
            }
            confidence.triggerable += 1;
            if change.all_in(&hunk.consequent) {
                confidence.changed += 1;
            }
        }
        Ok(confidence)
    }

    /// Counts for many patterns, in input order.
    pub fn evaluate_all(&self, patterns: &[Pattern]) -> Result<Vec<Confidence>> {
        patterns
            .par_iter()
            .map(|pattern| self.evaluate(pattern))
            .collect()
    }
}
