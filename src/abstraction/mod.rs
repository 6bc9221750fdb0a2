//! Diff abstraction: replace values that did not change across a hunk with
//! categorical placeholders.
//!
//! A value is stable when the structural oracle matches it to an identical
//! value on the other side. Stable identifiers become `VARIABLE_<n>`, integers
//! `NUMBER_<n>` and string literals `STRING_<n>`; functions defined in the hunk
//! are renamed to `FUNCTION_<n>` beforehand. Numbering restarts for every hunk.

pub mod dictionary;
pub mod function_names;
pub mod placeholder;

use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::errors::Result;
use crate::core::model::DiffHunk;
use crate::lang::Tokenizer;
use crate::oracle::{NodeKind, Span, StructuralMatch, StructuralOracle};

pub use dictionary::ReservedNames;
pub use function_names::normalize_function_names;
pub use placeholder::{
    is_placeholder, parse_placeholder, replace_number, replace_word, PlaceholderKind,
};

/// Per-hunk assignment of concrete values to placeholders.
///
/// A value keeps its placeholder for the lifetime of the map; each kind has
/// its own counter starting at 1.
#[derive(Debug, Clone, Default)]
pub struct AbstractionMap {
    assignments: IndexMap<(PlaceholderKind, String), String>,
    counters: AHashMap<PlaceholderKind, usize>,
}

impl AbstractionMap {
    /// Placeholder for `value`, assigning the next free one on first sight.
    pub fn assign(&mut self, kind: PlaceholderKind, value: &str) -> String {
        if let Some(existing) = self.assignments.get(&(kind, value.to_string())) {
            return existing.clone();
        }
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let placeholder = kind.render(*counter);
        self.assignments
            .insert((kind, value.to_string()), placeholder.clone());
        placeholder
    }

    /// Placeholder already assigned to `value`.
    pub fn get(&self, kind: PlaceholderKind, value: &str) -> Option<&str> {
        self.assignments
            .get(&(kind, value.to_string()))
            .map(String::as_str)
    }

    /// Number of assigned values.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// True when nothing was abstracted.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Result of abstracting one hunk.
#[derive(Debug, Clone)]
pub struct AbstractedHunk {
    /// Rewritten hunk
    pub hunk: DiffHunk,
    /// Values replaced while rewriting
    pub mapping: AbstractionMap,
}

/// Rewrites hunks using structural matches from an oracle.
pub struct DiffAbstractor<'a> {
    oracle: &'a dyn StructuralOracle,
    reserved: &'a ReservedNames,
    normalize_functions: bool,
}

impl<'a> DiffAbstractor<'a> {
    /// Create an abstractor that also normalizes function names.
    pub fn new(oracle: &'a dyn StructuralOracle, reserved: &'a ReservedNames) -> Self {
        Self {
            oracle,
            reserved,
            normalize_functions: true,
        }
    }

    /// Enable or disable function-name normalization.
    pub fn with_function_normalization(mut self, enabled: bool) -> Self {
        self.normalize_functions = enabled;
        self
    }

    /// Abstract one hunk. Oracle failures are returned to the caller.
    pub fn abstract_hunk(&self, hunk: &DiffHunk, tokenizer: &mut Tokenizer) -> Result<AbstractedHunk> {
        let mut mapping = AbstractionMap::default();
        let normalized = if self.normalize_functions {
            normalize_function_names(hunk, tokenizer, &mut mapping)
        } else {
            hunk.clone()
        };

        let language = tokenizer.language().key;
        let structure = self
            .oracle
            .diff(language, &normalized.condition, &normalized.consequent)?;

        // String spans index the text the oracle saw, not the text being rewritten.
        let source_text: Vec<char> = normalized.joined_condition().chars().collect();
        let destination_text: Vec<char> = normalized.joined_consequent().chars().collect();

        let DiffHunk {
            mut condition,
            mut consequent,
        } = normalized;
        for matched in &structure.matches {
            let Some((kind, value)) = self.stable_value(matched, &source_text, &destination_text)
            else {
                continue;
            };
            let placeholder = mapping.assign(kind, &value);
            rewrite(&mut condition, kind, &value, &placeholder);
            rewrite(&mut consequent, kind, &value, &placeholder);
        }

        debug!(
            "Abstracted hunk: {} values over {} matches",
            mapping.len(),
            structure.matches.len()
        );
        Ok(AbstractedHunk {
            hunk: DiffHunk {
                condition,
                consequent,
            },
            mapping,
        })
    }

    /// The value to abstract for a match, if the match is stable and abstractable.
    fn stable_value(
        &self,
        matched: &StructuralMatch,
        source_text: &[char],
        destination_text: &[char],
    ) -> Option<(PlaceholderKind, String)> {
        match matched.source.kind {
            NodeKind::Identifier => {
                let name = identical_labels(matched)?;
                let abstractable = !self.reserved.contains(name)
                    && !name.contains(PlaceholderKind::Function.prefix())
                    && !is_placeholder(name);
                abstractable.then(|| (PlaceholderKind::Variable, name.to_string()))
            }
            NodeKind::Integer => {
                identical_labels(matched).map(|value| (PlaceholderKind::Number, value.to_string()))
            }
            NodeKind::String => {
                let source = slice_span(source_text, matched.source.span)?;
                let destination = slice_span(destination_text, matched.destination.span)?;
                (source == destination && !source.is_empty())
                    .then_some((PlaceholderKind::String, source))
            }
            NodeKind::Other(_) => None,
        }
    }
}

fn identical_labels(matched: &StructuralMatch) -> Option<&str> {
    let source = matched.source.text.as_deref()?;
    let destination = matched.destination.text.as_deref()?;
    (source == destination && !source.is_empty()).then_some(source)
}

fn slice_span(text: &[char], span: Span) -> Option<String> {
    match text.get(span.start..span.end) {
        Some(chars) => Some(chars.iter().collect()),
        None => {
            warn!(
                "Skipping string match: span [{},{}] exceeds fragment length {}",
                span.start,
                span.end,
                text.len()
            );
            None
        }
    }
}

fn rewrite(lines: &mut [String], kind: PlaceholderKind, value: &str, placeholder: &str) {
    for line in lines.iter_mut() {
        if !line.contains(value) {
            continue;
        }
        *line = match kind {
            PlaceholderKind::String => line.replace(value, placeholder),
            PlaceholderKind::Number => replace_number(line, value, placeholder),
            _ => replace_word(line, value, placeholder),
        };
    }
}
