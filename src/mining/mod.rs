//! Sequential pattern mining over token-sequence corpora.

pub mod prefix_span;

use serde_json::Value;

use crate::core::errors::{FixmineError, Result};
use crate::core::model::{Pattern, Token, TokenSequence};

pub use prefix_span::{MiningOutcome, PrefixSpan};

/// Keep patterns that are longer than one token and carry an edit.
pub fn retain_change_patterns(patterns: Vec<Pattern>) -> Vec<Pattern> {
    patterns
        .into_iter()
        .filter(|pattern| pattern.tokens.len() > 1 && pattern.has_edit())
        .collect()
}

/// Validate a JSON corpus before mining: every element must be an array of
/// polarity-tagged token strings.
pub fn corpus_from_json(document: &Value) -> Result<Vec<TokenSequence>> {
    let elements = document.as_array().ok_or_else(|| {
        FixmineError::validation_mismatch(
            "Sequence corpus must be a JSON array",
            "corpus",
            "array of sequences",
            json_type(document),
        )
    })?;

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let tokens = element.as_array().ok_or_else(|| {
                FixmineError::validation_mismatch(
                    "All sequences must be arrays of tokens",
                    format!("corpus[{index}]"),
                    "array",
                    json_type(element),
                )
            })?;
            tokens
                .iter()
                .map(|token| match token.as_str() {
                    Some(raw) => raw.parse::<Token>(),
                    None => Err(FixmineError::validation_mismatch(
                        "Tokens must be strings",
                        format!("corpus[{index}]"),
                        "string",
                        json_type(token),
                    )),
                })
                .collect::<Result<TokenSequence>>()
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
