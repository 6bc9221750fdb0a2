//! Data model shared by every pipeline stage.
//!
//! A [`DiffHunk`] enters the pipeline, is rewritten by the abstractor, turned into
//! a polarity-tagged [`TokenSequence`] by the sequencer, mined into [`Pattern`]s
//! and finally scored into [`ScoredPattern`] artifacts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::errors::{FixmineError, Result};

/// One localized before/after change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Lines before the change
    pub condition: Vec<String>,
    /// Lines after the change
    pub consequent: Vec<String>,
}

impl DiffHunk {
    /// Build a hunk from anything that yields lines.
    pub fn new<C, Q, S>(condition: C, consequent: Q) -> Self
    where
        C: IntoIterator<Item = S>,
        Q: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition: condition.into_iter().map(Into::into).collect(),
            consequent: consequent.into_iter().map(Into::into).collect(),
        }
    }

    /// A hunk with either side empty carries no change worth mining.
    pub fn has_empty_side(&self) -> bool {
        self.condition.is_empty() || self.consequent.is_empty()
    }

    /// Condition lines joined the way the oracle receives them.
    pub fn joined_condition(&self) -> String {
        self.condition.join("\n")
    }

    /// Consequent lines joined the way the oracle receives them.
    pub fn joined_consequent(&self) -> String {
        self.consequent.join("\n")
    }

    /// Larger of the two side lengths.
    pub fn max_side_len(&self) -> usize {
        self.condition.len().max(self.consequent.len())
    }
}

/// A diff hunk as persisted by the upstream collection tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Path of the changed file, used to pick a tokenizer
    #[serde(default, alias = "File", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Merge/commit timestamp used for time-windowed sharding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
    /// Lines before the change
    pub condition: Vec<String>,
    /// Lines after the change
    pub consequent: Vec<String>,
}

impl DiffRecord {
    /// The hunk carried by this record.
    pub fn hunk(&self) -> DiffHunk {
        DiffHunk {
            condition: self.condition.clone(),
            consequent: self.consequent.clone(),
        }
    }

    /// Calendar year of the merge timestamp.
    pub fn year(&self) -> Option<i32> {
        self.merged_at.map(|ts| ts.year())
    }
}

/// Whether a token survived, disappeared or appeared across the change.
///
/// Variant order follows the ASCII order of the rendered symbols
/// (`+` < `-` < `=`) so that sorting tokens matches sorting their rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarity {
    /// Present only after the change (`+`)
    Added,
    /// Present only before the change (`-`)
    Removed,
    /// Present on both sides (`=`)
    Kept,
}

impl Polarity {
    /// Rendering prefix.
    pub const fn symbol(self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Kept => '=',
        }
    }

    /// Parse a rendering prefix.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Added),
            '-' => Some(Self::Removed),
            '=' => Some(Self::Kept),
            _ => None,
        }
    }

    /// Part of the "before" picture (kept or removed).
    pub const fn in_trigger(self) -> bool {
        matches!(self, Self::Kept | Self::Removed)
    }

    /// Part of the "after" picture (kept or added).
    pub const fn in_change(self) -> bool {
        matches!(self, Self::Kept | Self::Added)
    }
}

/// A polarity-tagged lexical unit. Renders as `<symbol><text>`, e.g. `-[`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
    /// Polarity tag
    pub polarity: Polarity,
    /// Token text (possibly several lexical tokens fused by the merge pass)
    pub text: String,
}

impl Token {
    /// Create a token.
    pub fn new(polarity: Polarity, text: impl Into<String>) -> Self {
        Self {
            polarity,
            text: text.into(),
        }
    }

    /// Create a kept token.
    pub fn kept(text: impl Into<String>) -> Self {
        Self::new(Polarity::Kept, text)
    }

    /// Create an added token.
    pub fn added(text: impl Into<String>) -> Self {
        Self::new(Polarity::Added, text)
    }

    /// Create a removed token.
    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(Polarity::Removed, text)
    }

    /// Length of the rendered form, polarity symbol included.
    pub fn rendered_len(&self) -> usize {
        1 + self.text.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.polarity.symbol(), self.text)
    }
}

impl FromStr for Token {
    type Err = FixmineError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let polarity = chars
            .next()
            .and_then(Polarity::from_symbol)
            .ok_or_else(|| {
                FixmineError::validation_mismatch(
                    "Token is missing its polarity prefix",
                    "token",
                    "one of '+', '-', '='",
                    s,
                )
            })?;
        Ok(Self::new(polarity, chars.as_str()))
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One diff hunk (or one updated line of it) as an ordered tagged-token list.
pub type TokenSequence = Vec<Token>;

/// Render a sequence the way it is persisted.
pub fn render_sequence(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}

/// True when `needle` occurs in `haystack` in order, not necessarily contiguously.
pub fn is_subsequence<T: PartialEq>(needle: &[T], haystack: &[T]) -> bool {
    let mut remaining = haystack.iter();
    needle
        .iter()
        .all(|wanted| remaining.by_ref().any(|candidate| candidate == wanted))
}

/// A frequent order-preserving sub-sequence with its support.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    /// Ordered tagged tokens
    #[serde(rename = "pattern")]
    pub tokens: Vec<Token>,
    /// Number of corpus sequences containing the pattern
    pub support: usize,
}

impl Pattern {
    /// Create a pattern.
    pub fn new(tokens: Vec<Token>, support: usize) -> Self {
        Self { tokens, support }
    }

    /// Texts of the kept and removed tokens: what must exist before the change.
    pub fn trigger_sequence(&self) -> Vec<&str> {
        self.project(Polarity::in_trigger)
    }

    /// Texts of the kept and added tokens: what must exist after the change.
    pub fn change_projection(&self) -> Vec<&str> {
        self.project(Polarity::in_change)
    }

    fn project(&self, keep: fn(Polarity) -> bool) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|token| keep(token.polarity))
            .map(|token| token.text.as_str())
            .collect()
    }

    /// Contains at least one removed and one added token.
    pub fn proposes_change(&self) -> bool {
        let removed = self.tokens.iter().any(|t| t.polarity == Polarity::Removed);
        let added = self.tokens.iter().any(|t| t.polarity == Polarity::Added);
        removed && added
    }

    /// Contains at least one removed or added token.
    pub fn has_edit(&self) -> bool {
        self.tokens.iter().any(|t| t.polarity != Polarity::Kept)
    }

    /// Sum of rendered token lengths.
    pub fn total_len(&self) -> usize {
        self.tokens.iter().map(Token::rendered_len).sum()
    }

    /// Order-preserving containment in another pattern.
    pub fn is_subsequence_of(&self, other: &Pattern) -> bool {
        is_subsequence(&self.tokens, &other.tokens)
    }

    /// Rendered tokens.
    pub fn rendered(&self) -> Vec<String> {
        render_sequence(&self.tokens)
    }

    /// Texts of one projection.
    pub fn projection(&self, projection: Projection) -> Vec<&str> {
        match projection {
            Projection::Trigger => self.trigger_sequence(),
            Projection::Change => self.change_projection(),
        }
    }

    /// Regex source matching a projection of this pattern in compacted code.
    pub fn to_regex_source(&self, projection: Projection) -> String {
        crate::abstraction::placeholder::regex_source(&self.projection(projection))
    }
}

/// Which half of a pattern to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// Kept and removed tokens
    Trigger,
    /// Kept and added tokens
    Change,
}

/// Final artifact record: `{pattern, support, confidence}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPattern {
    /// Ordered tagged tokens
    #[serde(rename = "pattern")]
    pub tokens: Vec<Token>,
    /// Merged support
    pub support: usize,
    /// Fraction of triggerable held-out hunks the change projection also held for
    pub confidence: f64,
}

impl ScoredPattern {
    /// Attach a confidence to a pattern.
    pub fn new(pattern: Pattern, confidence: f64) -> Self {
        Self {
            tokens: pattern.tokens,
            support: pattern.support,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_tokens() -> Vec<Token> {
        ["=i=dic", "-[", "+.get(", "=STRING", "-]", "+)"]
            .iter()
            .map(|raw| raw.parse().unwrap())
            .collect()
    }

    #[test]
    fn token_round_trips_through_display() {
        let token: Token = "+.get(".parse().unwrap();
        assert_eq!(token.polarity, Polarity::Added);
        assert_eq!(token.text, ".get(");
        assert_eq!(token.to_string(), "+.get(");
    }

    #[test]
    fn token_without_prefix_is_rejected() {
        assert!("get".parse::<Token>().is_err());
        assert!("".parse::<Token>().is_err());
    }

    #[test]
    fn token_ordering_matches_rendered_ordering() {
        let mut tokens = scenario_tokens();
        tokens.sort();
        let mut rendered = render_sequence(&scenario_tokens());
        rendered.sort();
        assert_eq!(render_sequence(&tokens), rendered);
    }

    #[test]
    fn projections_split_by_polarity() {
        let pattern = Pattern::new(scenario_tokens(), 1);
        assert_eq!(pattern.trigger_sequence(), vec!["i=dic", "[", "STRING", "]"]);
        assert_eq!(
            pattern.change_projection(),
            vec!["i=dic", ".get(", "STRING", ")"]
        );
        assert!(pattern.proposes_change());
    }

    #[test]
    fn subsequence_is_order_preserving() {
        let full = Pattern::new(scenario_tokens(), 1);
        let sub = Pattern::new(vec![Token::kept("i=dic"), Token::removed("]")], 1);
        let reversed = Pattern::new(vec![Token::removed("]"), Token::kept("i=dic")], 1);
        assert!(sub.is_subsequence_of(&full));
        assert!(!reversed.is_subsequence_of(&full));
        assert!(full.is_subsequence_of(&full));
    }

    #[test]
    fn pattern_serializes_as_artifact() {
        let pattern = Pattern::new(vec![Token::removed("["), Token::added(".get(")], 3);
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pattern": ["-[", "+.get("], "support": 3})
        );
        let back: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(back, pattern);
    }

    #[test]
    fn regex_source_escapes_and_generalizes() {
        let pattern = Pattern::new(
            vec![
                Token::kept("i=dic"),
                Token::removed("["),
                Token::added(".get("),
                Token::kept("STRING_1"),
            ],
            1,
        );
        let trigger = pattern.to_regex_source(Projection::Trigger);
        assert!(trigger.starts_with("i=dic.*\\[.*"));
        assert!(!trigger.contains("STRING_1"));
        let change = pattern.to_regex_source(Projection::Change);
        assert!(change.contains("\\.get\\("));
    }

    #[test]
    fn record_reads_legacy_file_key() {
        let record: DiffRecord = serde_json::from_str(
            r#"{"File": "a.py", "merged_at": "2019-03-01T10:00:00Z",
                "condition": ["x = 1"], "consequent": ["x = 2"]}"#,
        )
        .unwrap();
        assert_eq!(record.file_name.as_deref(), Some("a.py"));
        assert_eq!(record.year(), Some(2019));
        assert!(!record.hunk().has_empty_side());
    }
}
