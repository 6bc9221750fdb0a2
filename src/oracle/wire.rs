//! Strict parser for the oracle's string-encoded node descriptors.
//!
//! GumTree renders every tree node as `<kind>: <text> [<start>,<end>]`, or as
//! `<kind> [<start>,<end>]` for nodes without a label (string literals). The
//! span is the last bracketed pair in the entry; everything before it is the
//! kind, optionally followed by a colon and the label text.

use serde::Deserialize;
use tracing::warn;

use crate::core::errors::{FixmineError, Result};

/// Category of a tree node, as far as abstraction cares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Variable, attribute or function name
    Identifier,
    /// Integer literal
    Integer,
    /// String literal
    String,
    /// Any other node type, verbatim
    Other(String),
}

impl NodeKind {
    fn from_label(kind: &str) -> Self {
        match kind {
            "identifier" => Self::Identifier,
            "integer" => Self::Integer,
            "string" => Self::String,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Character offsets `[start, end)` into the joined fragment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Inclusive start offset
    pub start: usize,
    /// Exclusive end offset
    pub end: usize,
}

/// One parsed tree node descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Node category
    pub kind: NodeKind,
    /// Label text, absent for unlabeled nodes
    pub text: Option<String>,
    /// Offsets into the joined fragment
    pub span: Span,
}

impl NodeDescriptor {
    /// Parse `kind: text [start,end]` or `kind [start,end]`.
    pub fn parse(entry: &str) -> Result<Self> {
        let trimmed = entry.trim_end();
        let body = trimmed
            .strip_suffix(']')
            .ok_or_else(|| FixmineError::wire_format("missing closing ']'", entry))?;
        let open = body
            .rfind('[')
            .ok_or_else(|| FixmineError::wire_format("missing opening '['", entry))?;

        let (start, end) = body[open + 1..]
            .split_once(',')
            .ok_or_else(|| FixmineError::wire_format("span needs two offsets", entry))?;
        let start = parse_offset(start, entry)?;
        let end = parse_offset(end, entry)?;
        if end < start {
            return Err(FixmineError::wire_format("span ends before it starts", entry));
        }

        let head = body[..open].trim_end();
        let (kind, text) = match head.split_once(':') {
            Some((kind, text)) => (kind.trim(), Some(text.trim().to_string())),
            None => (head.trim(), None),
        };
        if kind.is_empty() {
            return Err(FixmineError::wire_format("missing node kind", entry));
        }

        Ok(Self {
            kind: NodeKind::from_label(kind),
            text,
            span: Span { start, end },
        })
    }
}

fn parse_offset(raw: &str, entry: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| FixmineError::wire_format(format!("invalid offset '{}'", raw.trim()), entry))
}

/// A node present in both trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMatch {
    /// Node in the condition tree
    pub source: NodeDescriptor,
    /// Node in the consequent tree
    pub destination: NodeDescriptor,
}

/// Edit action category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// A node's label changed in place
    UpdateNode,
    /// A node was inserted
    InsertNode,
    /// A node was deleted
    DeleteNode,
    /// A node was moved
    MoveNode,
    /// Any other action (tree-level inserts and deletes)
    Other(String),
}

impl ActionKind {
    fn from_label(action: &str) -> Self {
        match action {
            "update-node" => Self::UpdateNode,
            "insert-node" => Self::InsertNode,
            "delete-node" => Self::DeleteNode,
            "move-node" => Self::MoveNode,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One edit action of the structural diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAction {
    /// Action category
    pub kind: ActionKind,
    /// Node the action applies to
    pub tree: NodeDescriptor,
    /// New label for updates
    pub label: Option<String>,
}

/// Parsed oracle answer for one condition/consequent pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralDiff {
    /// Matched nodes in response order
    pub matches: Vec<StructuralMatch>,
    /// Edit actions in response order
    pub actions: Vec<EditAction>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    src: String,
    dest: String,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    tree: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

impl StructuralDiff {
    /// Parse the oracle's JSON document.
    ///
    /// An unreadable document is an oracle failure. Individual malformed
    /// entries are logged and dropped; the rest of the response is kept.
    pub fn from_json(document: &str) -> Result<Self> {
        let raw: RawResponse = serde_json::from_str(document).map_err(|e| {
            FixmineError::oracle(format!("unparsable oracle response: {e}"))
        })?;

        let matches = raw
            .matches
            .into_iter()
            .filter_map(|entry| {
                let parsed = NodeDescriptor::parse(&entry.src).and_then(|source| {
                    NodeDescriptor::parse(&entry.dest).map(|destination| StructuralMatch {
                        source,
                        destination,
                    })
                });
                skip_malformed(parsed)
            })
            .collect();

        let actions = raw
            .actions
            .into_iter()
            .filter_map(|entry| {
                let parsed = NodeDescriptor::parse(&entry.tree).map(|tree| EditAction {
                    kind: ActionKind::from_label(&entry.action),
                    tree,
                    label: entry.label,
                });
                skip_malformed(parsed)
            })
            .collect();

        Ok(Self { matches, actions })
    }

    /// Start offsets of every `update-node` action, in response order.
    pub fn update_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.actions
            .iter()
            .filter(|action| action.kind == ActionKind::UpdateNode)
            .map(|action| action.tree.span.start)
    }
}

fn skip_malformed<T>(parsed: Result<T>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Skipping oracle entry: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_node() {
        let node = NodeDescriptor::parse("identifier: dic [4,7]").unwrap();
        assert_eq!(node.kind, NodeKind::Identifier);
        assert_eq!(node.text.as_deref(), Some("dic"));
        assert_eq!(node.span, Span { start: 4, end: 7 });
    }

    #[test]
    fn parses_unlabeled_string_node() {
        let node = NodeDescriptor::parse("string [8,15]").unwrap();
        assert_eq!(node.kind, NodeKind::String);
        assert_eq!(node.text, None);
        assert_eq!(node.span, Span { start: 8, end: 15 });
    }

    #[test]
    fn span_is_taken_from_the_last_bracket() {
        let node = NodeDescriptor::parse("string_content: a[0] [3,7]").unwrap();
        assert_eq!(node.kind, NodeKind::Other("string_content".to_string()));
        assert_eq!(node.text.as_deref(), Some("a[0]"));
        assert_eq!(node.span.start, 3);
    }

    #[test]
    fn rejects_malformed_entries() {
        for entry in [
            "identifier: x",
            "identifier: x [1]",
            "identifier: x [a,2]",
            "identifier: x [5,2]",
            ": x [1,2]",
        ] {
            let err = NodeDescriptor::parse(entry).unwrap_err();
            assert!(
                matches!(err, FixmineError::WireFormat { .. }),
                "{entry} should be a wire-format error"
            );
        }
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let document = r#"{
            "matches": [
                {"src": "identifier: a [0,1]", "dest": "identifier: a [0,1]"},
                {"src": "identifier: broken", "dest": "identifier: b [2,3]"},
                {"src": "integer: 3 [4,5]", "dest": "integer: 3 [4,5]"}
            ],
            "actions": [
                {"action": "update-node", "tree": "identifier: x [12,13]", "label": "y"},
                {"action": "delete-node", "tree": "nonsense"}
            ]
        }"#;
        let diff = StructuralDiff::from_json(document).unwrap();
        assert_eq!(diff.matches.len(), 2);
        assert_eq!(diff.matches[1].source.kind, NodeKind::Integer);
        assert_eq!(diff.actions.len(), 1);
        assert_eq!(diff.actions[0].label.as_deref(), Some("y"));
        assert_eq!(diff.update_offsets().collect::<Vec<_>>(), vec![12]);
    }

    #[test]
    fn unreadable_document_is_an_oracle_error() {
        let err = StructuralDiff::from_json("<html>").unwrap_err();
        assert!(matches!(err, FixmineError::Oracle { .. }));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let diff = StructuralDiff::from_json("{}").unwrap();
        assert!(diff.matches.is_empty());
        assert!(diff.actions.is_empty());
    }
}
