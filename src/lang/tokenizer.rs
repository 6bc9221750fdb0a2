//! Lexical tokenization of source fragments via tree-sitter leaves.
//!
//! A fragment is parsed with the language grammar and flattened into its leaf
//! tokens. Comments and parser-inserted (missing) nodes are dropped, string
//! literals stay whole, and a fragment that leaves a bracket open is rejected
//! so the caller can skip it instead of mining a truncated statement.

use ahash::AHashMap;
use tree_sitter::{Node, Parser};

use crate::core::errors::{FixmineError, Result};
use crate::lang::registry::{create_parser_for_language, language_info, LanguageInfo};

/// Splits source text into lexical tokens for one language.
pub struct Tokenizer {
    info: &'static LanguageInfo,
    parser: Parser,
}

impl Tokenizer {
    /// Create a tokenizer for a language key or alias.
    pub fn new(language: &str) -> Result<Self> {
        let info = language_info(language)?;
        let parser = create_parser_for_language(info.key)?;
        Ok(Self { info, parser })
    }

    /// Metadata of the language this tokenizer handles.
    pub fn language(&self) -> &'static LanguageInfo {
        self.info
    }

    /// Tokenize a fragment into its lexical token texts.
    pub fn tokenize(&mut self, source: &str) -> Result<Vec<String>> {
        let tree = self.parser.parse(source, None).ok_or_else(|| {
            FixmineError::tokenization_at(self.info.key, "parser produced no tree", source)
        })?;

        let mut tokens = Vec::new();
        let mut cursor = tree.walk();
        'walk: loop {
            let node = cursor.node();
            if self.collect(node, source, &mut tokens)? && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        if open_bracket_depth(&tokens) > 0 {
            return Err(FixmineError::tokenization_at(
                self.info.key,
                "EOF in multi-line statement",
                source,
            ));
        }

        Ok(tokens)
    }

    /// Tokenize and concatenate the tokens without separators.
    pub fn compact(&mut self, source: &str) -> Result<String> {
        Ok(self.tokenize(source)?.concat())
    }

    /// Push the token for `node` if it is a leaf; returns whether to descend.
    fn collect(&self, node: Node<'_>, source: &str, tokens: &mut Vec<String>) -> Result<bool> {
        let kind = node.kind();
        if node.is_missing() || kind.contains("comment") {
            return Ok(false);
        }

        let atomic = self.info.atomic_kinds.contains(&kind);
        if !atomic && node.child_count() > 0 {
            return Ok(true);
        }

        let text = source.get(node.byte_range()).ok_or_else(|| {
            FixmineError::tokenization_at(
                self.info.key,
                format!("token boundary {:?} is not a character boundary", node.byte_range()),
                source,
            )
        })?;
        let text = text.trim();
        if !text.is_empty() {
            tokens.push(text.to_string());
        }
        Ok(false)
    }
}

/// Number of brackets left open after the last token.
fn open_bracket_depth(tokens: &[String]) -> usize {
    tokens.iter().fold(0usize, |depth, token| match token.as_str() {
        "(" | "[" | "{" => depth + 1,
        ")" | "]" | "}" => depth.saturating_sub(1),
        _ => depth,
    })
}

/// Lazily created tokenizers, one per language.
#[derive(Default)]
pub struct TokenizerSet {
    tokenizers: AHashMap<&'static str, Tokenizer>,
}

impl TokenizerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizer for `language`, created on first use.
    pub fn get(&mut self, language: &str) -> Result<&mut Tokenizer> {
        let key = language_info(language)?.key;
        if !self.tokenizers.contains_key(key) {
            self.tokenizers.insert(key, Tokenizer::new(key)?);
        }
        self.tokenizers
            .get_mut(key)
            .ok_or_else(|| FixmineError::internal(format!("tokenizer for {key} vanished")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> Tokenizer {
        Tokenizer::new("py").expect("python tokenizer")
    }

    #[test]
    fn splits_subscript_expression() {
        let tokens = python().tokenize("i = dic[STRING]").unwrap();
        assert_eq!(tokens, vec!["i", "=", "dic", "[", "STRING", "]"]);
    }

    #[test]
    fn splits_method_call() {
        let tokens = python().tokenize("i = dic.get(STRING)").unwrap();
        assert_eq!(tokens, vec!["i", "=", "dic", ".", "get", "(", "STRING", ")"]);
    }

    #[test]
    fn keeps_string_literals_whole_and_drops_comments() {
        let tokens = python()
            .tokenize("name = \"a b\"  # trailing note")
            .unwrap();
        assert_eq!(tokens, vec!["name", "=", "\"a b\""]);
    }

    #[test]
    fn unterminated_bracket_is_a_tokenization_error() {
        let err = python().tokenize("foo(a,").unwrap_err();
        assert!(matches!(err, FixmineError::Tokenization { .. }));
        assert!(err.to_string().contains("EOF in multi-line statement"));
    }

    #[test]
    fn compact_drops_whitespace() {
        assert_eq!(python().compact("x = foo( a )").unwrap(), "x=foo(a)");
    }

    #[test]
    fn rust_fragments_tokenize() {
        let mut tokenizer = Tokenizer::new("rs").unwrap();
        let tokens = tokenizer.tokenize("let x = v.len();").unwrap();
        assert_eq!(tokens, vec!["let", "x", "=", "v", ".", "len", "(", ")", ";"]);
    }

    #[test]
    fn tokenizer_set_reuses_by_alias() {
        let mut set = TokenizerSet::new();
        assert_eq!(set.get("python").unwrap().language().key, "py");
        assert_eq!(set.get("py").unwrap().language().key, "py");
        assert!(set.get("cobol").is_err());
    }
}
