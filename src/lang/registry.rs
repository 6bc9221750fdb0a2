//! Language metadata and tree-sitter grammar lookup.

use std::path::Path;
use tree_sitter::Language;

use crate::core::errors::{FixmineError, Result};

/// Metadata describing one of the built-in tokenizer languages.
#[derive(Debug, Clone, Copy)]
pub struct LanguageInfo {
    /// Canonical short key (matches CLI/config usage, e.g. "py").
    pub key: &'static str,
    /// Human-friendly display name.
    pub name: &'static str,
    /// Supported file extensions (without leading dots).
    pub extensions: &'static [&'static str],
    /// Keyword that introduces a named function definition.
    pub function_keyword: Option<&'static str>,
    /// Node kinds kept as a single token instead of being split into leaves.
    pub atomic_kinds: &'static [&'static str],
}

const REGISTERED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        key: "py",
        name: "Python",
        extensions: &["py", "pyi"],
        function_keyword: Some("def"),
        atomic_kinds: &["string"],
    },
    LanguageInfo {
        key: "ts",
        name: "TypeScript",
        extensions: &["ts", "tsx", "cts", "mts"],
        function_keyword: Some("function"),
        atomic_kinds: &["string", "template_string", "regex"],
    },
    LanguageInfo {
        key: "js",
        name: "JavaScript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        function_keyword: Some("function"),
        atomic_kinds: &["string", "template_string", "regex"],
    },
    LanguageInfo {
        key: "rs",
        name: "Rust",
        extensions: &["rs"],
        function_keyword: Some("fn"),
        atomic_kinds: &["string_literal", "raw_string_literal", "char_literal"],
    },
    LanguageInfo {
        key: "go",
        name: "Go",
        extensions: &["go"],
        function_keyword: Some("func"),
        atomic_kinds: &[
            "interpreted_string_literal",
            "raw_string_literal",
            "rune_literal",
        ],
    },
    LanguageInfo {
        key: "cpp",
        name: "C++",
        extensions: &["cpp", "cxx", "cc", "c++", "hpp", "hxx", "hh", "h++", "h"],
        function_keyword: None,
        atomic_kinds: &["string_literal", "raw_string_literal", "char_literal"],
    },
];

/// Return the languages that are compiled into this build.
pub fn registered_languages() -> &'static [LanguageInfo] {
    REGISTERED_LANGUAGES
}

/// Look up the metadata for a language key or alias.
pub fn language_info(language: &str) -> Result<&'static LanguageInfo> {
    let key = normalize_language_key(language).ok_or_else(|| {
        FixmineError::unsupported(format!("Unknown language: {}", language))
    })?;
    registered_languages()
        .iter()
        .find(|info| info.key == key)
        .ok_or_else(|| FixmineError::unsupported(format!("Unknown language: {}", language)))
}

/// Identify the canonical language key for a file path.
pub fn language_key_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if ext.is_empty() {
        return None;
    }

    find_language_by_extension(&ext).map(|info| info.key)
}

/// Get tree-sitter language for a given language key
pub fn get_tree_sitter_language(language_key: &str) -> Result<Language> {
    match normalize_language_key(language_key) {
        Some("py") => Ok(tree_sitter_python::LANGUAGE.into()),
        Some("rs") => Ok(tree_sitter_rust::LANGUAGE.into()),
        Some("js") => Ok(tree_sitter_javascript::LANGUAGE.into()),
        Some("ts") => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Some("go") => Ok(tree_sitter_go::LANGUAGE.into()),
        Some("cpp") => Ok(tree_sitter_cpp::LANGUAGE.into()),
        _ => Err(FixmineError::unsupported(format!(
            "No tree-sitter grammar for: {}",
            language_key
        ))),
    }
}

/// Create a new parser for the given language
pub fn create_parser_for_language(language_key: &str) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    let tree_sitter_language = get_tree_sitter_language(language_key)?;
    parser.set_language(&tree_sitter_language).map_err(|e| {
        FixmineError::tokenization(
            language_key,
            format!("Failed to set parser language: {}", e),
        )
    })?;
    Ok(parser)
}

fn find_language_by_extension(ext: &str) -> Option<&'static LanguageInfo> {
    let target = ext.trim_start_matches('.').to_ascii_lowercase();
    registered_languages().iter().find(|info| {
        info.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&target))
    })
}

/// Normalizes a language identifier to its canonical key.
pub fn normalize_language_key(language: &str) -> Option<&'static str> {
    match language.to_ascii_lowercase().as_str() {
        "py" | "pyw" | "python" => Some("py"),
        "js" | "jsx" | "mjs" | "cjs" | "javascript" => Some("js"),
        "ts" | "tsx" | "cts" | "mts" | "typescript" => Some("ts"),
        "rs" | "rust" => Some("rs"),
        "go" | "golang" => Some("go"),
        "cpp" | "cxx" | "cc" | "c++" | "hpp" | "hxx" | "hh" | "h++" | "h" | "cplusplus" => {
            Some("cpp")
        }
        _ => None,
    }
}
