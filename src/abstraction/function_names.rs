//! Renaming of functions defined inside a hunk to `FUNCTION_<n>`.

use tracing::debug;

use super::placeholder::{is_placeholder, is_word_char, replace_word, words, PlaceholderKind};
use super::AbstractionMap;
use crate::core::model::DiffHunk;
use crate::lang::Tokenizer;

/// Rename every function whose definition appears in the hunk.
///
/// Definitions are found by tokenizing each line and taking the token after the
/// language's definition keyword. Names are numbered in first-seen order
/// (condition lines before consequent lines) and renamed on both sides.
/// Lines that fail to tokenize are searched no further and left as they are.
pub fn normalize_function_names(
    hunk: &DiffHunk,
    tokenizer: &mut Tokenizer,
    mapping: &mut AbstractionMap,
) -> DiffHunk {
    let Some(keyword) = tokenizer.language().function_keyword else {
        return hunk.clone();
    };

    let mut renames: Vec<(String, String)> = Vec::new();
    for line in hunk.condition.iter().chain(&hunk.consequent) {
        if !words(line).any(|word| word == keyword) {
            continue;
        }
        let tokens = match tokenizer.tokenize(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                debug!("Function-name scan skipped a line: {}", err);
                continue;
            }
        };
        let Some(name) = defined_name(&tokens, keyword) else {
            continue;
        };
        if renames.iter().any(|(known, _)| known == name) {
            continue;
        }
        let placeholder = mapping.assign(PlaceholderKind::Function, name);
        renames.push((name.to_string(), placeholder));
    }

    if renames.is_empty() {
        return hunk.clone();
    }

    let rename = |lines: &[String]| -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                renames
                    .iter()
                    .fold(line.clone(), |acc, (name, placeholder)| {
                        replace_word(&acc, name, placeholder)
                    })
            })
            .collect()
    };
    DiffHunk {
        condition: rename(&hunk.condition),
        consequent: rename(&hunk.consequent),
    }
}

fn defined_name<'t>(tokens: &'t [String], keyword: &str) -> Option<&'t str> {
    let position = tokens.iter().position(|token| token == keyword)?;
    let name = tokens.get(position + 1)?.as_str();
    let starts_like_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let is_identifier = starts_like_identifier && name.chars().all(is_word_char);
    (is_identifier && !is_placeholder(name)).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_definitions_and_calls_on_both_sides() {
        let mut tokenizer = Tokenizer::new("py").unwrap();
        let mut mapping = AbstractionMap::default();
        let hunk = DiffHunk::new(
            ["def load(path):", "    return load(path)"],
            ["def load(path, mode):", "    return load(path)"],
        );
        let renamed = normalize_function_names(&hunk, &mut tokenizer, &mut mapping);
        assert_eq!(renamed.condition[0], "def FUNCTION_1(path):");
        assert_eq!(renamed.condition[1], "    return FUNCTION_1(path)");
        assert_eq!(renamed.consequent[0], "def FUNCTION_1(path, mode):");
        assert_eq!(mapping.get(PlaceholderKind::Function, "load"), Some("FUNCTION_1"));
    }

    #[test]
    fn distinct_names_get_distinct_placeholders() {
        let mut tokenizer = Tokenizer::new("py").unwrap();
        let mut mapping = AbstractionMap::default();
        let hunk = DiffHunk::new(["def old_name(a):"], ["def new_name(a):"]);
        let renamed = normalize_function_names(&hunk, &mut tokenizer, &mut mapping);
        assert_eq!(renamed.condition, vec!["def FUNCTION_1(a):"]);
        assert_eq!(renamed.consequent, vec!["def FUNCTION_2(a):"]);
    }

    #[test]
    fn already_normalized_names_are_left_alone() {
        let mut tokenizer = Tokenizer::new("py").unwrap();
        let mut mapping = AbstractionMap::default();
        let hunk = DiffHunk::new(["def FUNCTION_1(a):"], ["def FUNCTION_1(a, b):"]);
        let renamed = normalize_function_names(&hunk, &mut tokenizer, &mut mapping);
        assert_eq!(renamed, hunk);
        assert!(mapping.is_empty());
    }

    #[test]
    fn languages_without_keyword_are_untouched() {
        let mut tokenizer = Tokenizer::new("cpp").unwrap();
        let mut mapping = AbstractionMap::default();
        let hunk = DiffHunk::new(["int f(int a) {}"], ["int f(long a) {}"]);
        assert_eq!(
            normalize_function_names(&hunk, &mut tokenizer, &mut mapping),
            hunk
        );
    }
}
