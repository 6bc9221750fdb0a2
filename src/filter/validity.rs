//! Structural validity checks for mined patterns.

use std::fmt;

use crate::core::model::Pattern;

/// Why a pattern was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalidity {
    /// Every token is punctuation
    SymbolsOnly,
    /// Lacks a removed or an added token
    NoChange,
    /// Brackets do not close in matching order
    UnbalancedBrackets,
}

impl fmt::Display for Invalidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::SymbolsOnly => "symbols only",
            Self::NoChange => "no change",
            Self::UnbalancedBrackets => "unbalanced brackets",
        };
        f.write_str(reason)
    }
}

/// First validity rule the pattern breaks, if any.
pub fn check_validity(pattern: &Pattern) -> Result<(), Invalidity> {
    if is_symbols_only(pattern) {
        return Err(Invalidity::SymbolsOnly);
    }
    if !pattern.proposes_change() {
        return Err(Invalidity::NoChange);
    }
    if !brackets_balanced(pattern) {
        return Err(Invalidity::UnbalancedBrackets);
    }
    Ok(())
}

/// True when no token contains a letter, digit or underscore.
pub fn is_symbols_only(pattern: &Pattern) -> bool {
    pattern.tokens.iter().all(|token| {
        !token
            .text
            .chars()
            .any(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Balanced `()`, `[]` and `{}` over the concatenated token texts, polarity
/// ignored.
///
/// Each bracket kind is tracked on its own: a closer needs an earlier unclosed
/// opener of the same kind and every opener must be closed by the end. Kinds
/// may interleave (`-[ +.get( =x -] +)` passes). Brackets inside quoted
/// literals do not count.
pub fn brackets_balanced(pattern: &Pattern) -> bool {
    const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];
    let mut depth = [0usize; 3];
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in pattern.tokens.iter().flat_map(|token| token.text.chars()) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        } else if let Some(kind) = PAIRS.iter().position(|(open, _)| *open == c) {
            depth[kind] += 1;
        } else if let Some(kind) = PAIRS.iter().position(|(_, close)| *close == c) {
            if depth[kind] == 0 {
                return false;
            }
            depth[kind] -= 1;
        }
    }

    depth.iter().all(|&open| open == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(raw: &[&str]) -> Pattern {
        Pattern::new(raw.iter().map(|t| t.parse().unwrap()).collect(), 2)
    }

    #[test]
    fn balanced_bracket_pattern_passes() {
        assert!(brackets_balanced(&pattern(&["-(", "=x", "+)"])));
        assert!(!brackets_balanced(&pattern(&["-(", "=x"])));
    }

    #[test]
    fn kinds_may_interleave_but_never_close_early() {
        assert!(brackets_balanced(&pattern(&["=f(", "-[", "=x", "-]", "+)"])));
        assert!(brackets_balanced(&pattern(&[
            "=i=dic", "-[", "+.get(", "=STRING", "-]", "+)"
        ])));
        assert!(!brackets_balanced(&pattern(&["-)", "+("])));
        assert!(!brackets_balanced(&pattern(&["-{", "+}", "+}"])));
    }

    #[test]
    fn quoted_brackets_are_ignored() {
        assert!(brackets_balanced(&pattern(&["=print(", "-'(:'", "+')'", "=)"])));
        assert!(brackets_balanced(&pattern(&["=s=\"a\\\"(\"", "-x", "+y"])));
    }

    #[test]
    fn rejects_symbol_only_and_changeless_patterns() {
        assert_eq!(
            check_validity(&pattern(&["-[", "+.(", "-]", "+)"])),
            Err(Invalidity::SymbolsOnly)
        );
        assert_eq!(
            check_validity(&pattern(&["=x", "-y"])),
            Err(Invalidity::NoChange)
        );
        assert_eq!(
            check_validity(&pattern(&["=x", "+y"])),
            Err(Invalidity::NoChange)
        );
        assert_eq!(
            check_validity(&pattern(&["=dic", "-[", "+.get("])),
            Err(Invalidity::UnbalancedBrackets)
        );
        assert_eq!(
            check_validity(&pattern(&["=i=dic", "-[", "+.get(", "=STRING", "-]", "+)"])),
            Ok(())
        );
    }
}
