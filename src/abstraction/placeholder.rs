//! Categorical placeholders and word-level rewriting helpers.

/// Category of an abstracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceholderKind {
    /// Stable identifier
    Variable,
    /// Stable string literal
    String,
    /// Stable integer literal
    Number,
    /// Function defined in the hunk
    Function,
}

impl PlaceholderKind {
    const ALL: [Self; 4] = [Self::Variable, Self::String, Self::Number, Self::Function];

    /// Placeholder stem, e.g. `VARIABLE` in `VARIABLE_3`.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Variable => "VARIABLE",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Function => "FUNCTION",
        }
    }

    /// Render the `index`-th placeholder of this kind.
    pub fn render(self, index: usize) -> String {
        format!("{}_{}", self.prefix(), index)
    }

    /// Regex source matching the concrete values this placeholder stands for.
    pub const fn regex_source(self) -> &'static str {
        match self {
            Self::Variable | Self::Function => r"[a-zA-Z_][a-zA-Z0-9_]*",
            Self::String => r#"['"][^'"]*['"]"#,
            Self::Number => r"\b\d+\b",
        }
    }
}

/// Parse a whole word such as `STRING_2` into its kind and index.
pub fn parse_placeholder(word: &str) -> Option<(PlaceholderKind, usize)> {
    PlaceholderKind::ALL.into_iter().find_map(|kind| {
        let index = word.strip_prefix(kind.prefix())?.strip_prefix('_')?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        index.parse().ok().map(|index| (kind, index))
    })
}

/// Whether `word` is a rendered placeholder.
pub fn is_placeholder(word: &str) -> bool {
    parse_placeholder(word).is_some()
}

/// Characters that can continue an identifier.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters that can continue a number literal.
fn is_number_char(c: char) -> bool {
    is_word_char(c) || c == '.'
}

/// Replace every occurrence of `word` that is not part of a longer identifier.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    replace_bounded(text, word, replacement, is_word_char)
}

/// Replace every occurrence of the integer `literal` that is not part of a
/// longer identifier or number, so `1` leaves `1.5` and `0.1` alone.
pub fn replace_number(text: &str, literal: &str, replacement: &str) -> String {
    replace_bounded(text, literal, replacement, is_number_char)
}

fn replace_bounded(
    text: &str,
    word: &str,
    replacement: &str,
    continues: fn(char) -> bool,
) -> String {
    if word.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(continues) || after.is_some_and(continues) {
            continue;
        }
        out.push_str(&text[copied..start]);
        out.push_str(replacement);
        copied = end;
    }
    out.push_str(&text[copied..]);
    out
}

/// Words (maximal identifier-character runs) of `text`, in order.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|word| !word.is_empty())
}

/// Render projected token texts as one regex source.
///
/// Placeholders become character classes for the values they abstract, other
/// text is escaped, and consecutive tokens may be separated by anything.
pub fn regex_source(tokens: &[&str]) -> String {
    let mut source = String::new();
    for (position, token) in tokens.iter().enumerate() {
        if position > 0 {
            source.push_str(".*");
        }
        push_token_regex(&mut source, token);
    }
    source
}

fn push_token_regex(source: &mut String, token: &str) {
    let mut word_start: Option<usize> = None;
    for (index, c) in token.char_indices() {
        if is_word_char(c) {
            word_start.get_or_insert(index);
            continue;
        }
        if let Some(start) = word_start.take() {
            push_word_regex(source, &token[start..index]);
        }
        push_escaped(source, c);
    }
    if let Some(start) = word_start {
        push_word_regex(source, &token[start..]);
    }
}

fn push_word_regex(source: &mut String, word: &str) {
    match parse_placeholder(word) {
        Some((kind, _)) => source.push_str(kind.regex_source()),
        None => word.chars().for_each(|c| push_escaped(source, c)),
    }
}

fn push_escaped(source: &mut String, c: char) {
    if r"\.+*?()|[]{}^$#&-~".contains(c) {
        source.push('\\');
    }
    source.push(c);
}
