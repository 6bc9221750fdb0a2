//! Language support: grammar registry and lexical tokenizer.

pub mod registry;
pub mod tokenizer;

pub use registry::{
    create_parser_for_language, get_tree_sitter_language,
    language_info, language_key_for_path, normalize_language_key, registered_languages,
    LanguageInfo,
};
pub use tokenizer::{Tokenizer, TokenizerSet};
