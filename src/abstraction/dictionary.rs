//! Names that are never abstracted: keywords, built-ins and generic methods.

use std::path::Path;

use ahash::AHashSet;
use tracing::debug;

use crate::core::config::AbstractionConfig;
use crate::core::errors::{FixmineError, Result};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const BUILTINS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "copyright", "credits",
    "delattr", "dict", "dir", "divmod", "enumerate", "eval", "exec", "exit", "filter", "float",
    "format", "frozenset", "getattr", "globals", "hasattr", "hash", "help", "hex", "id",
    "input", "int", "isinstance", "issubclass", "iter", "len", "license", "list", "locals",
    "map", "max", "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
    "property", "quit", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
    "__build_class__", "__debug__", "__doc__", "__import__", "__loader__", "__name__",
    "__package__", "__spec__", "Ellipsis", "NotImplemented",
    "ArithmeticError", "AssertionError", "AttributeError", "BaseException",
    "BaseExceptionGroup", "BlockingIOError", "BrokenPipeError", "BufferError", "BytesWarning",
    "ChildProcessError", "ConnectionAbortedError", "ConnectionError", "ConnectionRefusedError",
    "ConnectionResetError", "DeprecationWarning", "EOFError", "EncodingWarning",
    "EnvironmentError", "Exception", "ExceptionGroup", "FileExistsError", "FileNotFoundError",
    "FloatingPointError", "FutureWarning", "GeneratorExit", "IOError", "ImportError",
    "ImportWarning", "IndentationError", "IndexError", "InterruptedError", "IsADirectoryError",
    "KeyError", "KeyboardInterrupt", "LookupError", "MemoryError", "ModuleNotFoundError",
    "NameError", "NotADirectoryError", "NotImplementedError", "OSError", "OverflowError",
    "PendingDeprecationWarning", "PermissionError", "ProcessLookupError", "RecursionError",
    "ReferenceError", "ResourceWarning", "RuntimeError", "RuntimeWarning",
    "StopAsyncIteration", "StopIteration", "SyntaxError", "SyntaxWarning", "SystemError",
    "SystemExit", "TabError", "TimeoutError", "TypeError", "UnboundLocalError",
    "UnicodeDecodeError", "UnicodeEncodeError", "UnicodeError", "UnicodeTranslateError",
    "UnicodeWarning", "UserWarning", "ValueError", "Warning", "ZeroDivisionError",
];

const GENERIC_METHODS: &[&str] = &[
    "__init__", "__str__", "__repr__", "append", "extend", "pop", "clear", "update", "dispose",
    "cancel", "close", "get", "set", "validate", "check",
];

/// Set of identifiers the abstractor must leave untouched.
#[derive(Debug, Clone)]
pub struct ReservedNames {
    names: AHashSet<String>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReservedNames {
    /// Keywords, built-ins and the generic method names.
    pub fn builtin() -> Self {
        let names = KEYWORDS
            .iter()
            .chain(BUILTINS)
            .chain(GENERIC_METHODS)
            .map(|name| name.to_string())
            .collect();
        Self { names }
    }

    /// Built-in set extended with the configured names and dictionary file.
    pub fn from_config(config: &AbstractionConfig) -> Result<Self> {
        let mut reserved = Self::builtin().with_names(config.extra_reserved_names.iter().cloned());
        if let Some(path) = &config.dictionary_path {
            reserved.load_dictionary(path)?;
        }
        Ok(reserved)
    }

    /// Add names.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add every name from a JSON array file.
    pub fn load_dictionary(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FixmineError::io(format!("Failed to read dictionary: {}", path.display()), e)
        })?;
        let names: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            FixmineError::config_field(
                format!("Dictionary {} is not a JSON array of names: {e}", path.display()),
                "abstraction.dictionary_path",
            )
        })?;
        let added = names.len();
        self.names.extend(names);
        debug!("Loaded {} reserved names from {}", added, path.display());
        Ok(added)
    }

    /// Whether `name` must not be abstracted.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of reserved names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no names are reserved.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
