//! Error types for the fixmine library.
//!
//! Every stage of the mining pipeline reports failures through [`FixmineError`].
//! Variants carry enough structured context for the pipeline to decide whether a
//! failure is local (skip one hunk or one oracle entry) or fatal for a shard.

use std::io;
use std::num::ParseIntError;

use thiserror::Error;

/// Main result type for fixmine operations.
pub type Result<T> = std::result::Result<T, FixmineError>;

/// Comprehensive error type for all fixmine operations.
#[derive(Error, Debug)]
pub enum FixmineError {
    /// I/O related errors (record files, scratch directories, pattern artifacts)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// A source line could not be split into lexical tokens
    #[error("Tokenization error in {language}: {message}")]
    Tokenization {
        /// Language key of the tokenizer that failed
        language: String,
        /// Error description
        message: String,
        /// Offending source line (if available)
        line: Option<String>,
    },

    /// The structural equivalence oracle could not be invoked or answered garbage
    #[error("Oracle error: {message}")]
    Oracle {
        /// Error description
        message: String,
        /// Exit code of the oracle process, when it ran
        exit_code: Option<i32>,
        /// Captured standard error of the oracle process
        stderr: Option<String>,
    },

    /// A single oracle match/action entry did not follow `kind: text [start,end]`
    #[error("Malformed oracle entry: {message}")]
    WireFormat {
        /// Error description
        message: String,
        /// Raw entry text
        entry: String,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
        /// Expected value or format
        expected: Option<String>,
        /// Actual value received
        actual: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
        /// Number of records processed before error
        processed_count: Option<usize>,
    },

    /// Unsupported operation or language
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl FixmineError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new tokenization error
    pub fn tokenization(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tokenization {
            language: language.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Create a new tokenization error that remembers the offending line
    pub fn tokenization_at(
        language: impl Into<String>,
        message: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self::Tokenization {
            language: language.into(),
            message: message.into(),
            line: Some(line.into()),
        }
    }

    /// Create a new oracle error
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
            exit_code: None,
            stderr: None,
        }
    }

    /// Create an oracle error for a process that exited unsuccessfully
    pub fn oracle_exit(
        message: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Oracle {
            message: message.into(),
            exit_code,
            stderr: Some(stderr.into()),
        }
    }

    /// Create a new wire-format error for one oracle entry
    pub fn wire_format(message: impl Into<String>, entry: impl Into<String>) -> Self {
        Self::WireFormat {
            message: message.into(),
            entry: entry.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a validation error describing an expected/actual mismatch
    pub fn validation_mismatch(
        message: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
            processed_count: None,
        }
    }

    /// Create a new unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } | Self::Oracle { message, .. } => {
                *message = format!("{}: {}", context.into(), message);
            }
            _ => {}
        }
        self
    }

    /// True when the failure is confined to a single hunk and the batch may continue.
    pub fn is_hunk_local(&self) -> bool {
        matches!(
            self,
            Self::Tokenization { .. } | Self::Oracle { .. } | Self::WireFormat { .. }
        )
    }
}

impl From<io::Error> for FixmineError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for FixmineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for FixmineError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ParseIntError> for FixmineError {
    fn from(err: ParseIntError) -> Self {
        Self::validation(format!("Invalid integer: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FixmineError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FixmineError::config("Invalid configuration");
        assert!(matches!(err, FixmineError::Config { .. }));

        let err = FixmineError::tokenization("py", "EOF in multi-line statement");
        assert!(matches!(err, FixmineError::Tokenization { .. }));
    }

    #[test]
    fn test_internal_with_context() {
        let err = FixmineError::internal("Something went wrong").with_context("During mining");

        if let FixmineError::Internal { context, .. } = err {
            assert_eq!(context, Some("During mining".to_string()));
        } else {
            panic!("Expected Internal error");
        }
    }

    #[test]
    fn test_oracle_context_prefixes_message() {
        let err = FixmineError::oracle("exit status 1").with_context("gumtree textdiff");
        assert_eq!(err.to_string(), "Oracle error: gumtree textdiff: exit status 1");
    }

    #[test]
    fn test_hunk_local_classification() {
        assert!(FixmineError::oracle("boom").is_hunk_local());
        assert!(FixmineError::tokenization("py", "bad").is_hunk_local());
        assert!(FixmineError::wire_format("no bracket", "identifier: x").is_hunk_local());
        assert!(!FixmineError::validation("bad corpus").is_hunk_local());
        assert!(!FixmineError::config("bad").is_hunk_local());
    }

    #[test]
    fn test_oracle_exit_keeps_stderr() {
        let err = FixmineError::oracle_exit("gumtree failed", Some(2), "No such file");
        if let FixmineError::Oracle {
            exit_code, stderr, ..
        } = err
        {
            assert_eq!(exit_code, Some(2));
            assert_eq!(stderr.as_deref(), Some("No such file"));
        } else {
            panic!("Expected Oracle error");
        }
    }

    #[test]
    fn test_validation_mismatch_fields() {
        let err = FixmineError::validation_mismatch("bad", "min_support", ">= 1", "0");
        if let FixmineError::Validation {
            field,
            expected,
            actual,
            ..
        } = err
        {
            assert_eq!(field.as_deref(), Some("min_support"));
            assert_eq!(expected.as_deref(), Some(">= 1"));
            assert_eq!(actual.as_deref(), Some("0"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_result_extension() {
        let result: std::result::Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));

        let err = result.context("Failed to read records").unwrap_err();
        assert!(matches!(err, FixmineError::Io { .. }));
        assert!(err.to_string().contains("Failed to read records"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: FixmineError = json_err.into();

        if let FixmineError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "x".parse::<i32>().unwrap_err();
        let err: FixmineError = parse_err.into();
        assert!(matches!(err, FixmineError::Validation { .. }));
    }
}
