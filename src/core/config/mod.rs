//! Configuration types and management for fixmine.
//!
//! Every section deserializes with defaults so a partial YAML file (or none at
//! all) yields a usable configuration. [`FixmineConfig::validate`] is run by the
//! CLI before any stage starts.

pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{FixmineError, Result};

pub use validation::{
    validate_non_blank, validate_positive_u64, validate_positive_usize, validate_unit_range,
};

/// Main configuration for the fix-pattern mining pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixmineConfig {
    /// Diff abstraction settings
    #[serde(default)]
    pub abstraction: AbstractionConfig,

    /// Token diff sequencing settings
    #[serde(default)]
    pub sequencing: SequencingConfig,

    /// Sequential pattern mining settings
    #[serde(default)]
    pub mining: MiningConfig,

    /// Pattern filtering and confidence settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Structural equivalence oracle invocation
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Parallelism and sharding
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl FixmineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FixmineError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            FixmineError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.abstraction.validate()?;
        self.sequencing.validate()?;
        self.mining.validate()?;
        self.filter.validate()?;
        self.oracle.validate()?;
        self.performance.validate()?;
        Ok(())
    }
}

/// Diff abstraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractionConfig {
    /// Additional names that are never abstracted
    #[serde(default)]
    pub extra_reserved_names: Vec<String>,

    /// JSON file holding an array of additional reserved names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,

    /// Rename defined functions to `FUNCTION_<n>` before structural abstraction
    #[serde(default = "default_true")]
    pub normalize_function_names: bool,
}

impl Default for AbstractionConfig {
    fn default() -> Self {
        Self {
            extra_reserved_names: Vec::new(),
            dictionary_path: None,
            normalize_function_names: true,
        }
    }
}

impl AbstractionConfig {
    /// Validate abstraction configuration
    pub fn validate(&self) -> Result<()> {
        for name in &self.extra_reserved_names {
            validate_non_blank(name, "abstraction.extra_reserved_names")?;
        }
        if let Some(path) = &self.dictionary_path {
            if !path.exists() {
                return Err(FixmineError::config_field(
                    format!("Dictionary file not found: {}", path.display()),
                    "abstraction.dictionary_path",
                ));
            }
        }
        Ok(())
    }
}

/// Token diff sequencing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencingConfig {
    /// Hunks with more abstracted lines than this on either side are discarded
    #[serde(default = "SequencingConfig::default_max_hunk_lines")]
    pub max_hunk_lines: usize,

    /// Token sequences longer than this are not mined
    #[serde(default = "SequencingConfig::default_max_sequence_tokens")]
    pub max_sequence_tokens: usize,

    /// Language key used when a record carries no file name
    #[serde(default = "SequencingConfig::default_language")]
    pub language: String,
}

impl Default for SequencingConfig {
    fn default() -> Self {
        Self {
            max_hunk_lines: Self::default_max_hunk_lines(),
            max_sequence_tokens: Self::default_max_sequence_tokens(),
            language: Self::default_language(),
        }
    }
}

impl SequencingConfig {
    const fn default_max_hunk_lines() -> usize {
        5
    }

    const fn default_max_sequence_tokens() -> usize {
        15
    }

    fn default_language() -> String {
        "py".to_string()
    }

    /// Validate sequencing configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.max_hunk_lines, "sequencing.max_hunk_lines")?;
        validate_positive_usize(self.max_sequence_tokens, "sequencing.max_sequence_tokens")?;
        validate_non_blank(&self.language, "sequencing.language")?;
        Ok(())
    }
}

/// Sequential pattern mining configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum number of sequences a pattern must occur in
    #[serde(default = "MiningConfig::default_min_support")]
    pub min_support: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: Self::default_min_support(),
        }
    }
}

impl MiningConfig {
    const fn default_min_support() -> usize {
        2
    }

    /// Validate mining configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.min_support, "mining.min_support")
    }
}

/// Pattern filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Patterns scoring below this confidence are dropped
    #[serde(default = "FilterConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Patterns with merged support below this are dropped before pruning
    #[serde(default = "FilterConfig::default_min_pruning_support")]
    pub min_pruning_support: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: Self::default_confidence_threshold(),
            min_pruning_support: Self::default_min_pruning_support(),
        }
    }
}

impl FilterConfig {
    const fn default_confidence_threshold() -> f64 {
        0.10
    }

    const fn default_min_pruning_support() -> usize {
        2
    }

    /// Validate filter configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(self.confidence_threshold, "filter.confidence_threshold")?;
        validate_positive_usize(self.min_pruning_support, "filter.min_pruning_support")?;
        Ok(())
    }
}

/// Structural equivalence oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Oracle executable
    #[serde(default = "OracleConfig::default_command")]
    pub command: String,

    /// Arguments placed before the two fragment paths
    #[serde(default = "OracleConfig::default_args")]
    pub args: Vec<String>,

    /// Run the oracle inside this container image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,

    /// Seconds before an oracle call is abandoned
    #[serde(default = "OracleConfig::default_timeout_secs")]
    pub timeout_secs: u64,

    /// Parent directory for per-call scratch directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Self::default_args(),
            docker_image: None,
            timeout_secs: Self::default_timeout_secs(),
            scratch_dir: None,
        }
    }
}

impl OracleConfig {
    fn default_command() -> String {
        "gumtree".to_string()
    }

    fn default_args() -> Vec<String> {
        vec!["textdiff".to_string(), "-f".to_string(), "JSON".to_string()]
    }

    const fn default_timeout_secs() -> u64 {
        60
    }

    /// Validate oracle configuration
    pub fn validate(&self) -> Result<()> {
        validate_non_blank(&self.command, "oracle.command")?;
        validate_positive_u64(self.timeout_secs, "oracle.timeout_secs")?;
        if let Some(image) = &self.docker_image {
            validate_non_blank(image, "oracle.docker_image")?;
        }
        Ok(())
    }
}

/// How records are partitioned into independently mined shards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardBy {
    /// One shard per calendar year of the merge timestamp
    #[default]
    Year,
    /// A single shard holding every record
    None,
}

/// Performance configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Worker threads for shard processing (rayon default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,

    /// Shard partitioning strategy
    #[serde(default)]
    pub shard_by: ShardBy,
}

impl PerformanceConfig {
    /// Validate performance configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.max_threads {
            validate_positive_usize(threads, "performance.max_threads")?;
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
