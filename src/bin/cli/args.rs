//! CLI argument structures.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fixmine::core::config::ShardBy;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mine recurring fix patterns from before/after code diffs
#[derive(Parser)]
#[command(name = "fixmine")]
#[command(version = VERSION)]
#[command(about = "Mine recurring fix patterns from before/after code diffs")]
#[command(long_about = "
Abstracts diff hunks, turns them into polarity-tagged token sequences, mines
frequent sub-sequences per shard and keeps the patterns that hold up on a
held-out corpus.

Common Usage:

  # Mine per-year shards and write merged patterns
  fixmine mine train.json --out .fixmine

  # Score merged patterns against held-out hunks
  fixmine filter .fixmine/patterns.json held_out.json --out fixes.json

  # Everything in one go
  fixmine run train.json held_out.json --out .fixmine

  # Mine an existing token-sequence corpus
  fixmine mine --sequences corpus.json --out .fixmine

  # Look at what a pattern file contains
  fixmine explain fixes.json --top 10
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mine change patterns from diff records, one shard at a time
    Mine(MineArgs),

    /// Merge pattern files by summing the support of identical patterns
    Merge(MergeArgs),

    /// Validate, prune and score merged patterns against held-out records
    Filter(FilterArgs),

    /// Mine, merge and filter in one run
    Run(RunArgs),

    /// Print trigger and change projections of a pattern file
    Explain(ExplainArgs),

    /// List supported programming languages
    #[command(name = "list-languages")]
    ListLanguages,

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a fixmine configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Log line format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable
    Text,
    /// One JSON object per line
    Json,
}

/// Shard partitioning override
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShardByArg {
    /// One shard per calendar year
    Year,
    /// A single shard
    None,
}

impl From<ShardByArg> for ShardBy {
    fn from(value: ShardByArg) -> Self {
        match value {
            ShardByArg::Year => ShardBy::Year,
            ShardByArg::None => ShardBy::None,
        }
    }
}

/// Overrides shared by the mining commands
#[derive(Args, Clone, Default)]
pub struct MiningOverrides {
    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum support for mined patterns
    #[arg(long)]
    pub min_support: Option<usize>,

    /// Shard partitioning
    #[arg(long, value_enum)]
    pub shard_by: Option<ShardByArg>,

    /// Worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Run the oracle through this docker image
    #[arg(long)]
    pub docker_image: Option<String>,
}

#[derive(Args)]
pub struct MineArgs {
    /// JSON array of diff records
    #[arg(required_unless_present = "sequences", conflicts_with = "sequences")]
    pub records: Option<PathBuf>,

    /// Mine a token-sequence corpus (array of arrays of `+`/`-`/`=` tokens)
    /// instead of diff records
    #[arg(long, value_name = "JSON")]
    pub sequences: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".fixmine")]
    pub out: PathBuf,

    /// Also write each shard's token-sequence corpus and the sequences left
    /// unmined for length
    #[arg(long)]
    pub dump_sequences: bool,

    #[command(flatten)]
    pub overrides: MiningOverrides,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Pattern files to merge
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Merged output file
    #[arg(short, long, default_value = "patterns.json")]
    pub out: PathBuf,
}

/// Overrides for the filter stage
#[derive(Args, Clone, Default)]
pub struct FilterOverrides {
    /// Minimum confidence to keep a pattern
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum merged support to keep a pattern
    #[arg(long)]
    pub min_pruning_support: Option<usize>,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Merged pattern file
    pub patterns: PathBuf,

    /// JSON array of held-out diff records
    pub held_out: PathBuf,

    /// Final artifact
    #[arg(short, long, default_value = "fixes.json")]
    pub out: PathBuf,

    #[command(flatten)]
    pub overrides: MiningOverrides,

    #[command(flatten)]
    pub filter: FilterOverrides,
}

#[derive(Args)]
pub struct RunArgs {
    /// JSON array of training diff records
    pub training: PathBuf,

    /// JSON array of held-out diff records
    pub held_out: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".fixmine")]
    pub out: PathBuf,

    /// Also write each shard's token-sequence corpus
    #[arg(long)]
    pub dump_sequences: bool,

    #[command(flatten)]
    pub overrides: MiningOverrides,

    #[command(flatten)]
    pub filter: FilterOverrides,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Pattern file (mined or scored)
    pub patterns: PathBuf,

    /// Number of patterns to show
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".fixmine.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,

    /// Show every setting
    #[arg(long)]
    pub detailed: bool,
}
