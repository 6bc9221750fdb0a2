//! Mining pipeline
//!
//! Drives the four stages over a record corpus:
//!
//! 1. **Abstraction**: stable identifiers and literals become placeholders
//! 2. **Sequencing**: each hunk becomes polarity-tagged token sequences
//! 3. **Mining**: PrefixSpan runs per shard, shards in parallel
//! 4. **Filtering**: shard results are merged, pruned and scored against
//!    held-out hunks
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use fixmine::core::config::FixmineConfig;
//! use fixmine::core::pipeline::MiningPipeline;
//! use fixmine::oracle::GumTreeOracle;
//!
//! let config = FixmineConfig::default();
//! let oracle = Arc::new(GumTreeOracle::new(config.oracle.clone())?);
//! let pipeline = MiningPipeline::new(config, oracle)?;
//! let run = pipeline.run(training, &held_out)?;
//! ```

mod executor;
mod shard;

pub use executor::{MiningPipeline, PipelineRun, ProgressCallback, ShardOutcome, ShardStats};
pub use shard::{partition_records, Shard, SINGLE_SHARD, UNKNOWN_SHARD};
