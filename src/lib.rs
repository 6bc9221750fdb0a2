//! # Fixmine: Fix-Pattern Mining from Code Diffs
//!
//! Mines recurring, human-interpretable fix patterns from a corpus of small
//! before/after code changes:
//!
//! - **Diff Abstraction**: identifiers and literals that survive a change are
//!   replaced with category placeholders (`VARIABLE_1`, `STRING_2`, ...)
//! - **Token Diff Sequencing**: each hunk becomes an ordered list of tokens
//!   tagged kept (`=`), removed (`-`) or added (`+`)
//! - **Sequential Pattern Mining**: PrefixSpan finds every frequent
//!   order-preserving sub-sequence, shard by shard
//! - **Filtering**: shard results are merged, validated, pruned for
//!   redundancy and scored for confidence on held-out hunks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Pipeline (per shard)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Abstraction │ Sequencing  │  Mining     │  Filter          │
//! │             │             │             │                  │
//! │ • Oracle    │ • Alignment │ • PrefixSpan│ • Merge          │
//! │ • Reserved  │ • Line split│             │ • Validity       │
//! │ • Functions │ • Tokenizer │             │ • Confidence     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fixmine::{FixmineConfig, GumTreeOracle, MiningPipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FixmineConfig::default();
//!     let oracle = Arc::new(GumTreeOracle::new(config.oracle.clone())?);
//!     let pipeline = MiningPipeline::new(config, oracle)?;
//!
//!     let training = fixmine::io::read_records("train.json".as_ref())?;
//!     let held_out = fixmine::io::read_records("held_out.json".as_ref())?;
//!     let run = pipeline.run(training, &held_out)?;
//!
//!     println!("{} patterns kept", run.artifact.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Core data model and orchestration
pub mod core {
    //! Errors, configuration, data model and the pipeline driver.

    pub mod config;
    pub mod errors;
    pub mod model;
    pub mod pipeline;
}

pub mod abstraction;
pub mod filter;
pub mod io;
pub mod lang;
pub mod mining;
pub mod oracle;
pub mod sequencing;

// Re-export primary types for convenience
pub use core::config::FixmineConfig;
pub use core::errors::{FixmineError, Result, ResultExt};
pub use core::model::{
    DiffHunk, DiffRecord, Pattern, Polarity, Projection, ScoredPattern, Token, TokenSequence,
};
pub use core::pipeline::{MiningPipeline, PipelineRun};
pub use oracle::{GumTreeOracle, ScriptedOracle, StructuralOracle};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
