//! End-to-end executor: records in, scored patterns out.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::abstraction::{DiffAbstractor, ReservedNames};
use crate::core::config::FixmineConfig;
use crate::core::errors::{FixmineError, Result};
use crate::core::model::{DiffHunk, DiffRecord, Pattern, ScoredPattern, TokenSequence};
use crate::filter::{ConfidenceEvaluator, FilterReport, HeldOutHunk, PatternFilter, ShardResults};
use crate::lang::{language_key_for_path, normalize_language_key, Tokenizer, TokenizerSet};
use crate::mining::{retain_change_patterns, PrefixSpan};
use crate::oracle::StructuralOracle;
use crate::sequencing::{SequencingStats, TokenDiffSequencer};

use super::shard::{partition_records, Shard};

/// Progress callback function type
pub type ProgressCallback = Box<dyn Fn(&str, f64) + Send + Sync>;

/// What happened to one shard's records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardStats {
    /// Records in the shard
    pub records: usize,
    /// Records dropped for an empty side
    pub empty_sides: usize,
    /// Records whose language could not be resolved
    pub unsupported: usize,
    /// Hunks skipped after an oracle or tokenizer failure
    pub skipped_hunks: usize,
    /// Sequencing tallies
    pub sequencing: SequencingStats,
    /// Sequences the miner left unexpanded for length
    pub oversized_sequences: usize,
}

/// Result of mining one shard.
#[derive(Debug, Clone)]
pub struct ShardOutcome {
    /// Shard id
    pub shard: String,
    /// Token sequences the shard produced
    pub sequences: Vec<TokenSequence>,
    /// Change patterns mined from those sequences
    pub patterns: Vec<Pattern>,
    /// Sequences over the token ceiling, left unmined
    pub oversized: Vec<TokenSequence>,
    /// Record tallies
    pub stats: ShardStats,
    /// Error that stopped the shard early; the outcome then covers only the
    /// records processed before it
    pub failure: Option<String>,
}

/// Everything a full run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Per-shard outcomes ordered by shard id
    pub shards: Vec<ShardOutcome>,
    /// Patterns after cross-shard merging
    pub merged: Vec<Pattern>,
    /// Final scored artifact
    pub artifact: Vec<ScoredPattern>,
    /// Filter stage tallies
    pub report: FilterReport,
}

/// Orchestrates abstraction, sequencing, mining and filtering.
pub struct MiningPipeline {
    config: FixmineConfig,
    oracle: Arc<dyn StructuralOracle>,
    reserved: ReservedNames,
    sequencer: TokenDiffSequencer,
    default_language: &'static str,
    progress: Option<ProgressCallback>,
}

impl MiningPipeline {
    /// Create a pipeline. The configuration is validated and the reserved-name
    /// dictionary loaded up front.
    pub fn new(config: FixmineConfig, oracle: Arc<dyn StructuralOracle>) -> Result<Self> {
        config.validate()?;
        let reserved = ReservedNames::from_config(&config.abstraction)?;
        let default_language =
            normalize_language_key(&config.sequencing.language).ok_or_else(|| {
                FixmineError::config_field(
                    format!("Unknown language: {}", config.sequencing.language),
                    "sequencing.language",
                )
            })?;
        let sequencer = TokenDiffSequencer::new(&config.sequencing);
        Ok(Self {
            config,
            oracle,
            reserved,
            sequencer,
            default_language,
            progress: None,
        })
    }

    /// Report shard completion through `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &FixmineConfig {
        &self.config
    }

    /// Language key for a record: from its file name when present, otherwise
    /// the configured default.
    pub fn language_for(&self, record: &DiffRecord) -> Option<&'static str> {
        match &record.file_name {
            Some(name) => language_key_for_path(Path::new(name)),
            None => Some(self.default_language),
        }
    }

    /// Abstract one hunk and turn it into token sequences.
    pub fn sequence_hunk(
        &self,
        hunk: &DiffHunk,
        tokenizer: &mut Tokenizer,
        stats: &mut SequencingStats,
    ) -> Result<Vec<TokenSequence>> {
        let Some(abstracted) = self.abstract_within_ceiling(hunk, tokenizer, stats)? else {
            return Ok(Vec::new());
        };
        self.sequencer
            .sequence_hunk(self.oracle.as_ref(), tokenizer, &abstracted, stats)
    }

    fn abstract_within_ceiling(
        &self,
        hunk: &DiffHunk,
        tokenizer: &mut Tokenizer,
        stats: &mut SequencingStats,
    ) -> Result<Option<DiffHunk>> {
        // Abstraction keeps line counts, so oversized hunks skip the oracle.
        if hunk.max_side_len() > self.config.sequencing.max_hunk_lines {
            stats.oversized_hunks += 1;
            return Ok(None);
        }
        let abstracted = DiffAbstractor::new(self.oracle.as_ref(), &self.reserved)
            .with_function_normalization(self.config.abstraction.normalize_function_names)
            .abstract_hunk(hunk, tokenizer)?;
        Ok(Some(abstracted.hunk))
    }

    /// Sequence every record of a shard, then mine it.
    pub fn mine_shard(&self, shard: &Shard) -> Result<ShardOutcome> {
        let started = Instant::now();
        let mut tokenizers = TokenizerSet::new();
        let mut stats = ShardStats {
            records: shard.records.len(),
            ..ShardStats::default()
        };
        let mut sequences = Vec::new();
        let mut failure = None;

        for record in &shard.records {
            let hunk = record.hunk();
            if hunk.has_empty_side() {
                stats.empty_sides += 1;
                continue;
            }
            let Some(language) = self.language_for(record) else {
                warn!(
                    "Skipping record with unsupported file {:?}",
                    record.file_name.as_deref().unwrap_or_default()
                );
                stats.unsupported += 1;
                continue;
            };
            let tokenizer = match tokenizers.get(language) {
                Ok(tokenizer) => tokenizer,
                Err(err) => {
                    warn!("Skipping record: {}", err);
                    stats.unsupported += 1;
                    continue;
                }
            };

            match self.sequence_hunk(&hunk, tokenizer, &mut stats.sequencing) {
                Ok(produced) => sequences.extend(produced),
                Err(err) if err.is_hunk_local() => {
                    warn!("Skipping hunk in shard {}: {}", shard.id, err);
                    stats.skipped_hunks += 1;
                }
                Err(err) => {
                    warn!("Shard {} stopped early: {}", shard.id, err);
                    failure = Some(err.to_string());
                    break;
                }
            }
        }

        let mut outcome = self.mine_corpus(&shard.id, sequences)?;
        stats.oversized_sequences = outcome.stats.oversized_sequences;
        outcome.stats = stats;
        outcome.failure = failure;

        info!(
            "Shard {}: {} records -> {} sequences -> {} change patterns in {:?}",
            shard.id,
            outcome.stats.records,
            outcome.sequences.len(),
            outcome.patterns.len(),
            started.elapsed()
        );
        Ok(outcome)
    }

    /// Mine an already sequenced corpus as one shard.
    pub fn mine_corpus(
        &self,
        shard: impl Into<String>,
        sequences: Vec<TokenSequence>,
    ) -> Result<ShardOutcome> {
        let miner = PrefixSpan::new(
            self.config.mining.min_support,
            self.config.sequencing.max_sequence_tokens,
        )?;
        let mined = miner.mine(&sequences);
        let patterns = retain_change_patterns(mined.patterns);
        Ok(ShardOutcome {
            shard: shard.into(),
            sequences,
            patterns,
            stats: ShardStats {
                oversized_sequences: mined.oversized.len(),
                ..ShardStats::default()
            },
            oversized: mined.oversized,
            failure: None,
        })
    }

    /// Partition `records` and mine every shard in parallel.
    pub fn mine(&self, records: Vec<DiffRecord>) -> Result<Vec<ShardOutcome>> {
        let shards = partition_records(records, self.config.performance.shard_by);
        info!("Mining {} shards", shards.len());

        let finished = AtomicUsize::new(0);
        let total = shards.len().max(1);
        let run = || {
            shards
                .par_iter()
                .map(|shard| {
                    let outcome = self.mine_shard(shard);
                    let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(progress) = &self.progress {
                        progress(&format!("shard {}", shard.id), done as f64 / total as f64);
                    }
                    outcome
                })
                .collect::<Result<Vec<_>>>()
        };

        match self.config.performance.max_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| {
                    FixmineError::pipeline("mining", format!("failed to build thread pool: {e}"))
                })?
                .install(run),
            None => run(),
        }
    }

    /// Abstract, split and compact held-out records for confidence scoring.
    pub fn prepare_held_out(&self, records: &[DiffRecord]) -> Vec<HeldOutHunk> {
        let prepared: Vec<Vec<HeldOutHunk>> = records
            .par_iter()
            .map_init(TokenizerSet::new, |tokenizers, record| {
                self.prepare_record(tokenizers, record)
            })
            .collect();
        let held_out: Vec<HeldOutHunk> = prepared.into_iter().flatten().collect();
        info!(
            "Prepared {} held-out hunks from {} records",
            held_out.len(),
            records.len()
        );
        held_out
    }

    fn prepare_record(&self, tokenizers: &mut TokenizerSet, record: &DiffRecord) -> Vec<HeldOutHunk> {
        let hunk = record.hunk();
        if hunk.has_empty_side() {
            return Vec::new();
        }
        let Some(language) = self.language_for(record) else {
            return Vec::new();
        };
        let tokenizer = match tokenizers.get(language) {
            Ok(tokenizer) => tokenizer,
            Err(err) => {
                debug!("Held-out record skipped: {}", err);
                return Vec::new();
            }
        };

        let mut stats = SequencingStats::default();
        let pairs = self
            .abstract_within_ceiling(&hunk, tokenizer, &mut stats)
            .and_then(|abstracted| match abstracted {
                Some(abstracted) => self.sequencer.split_hunk(
                    self.oracle.as_ref(),
                    language,
                    &abstracted,
                    &mut stats,
                ),
                None => Ok(Vec::new()),
            });
        let pairs = match pairs {
            Ok(pairs) => pairs,
            Err(err) => {
                warn!("Held-out hunk skipped: {}", err);
                return Vec::new();
            }
        };

        pairs
            .iter()
            .filter_map(|pair| {
                let condition = compact_lines(tokenizer, &pair.condition);
                let consequent = compact_lines(tokenizer, &pair.consequent);
                match (condition, consequent) {
                    (Ok(condition), Ok(consequent)) => Some(HeldOutHunk::new(condition, consequent)),
                    (Err(err), _) | (_, Err(err)) => {
                        debug!("Held-out line pair skipped: {}", err);
                        None
                    }
                }
            })
            .collect()
    }

    /// Merge shard patterns and run the filter against held-out records.
    pub fn filter(
        &self,
        patterns: Vec<Pattern>,
        held_out: &[DiffRecord],
    ) -> Result<(Vec<ScoredPattern>, FilterReport)> {
        let evaluator = ConfidenceEvaluator::new(self.prepare_held_out(held_out));
        PatternFilter::new(&self.config.filter).filter(patterns, &evaluator)
    }

    /// Mine `training`, merge shards, then filter against `held_out`.
    pub fn run(&self, training: Vec<DiffRecord>, held_out: &[DiffRecord]) -> Result<PipelineRun> {
        let shards = self.mine(training)?;
        let mut store = ShardResults::new();
        for outcome in &shards {
            store.insert(outcome.shard.clone(), outcome.patterns.clone());
        }
        let merged = store.merged();
        let (artifact, report) = self.filter(merged.clone(), held_out)?;
        Ok(PipelineRun {
            shards,
            merged,
            artifact,
            report,
        })
    }
}

/// Compact each line on its own and join them with newlines so tokens never
/// match across a line boundary.
fn compact_lines(tokenizer: &mut Tokenizer, lines: &[String]) -> Result<String> {
    let compacted = lines
        .iter()
        .map(|line| tokenizer.compact(line))
        .collect::<Result<Vec<_>>>()?;
    Ok(compacted.join("\n"))
}
