//! Token diff sequencing: turn an abstracted hunk into polarity-tagged token
//! sequences ready for mining.

pub mod alignment;
pub mod line_split;

use tracing::{debug, warn};

use crate::core::config::SequencingConfig;
use crate::core::errors::Result;
use crate::core::model::{DiffHunk, Token, TokenSequence};
use crate::lang::Tokenizer;
use crate::oracle::StructuralOracle;

pub use alignment::{OpTag, Opcode, SequenceMatcher};
pub use line_split::split_into_update_lines;

/// Tag every token of the edit script turning `condition` into `consequent`.
///
/// Replaced spans emit all removed tokens before the added ones.
pub fn compute_token_diff(condition: &[String], consequent: &[String]) -> TokenSequence {
    let mut tagged = Vec::with_capacity(condition.len().max(consequent.len()));
    for op in SequenceMatcher::new(condition, consequent).opcodes() {
        let removed = &condition[op.a_start..op.a_end];
        let added = &consequent[op.b_start..op.b_end];
        match op.tag {
            OpTag::Equal => tagged.extend(removed.iter().map(Token::kept)),
            OpTag::Delete => tagged.extend(removed.iter().map(Token::removed)),
            OpTag::Insert => tagged.extend(added.iter().map(Token::added)),
            OpTag::Replace => {
                tagged.extend(removed.iter().map(Token::removed));
                tagged.extend(added.iter().map(Token::added));
            }
        }
    }
    tagged
}

/// Fuse each run of consecutive same-polarity tokens into one token.
pub fn merge_consecutive_tokens(tokens: TokenSequence) -> TokenSequence {
    let mut merged: TokenSequence = Vec::with_capacity(tokens.len());
    for token in tokens {
        match merged.last_mut() {
            Some(last) if last.polarity == token.polarity => last.text.push_str(&token.text),
            _ => merged.push(token),
        }
    }
    merged
}

/// Tally of what happened to hunks while sequencing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequencingStats {
    /// Hunks dropped for exceeding the line ceiling
    pub oversized_hunks: usize,
    /// Line pairs dropped because a line failed to tokenize
    pub untokenizable: usize,
    /// Sequences dropped for exceeding the token ceiling
    pub oversized_sequences: usize,
}

impl SequencingStats {
    /// Add another tally into this one.
    pub fn absorb(&mut self, other: SequencingStats) {
        self.oversized_hunks += other.oversized_hunks;
        self.untokenizable += other.untokenizable;
        self.oversized_sequences += other.oversized_sequences;
    }
}

/// Applies the multi-line policy and produces the token sequences of a hunk.
#[derive(Debug, Clone)]
pub struct TokenDiffSequencer {
    max_hunk_lines: usize,
    max_sequence_tokens: usize,
}

impl TokenDiffSequencer {
    /// Create a sequencer from configuration.
    pub fn new(config: &SequencingConfig) -> Self {
        Self {
            max_hunk_lines: config.max_hunk_lines,
            max_sequence_tokens: config.max_sequence_tokens,
        }
    }

    /// Token ceiling applied to output sequences.
    pub fn max_sequence_tokens(&self) -> usize {
        self.max_sequence_tokens
    }

    /// Line pairs to sequence for an abstracted hunk.
    ///
    /// Hunks over the line ceiling yield nothing. Hunks whose sides differ in
    /// length, or that have a single line, are kept whole. Otherwise the oracle
    /// is asked for update actions and every updated line becomes its own pair.
    pub fn split_hunk(
        &self,
        oracle: &dyn StructuralOracle,
        language: &str,
        hunk: &DiffHunk,
        stats: &mut SequencingStats,
    ) -> Result<Vec<DiffHunk>> {
        if hunk.max_side_len() > self.max_hunk_lines {
            debug!(
                "Dropping hunk with {} lines (ceiling {})",
                hunk.max_side_len(),
                self.max_hunk_lines
            );
            stats.oversized_hunks += 1;
            return Ok(Vec::new());
        }

        if hunk.condition.len() != hunk.consequent.len() || hunk.condition.len() == 1 {
            return Ok(vec![hunk.clone()]);
        }

        let structure = oracle.diff(language, &hunk.condition, &hunk.consequent)?;
        Ok(split_into_update_lines(hunk, &structure))
    }

    /// Merged token diff of one line pair.
    pub fn token_diff(&self, tokenizer: &mut Tokenizer, pair: &DiffHunk) -> Result<TokenSequence> {
        let condition = tokenize_lines(tokenizer, &pair.condition)?;
        let consequent = tokenize_lines(tokenizer, &pair.consequent)?;
        Ok(merge_consecutive_tokens(compute_token_diff(
            &condition,
            &consequent,
        )))
    }

    /// Split, tokenize and diff an abstracted hunk.
    ///
    /// Pairs that fail to tokenize, come out empty or exceed the token ceiling
    /// are dropped and counted in `stats`. Only oracle failures are returned.
    pub fn sequence_hunk(
        &self,
        oracle: &dyn StructuralOracle,
        tokenizer: &mut Tokenizer,
        hunk: &DiffHunk,
        stats: &mut SequencingStats,
    ) -> Result<Vec<TokenSequence>> {
        let language = tokenizer.language().key;
        let pairs = self.split_hunk(oracle, language, hunk, stats)?;

        let mut sequences = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            let sequence = match self.token_diff(tokenizer, pair) {
                Ok(sequence) => sequence,
                Err(err) => {
                    warn!("Skipping line pair: {}", err);
                    stats.untokenizable += 1;
                    continue;
                }
            };
            if sequence.is_empty() {
                continue;
            }
            if sequence.len() > self.max_sequence_tokens {
                debug!(
                    "Dropping sequence of {} tokens (ceiling {})",
                    sequence.len(),
                    self.max_sequence_tokens
                );
                stats.oversized_sequences += 1;
                continue;
            }
            sequences.push(sequence);
        }
        Ok(sequences)
    }
}

fn tokenize_lines(tokenizer: &mut Tokenizer, lines: &[String]) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    for line in lines {
        tokens.extend(tokenizer.tokenize(line)?);
    }
    Ok(tokens)
}
