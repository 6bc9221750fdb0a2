//! JSON readers and writers for records, sequence corpora and patterns.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::errors::{FixmineError, Result};
use crate::core::model::{render_sequence, DiffRecord, Pattern, ScoredPattern, TokenSequence};
use crate::mining::corpus_from_json;

/// Deserialize a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .map_err(|e| FixmineError::io(format!("Failed to open {}", path.display()), e))?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            FixmineError::io(format!("Failed to create {}", parent.display()), e)
        })?;
    }
    let file = File::create(path)
        .map_err(|e| FixmineError::io(format!("Failed to create {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|e| FixmineError::io(format!("Failed to write {}", path.display()), e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Read a JSON array of diff records.
pub fn read_records(path: &Path) -> Result<Vec<DiffRecord>> {
    read_json(path)
}

/// Read a token-sequence corpus, rejecting anything that is not an array of
/// arrays of tagged token strings.
pub fn read_sequences(path: &Path) -> Result<Vec<TokenSequence>> {
    let document: Value = read_json(path)?;
    corpus_from_json(&document)
}

/// Write a token-sequence corpus as arrays of rendered tokens.
pub fn write_sequences(path: &Path, sequences: &[TokenSequence]) -> Result<()> {
    let rendered: Vec<Vec<String>> = sequences.iter().map(|s| render_sequence(s)).collect();
    write_json(path, &rendered)
}

/// Read mined patterns (`{pattern, support}` records).
pub fn read_patterns(path: &Path) -> Result<Vec<Pattern>> {
    read_json(path)
}

/// Write mined patterns.
pub fn write_patterns(path: &Path, patterns: &[Pattern]) -> Result<()> {
    write_json(path, patterns)
}

/// Write the final artifact.
pub fn write_scored_patterns(path: &Path, patterns: &[ScoredPattern]) -> Result<()> {
    write_json(path, patterns)
}
