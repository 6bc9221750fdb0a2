//! File formats the pipeline reads and writes.
//!
//! Everything is JSON: diff records in, token-sequence corpora and pattern
//! artifacts out.

pub mod persistence;

pub use persistence::{
    read_json, read_patterns, read_records, read_sequences, write_json, write_patterns,
    write_scored_patterns, write_sequences,
};
