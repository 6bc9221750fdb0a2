//! In-memory oracle answering from a fixed script.

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;

use super::{StructuralDiff, StructuralOracle};
use crate::core::errors::{FixmineError, Result};

#[derive(Debug, Clone)]
enum Scripted {
    Answer(StructuralDiff),
    Fail(String),
}

/// Oracle that replays canned answers keyed by the exact fragment pair.
///
/// Pairs without a scripted answer get the fallback answer when one is set,
/// and an oracle error otherwise.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: AHashMap<(String, String), Scripted>,
    fallback: Option<StructuralDiff>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    /// Create an oracle with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `diff` when asked about exactly this pair.
    pub fn respond<S: AsRef<str>>(
        mut self,
        condition: &[S],
        consequent: &[S],
        diff: StructuralDiff,
    ) -> Self {
        self.responses
            .insert(key(condition, consequent), Scripted::Answer(diff));
        self
    }

    /// Fail with an oracle error when asked about exactly this pair.
    pub fn fail<S: AsRef<str>>(
        mut self,
        condition: &[S],
        consequent: &[S],
        message: impl Into<String>,
    ) -> Self {
        self.responses
            .insert(key(condition, consequent), Scripted::Fail(message.into()));
        self
    }

    /// Answer `diff` for every pair without a scripted answer.
    pub fn with_fallback(mut self, diff: StructuralDiff) -> Self {
        self.fallback = Some(diff);
        self
    }

    /// Number of `diff` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

fn key<S: AsRef<str>>(condition: &[S], consequent: &[S]) -> (String, String) {
    let join = |lines: &[S]| {
        lines
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<_>>()
            .join("\n")
    };
    (join(condition), join(consequent))
}

impl StructuralOracle for ScriptedOracle {
    fn diff(
        &self,
        _language: &str,
        condition: &[String],
        consequent: &[String],
    ) -> Result<StructuralDiff> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.responses.get(&key(condition, consequent)) {
            Some(Scripted::Answer(diff)) => Ok(diff.clone()),
            Some(Scripted::Fail(message)) => Err(FixmineError::oracle(message.clone())),
            None => self.fallback.clone().ok_or_else(|| {
                FixmineError::oracle(format!(
                    "no scripted answer for {:?} -> {:?}",
                    condition, consequent
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn replays_scripted_answers_and_failures() {
        let answer = StructuralDiff::from_json(
            r#"{"matches":[{"src":"identifier: a [0,1]","dest":"identifier: a [0,1]"}]}"#,
        )
        .unwrap();
        let oracle = ScriptedOracle::new()
            .respond(&["a = 1"], &["a = 2"], answer.clone())
            .fail(&["x"], &["y"], "container crashed");

        assert_eq!(
            oracle.diff("py", &owned(&["a = 1"]), &owned(&["a = 2"])).unwrap(),
            answer
        );
        assert!(oracle.diff("py", &owned(&["x"]), &owned(&["y"])).is_err());
        assert!(oracle.diff("py", &owned(&["q"]), &owned(&["r"])).is_err());
        assert_eq!(oracle.calls(), 3);
    }

    #[test]
    fn fallback_covers_unscripted_pairs() {
        let oracle = ScriptedOracle::new().with_fallback(StructuralDiff::default());
        let diff = oracle.diff("py", &owned(&["q"]), &owned(&["r"])).unwrap();
        assert!(diff.matches.is_empty());
    }
}
