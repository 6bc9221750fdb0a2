//! End-to-end and property tests for the mining pipeline.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use fixmine::core::config::{FixmineConfig, ShardBy};
use fixmine::core::model::is_subsequence;
use fixmine::filter::{
    brackets_balanced, merge_patterns, prune_redundant, ConfidenceEvaluator, HeldOutHunk,
    ShardResults,
};
use fixmine::mining::PrefixSpan;
use fixmine::oracle::{StructuralDiff, StructuralOracle};
use fixmine::sequencing::{compute_token_diff, merge_consecutive_tokens};
use fixmine::{
    DiffRecord, GumTreeOracle, MiningPipeline, Pattern, Polarity, ScriptedOracle, Token,
    TokenSequence,
};

fn record(year: i32, condition: &str, consequent: &str) -> DiffRecord {
    DiffRecord {
        file_name: Some("service/handlers.py".to_string()),
        merged_at: Some(Utc.with_ymd_and_hms(year, 3, 1, 12, 0, 0).unwrap()),
        condition: vec![condition.to_string()],
        consequent: vec![consequent.to_string()],
    }
}

fn tokens(raw: &[&str]) -> Vec<Token> {
    raw.iter().map(|t| t.parse().unwrap()).collect()
}

fn pipeline_with(oracle: ScriptedOracle, shard_by: ShardBy) -> MiningPipeline {
    let mut config = FixmineConfig::default();
    config.performance.shard_by = shard_by;
    config.performance.max_threads = Some(2);
    MiningPipeline::new(config, Arc::new(oracle)).unwrap()
}

fn quiet_oracle() -> ScriptedOracle {
    ScriptedOracle::new().with_fallback(StructuralDiff::default())
}

#[test]
fn dict_lookup_fix_is_mined_and_scored() {
    let pipeline = pipeline_with(quiet_oracle(), ShardBy::None);
    let training = vec![
        record(2018, "v = cache[key]", "v = cache.get(key)"),
        record(2019, "v = cache[key]", "v = cache.get(key)"),
        record(2020, "v = cache[key]", "v = cache.get(key)"),
    ];
    let held_out = vec![
        record(2021, "v = cache[key]", "v = cache.get(key)"),
        record(2021, "v = cache[key]", "v = cache[key] + 1"),
    ];

    let run = pipeline.run(training, &held_out).unwrap();

    assert_eq!(run.shards.len(), 1);
    assert_eq!(
        run.shards[0].sequences,
        vec![tokens(&["=v=cache", "-[", "+.get(", "=key", "-]", "+)"]); 3]
    );
    assert!(run.merged.iter().all(|p| p.support == 3));

    assert_eq!(run.artifact.len(), 1);
    let fix = &run.artifact[0];
    assert_eq!(fix.tokens, tokens(&["=v=cache", "-[", "+.get(", "=key", "-]", "+)"]));
    assert_eq!(fix.support, 3);
    assert!((fix.confidence - 0.5).abs() < 1e-12);
}

#[test]
fn year_shards_merge_by_summing_support() {
    let pipeline = pipeline_with(quiet_oracle(), ShardBy::Year);
    let training = vec![
        record(2019, "v = cache[key]", "v = cache.get(key)"),
        record(2019, "v = cache[key]", "v = cache.get(key)"),
        record(2020, "v = cache[key]", "v = cache.get(key)"),
        record(2020, "v = cache[key]", "v = cache.get(key)"),
    ];

    let outcomes = pipeline.mine(training).unwrap();
    let ids: Vec<_> = outcomes.iter().map(|o| o.shard.as_str()).collect();
    assert_eq!(ids, vec!["2019", "2020"]);

    let mut store = ShardResults::new();
    for outcome in &outcomes {
        store.insert(outcome.shard.clone(), outcome.patterns.clone());
    }
    // Storing a shard twice must not double its contribution.
    store.insert("2019", outcomes[0].patterns.clone());

    let full = tokens(&["=v=cache", "-[", "+.get(", "=key", "-]", "+)"]);
    let merged = store.merged();
    let support = merged
        .iter()
        .find(|p| p.tokens == full)
        .map(|p| p.support);
    assert_eq!(support, Some(4));
}

#[test]
fn oracle_failures_skip_only_their_hunk() {
    let oracle = quiet_oracle().fail(&["v = cache[key]"], &["v = cache.get(key)"], "container crashed");
    let pipeline = pipeline_with(oracle, ShardBy::None);
    let training = vec![
        record(2019, "v = cache[key]", "v = cache.get(key)"),
        record(2019, "n = int(s)", "n = int(s, 10)"),
        record(2019, "n = int(s)", "n = int(s, 10)"),
    ];

    let outcomes = pipeline.mine(training).unwrap();
    let shard = &outcomes[0];
    assert_eq!(shard.stats.skipped_hunks, 1);
    assert!(shard.failure.is_none());
    assert_eq!(shard.sequences.len(), 2);
    assert!(!shard.patterns.is_empty());
}

/// Records whose source fragment mentions `cache` make the oracle print bytes
/// that are not UTF-8; every other hunk gets an empty structural diff.
#[cfg(unix)]
#[test]
fn garbled_oracle_output_skips_only_that_hunk() {
    let mut config = FixmineConfig::default();
    config.performance.shard_by = ShardBy::None;
    config.oracle.command = "sh".to_string();
    config.oracle.args = vec![
        "-c".to_string(),
        r#"if grep -q cache "$1"; then printf '\377\376'; else printf '{"matches":[],"actions":[]}'; fi"#
            .to_string(),
        "oracle".to_string(),
    ];
    let oracle = GumTreeOracle::new(config.oracle.clone()).unwrap();
    let pipeline = MiningPipeline::new(config, Arc::new(oracle)).unwrap();

    let outcomes = pipeline
        .mine(vec![
            record(2019, "v = cache[key]", "v = cache.get(key)"),
            record(2019, "n = int(s)", "n = int(s, 10)"),
            record(2019, "n = int(s)", "n = int(s, 10)"),
        ])
        .unwrap();

    let shard = &outcomes[0];
    assert!(shard.failure.is_none(), "{:?}", shard.failure);
    assert_eq!(shard.stats.skipped_hunks, 1);
    assert_eq!(shard.sequences.len(), 2);
    assert!(!shard.patterns.is_empty());
}

#[test]
fn unreachable_scratch_dir_skips_hunks_instead_of_stopping() {
    let parent = tempfile::tempdir().unwrap();
    let mut config = FixmineConfig::default();
    config.performance.shard_by = ShardBy::None;
    config.oracle.scratch_dir = Some(parent.path().join("absent").join("nested"));
    let oracle = GumTreeOracle::new(config.oracle.clone()).unwrap();
    let pipeline = MiningPipeline::new(config, Arc::new(oracle)).unwrap();

    let outcomes = pipeline
        .mine(vec![
            record(2019, "v = cache[key]", "v = cache.get(key)"),
            record(2019, "n = int(s)", "n = int(s, 10)"),
        ])
        .unwrap();

    assert!(outcomes[0].failure.is_none());
    assert_eq!(outcomes[0].stats.skipped_hunks, 2);
}

#[test]
fn mining_a_corpus_keeps_oversized_sequences() {
    let mut config = FixmineConfig::default();
    config.sequencing.max_sequence_tokens = 4;
    let pipeline = MiningPipeline::new(config, Arc::new(quiet_oracle())).unwrap();
    let short = tokens(&["-[", "+.get(", "-]", "+)"]);
    let long = tokens(&["=v=cache", "-[", "+.get(", "=key", "-]", "+)"]);

    let outcome = pipeline
        .mine_corpus("all", vec![short.clone(), short.clone(), long.clone()])
        .unwrap();

    assert_eq!(outcome.oversized, vec![long]);
    assert_eq!(outcome.stats.oversized_sequences, 1);
    assert_eq!(outcome.sequences.len(), 3);
    let full = outcome.patterns.iter().find(|p| p.tokens == short);
    assert_eq!(full.map(|p| p.support), Some(2));
}

#[test]
fn unsupported_and_empty_records_are_dropped() {
    let pipeline = pipeline_with(quiet_oracle(), ShardBy::None);
    let mut unsupported = record(2019, "a", "b");
    unsupported.file_name = Some("notes.txt".to_string());
    let mut empty = record(2019, "a", "b");
    empty.consequent.clear();

    let outcomes = pipeline.mine(vec![unsupported, empty]).unwrap();
    assert_eq!(outcomes[0].stats.unsupported, 1);
    assert_eq!(outcomes[0].stats.empty_sides, 1);
    assert!(outcomes[0].sequences.is_empty());
}

#[test]
fn records_without_file_name_use_default_language() {
    let pipeline = pipeline_with(quiet_oracle(), ShardBy::None);
    let mut anonymous = record(2019, "v = cache[key]", "v = cache.get(key)");
    anonymous.file_name = None;
    assert_eq!(pipeline.language_for(&anonymous), Some("py"));
}

#[test]
fn oversized_hunks_never_reach_the_oracle() {
    let oracle = Arc::new(quiet_oracle());
    let pipeline =
        MiningPipeline::new(FixmineConfig::default(), oracle.clone() as Arc<dyn StructuralOracle>)
            .unwrap();
    let lines: Vec<String> = (0..6).map(|i| format!("x{i} = {i}")).collect();
    let big = DiffRecord {
        file_name: Some("a.py".to_string()),
        merged_at: None,
        condition: lines.clone(),
        consequent: lines,
    };

    let outcomes = pipeline.mine(vec![big]).unwrap();
    assert_eq!(outcomes[0].stats.sequencing.oversized_hunks, 1);
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn held_out_hunks_are_compacted() {
    let pipeline = pipeline_with(quiet_oracle(), ShardBy::None);
    let held_out = pipeline.prepare_held_out(&[record(2021, "v = cache[key]", "v = cache.get( key )")]);
    assert_eq!(
        held_out,
        vec![HeldOutHunk::new("v=cache[key]", "v=cache.get(key)")]
    );
}

#[test]
fn invalid_min_support_is_rejected_before_mining() {
    assert!(PrefixSpan::new(0, 15).is_err());
    let mut config = FixmineConfig::default();
    config.mining.min_support = 0;
    assert!(MiningPipeline::new(config, Arc::new(quiet_oracle())).is_err());
}

#[test]
fn scenario_bracket_checks() {
    let balanced = Pattern::new(tokens(&["-(", "=x", "+)"]), 1);
    let open = Pattern::new(tokens(&["-(", "=x"]), 1);
    assert!(brackets_balanced(&balanced));
    assert!(!brackets_balanced(&open));
}

fn token_strategy() -> impl Strategy<Value = Token> {
    (
        prop_oneof![
            Just(Polarity::Added),
            Just(Polarity::Removed),
            Just(Polarity::Kept)
        ],
        prop_oneof![Just("a"), Just("b"), Just("c")],
    )
        .prop_map(|(polarity, text)| Token::new(polarity, text))
}

fn corpus_strategy() -> impl Strategy<Value = Vec<TokenSequence>> {
    prop::collection::vec(prop::collection::vec(token_strategy(), 1..6), 1..5)
}

fn pattern_strategy() -> impl Strategy<Value = Pattern> {
    (prop::collection::vec(token_strategy(), 1..5), 1usize..5)
        .prop_map(|(tokens, support)| Pattern::new(tokens, support))
}

/// Every distinct sub-sequence of `sequence`, by brute force.
fn all_subsequences(sequence: &[Token]) -> Vec<Vec<Token>> {
    let mut found: Vec<Vec<Token>> = Vec::new();
    for mask in 1u32..(1 << sequence.len()) {
        let sub: Vec<Token> = sequence
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, t)| t.clone())
            .collect();
        if !found.contains(&sub) {
            found.push(sub);
        }
    }
    found
}

proptest! {
    #[test]
    fn mined_support_matches_brute_force(corpus in corpus_strategy(), min_support in 1usize..3) {
        let outcome = PrefixSpan::new(min_support, 15).unwrap().mine(&corpus);

        let mut expected: Vec<(Vec<Token>, usize)> = Vec::new();
        for sequence in &corpus {
            for sub in all_subsequences(sequence) {
                if expected.iter().any(|(known, _)| *known == sub) {
                    continue;
                }
                let support = corpus.iter().filter(|s| is_subsequence(&sub, s)).count();
                if support >= min_support {
                    expected.push((sub, support));
                }
            }
        }

        prop_assert_eq!(outcome.patterns.len(), expected.len());
        for pattern in &outcome.patterns {
            let wanted = expected.iter().find(|(tokens, _)| *tokens == pattern.tokens);
            prop_assert_eq!(wanted.map(|(_, s)| *s), Some(pattern.support));
        }
    }

    #[test]
    fn raising_min_support_only_removes_patterns(
        corpus in corpus_strategy(),
        low in 1usize..3,
        raise in 0usize..3,
    ) {
        let loose = PrefixSpan::new(low, 15).unwrap().mine(&corpus).patterns;
        let strict = PrefixSpan::new(low + raise, 15).unwrap().mine(&corpus).patterns;
        for pattern in &strict {
            prop_assert!(loose.contains(pattern));
        }
    }

    #[test]
    fn merge_is_order_independent(
        left in prop::collection::vec(pattern_strategy(), 0..8),
        right in prop::collection::vec(pattern_strategy(), 0..8),
    ) {
        let forward = merge_patterns(left.iter().cloned().chain(right.iter().cloned()));
        let backward = merge_patterns(right.iter().cloned().chain(left.iter().cloned()));
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn pruned_patterns_never_contain_each_other(
        patterns in prop::collection::vec(pattern_strategy(), 0..12),
    ) {
        let kept = prune_redundant(patterns);
        for (i, p) in kept.iter().enumerate() {
            for (j, q) in kept.iter().enumerate() {
                if i != j {
                    prop_assert!(!p.is_subsequence_of(q));
                }
            }
        }
    }

    #[test]
    fn confidence_stays_in_unit_range(
        pattern in pattern_strategy(),
        hunks in prop::collection::vec(("[abc]{0,6}", "[abc]{0,6}"), 0..8),
    ) {
        let evaluator = ConfidenceEvaluator::new(
            hunks.into_iter().map(|(c, q)| HeldOutHunk::new(c, q)).collect(),
        );
        let confidence = evaluator.evaluate(&pattern).unwrap();
        prop_assert!(confidence.changed <= confidence.triggerable);
        let value = confidence.value();
        prop_assert!((0.0..=1.0).contains(&value));
        if confidence.triggerable == 0 {
            prop_assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn identical_fragments_diff_to_kept_tokens(words in prop::collection::vec("[a-z(\\[\\]).=]{1,3}", 0..8)) {
        let merged = merge_consecutive_tokens(compute_token_diff(&words, &words));
        prop_assert!(merged.len() <= 1);
        prop_assert!(merged.iter().all(|t| t.polarity == Polarity::Kept));
    }
}
