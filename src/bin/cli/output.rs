//! Console output: progress and summaries.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use fixmine::core::pipeline::{ProgressCallback, ShardOutcome};
use fixmine::filter::FilterReport;

/// Progress bar driven by shard completion.
pub fn shard_progress() -> ProgressCallback {
    let pb = ProgressBar::new(100);
    if let Ok(bar_style) =
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
    {
        pb.set_style(bar_style.progress_chars("##-"));
    }
    Box::new(move |label: &str, fraction: f64| {
        pb.set_position((fraction * 100.0).round() as u64);
        pb.set_message(label.to_string());
        if fraction >= 1.0 {
            pb.finish_with_message("shards mined");
        }
    })
}

/// One line per shard.
pub fn print_shard_table(outcomes: &[ShardOutcome]) {
    println!();
    println!(
        "{}",
        style(format!(
            "{:<10} {:>8} {:>10} {:>9} {:>8} {:>9}",
            "shard", "records", "sequences", "patterns", "skipped", "oversize"
        ))
        .bold()
    );
    for outcome in outcomes {
        let stats = &outcome.stats;
        let skipped = stats.empty_sides + stats.unsupported + stats.skipped_hunks;
        let oversize = stats.sequencing.oversized_hunks
            + stats.sequencing.oversized_sequences
            + stats.oversized_sequences;
        let line = format!(
            "{:<10} {:>8} {:>10} {:>9} {:>8} {:>9}",
            outcome.shard,
            stats.records,
            outcome.sequences.len(),
            outcome.patterns.len(),
            skipped,
            oversize
        );
        if outcome.failure.is_some() {
            println!("{}", style(line).yellow());
        } else {
            println!("{line}");
        }
    }
    println!();
}

/// Stage-by-stage filter tallies.
pub fn print_filter_report(report: &FilterReport) {
    println!("{}", style("Filter summary").blue().bold());
    for (label, count) in [
        ("merged", report.merged),
        ("symbols only", report.symbols_only),
        ("no change", report.no_change),
        ("unbalanced", report.unbalanced),
        ("low support", report.low_support),
        ("redundant", report.redundant),
        ("low confidence", report.low_confidence),
        ("kept", report.kept),
    ] {
        println!("   {:<16} {}", label, count);
    }
}
