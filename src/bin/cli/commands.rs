//! Command execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use console::style;
use tracing::info;

use fixmine::core::config::FixmineConfig;
use fixmine::core::pipeline::{MiningPipeline, ShardOutcome, SINGLE_SHARD};
use fixmine::filter::ShardResults;
use fixmine::io::{
    read_patterns, read_records, read_sequences, write_patterns, write_scored_patterns,
    write_sequences,
};
use fixmine::lang::registered_languages;
use fixmine::{GumTreeOracle, Projection};

use crate::cli::args::{
    ExplainArgs, FilterArgs, FilterOverrides, InitConfigArgs, MergeArgs, MineArgs,
    MiningOverrides, RunArgs, ValidateConfigArgs,
};
use crate::cli::output::{print_filter_report, print_shard_table, shard_progress};

/// Load configuration from file (or defaults) and apply CLI overrides.
pub fn load_configuration(
    overrides: &MiningOverrides,
    filter: Option<&FilterOverrides>,
) -> anyhow::Result<FixmineConfig> {
    let mut config = match &overrides.config {
        Some(path) => FixmineConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => FixmineConfig::default(),
    };

    if let Some(min_support) = overrides.min_support {
        config.mining.min_support = min_support;
    }
    if let Some(shard_by) = overrides.shard_by {
        config.performance.shard_by = shard_by.into();
    }
    if let Some(threads) = overrides.threads {
        config.performance.max_threads = Some(threads);
    }
    if let Some(image) = &overrides.docker_image {
        config.oracle.docker_image = Some(image.clone());
    }
    if let Some(filter) = filter {
        if let Some(threshold) = filter.threshold {
            config.filter.confidence_threshold = threshold;
        }
        if let Some(support) = filter.min_pruning_support {
            config.filter.min_pruning_support = support;
        }
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(config: FixmineConfig, progress: bool) -> anyhow::Result<MiningPipeline> {
    let oracle = Arc::new(GumTreeOracle::new(config.oracle.clone())?);
    let pipeline = MiningPipeline::new(config, oracle)?;
    Ok(if progress {
        pipeline.with_progress(shard_progress())
    } else {
        pipeline
    })
}

/// Write per-shard patterns (and optionally sequences) under `out`, then the
/// merged pattern file. Returns the merged patterns.
fn persist_shards(
    out: &Path,
    outcomes: &[ShardOutcome],
    dump_sequences: bool,
) -> anyhow::Result<Vec<fixmine::Pattern>> {
    let mut store = ShardResults::new();
    for outcome in outcomes {
        write_patterns(&shard_file(out, "shards", &outcome.shard), &outcome.patterns)?;
        if dump_sequences {
            write_sequences(&shard_file(out, "sequences", &outcome.shard), &outcome.sequences)?;
            if !outcome.oversized.is_empty() {
                write_sequences(&shard_file(out, "oversized", &outcome.shard), &outcome.oversized)?;
            }
        }
        store.insert(outcome.shard.clone(), outcome.patterns.clone());
    }

    let merged = store.merged();
    let merged_path = out.join("patterns.json");
    write_patterns(&merged_path, &merged)?;
    println!(
        "{} {} merged patterns -> {}",
        style("✓").green().bold(),
        merged.len(),
        style(merged_path.display()).cyan()
    );
    Ok(merged)
}

fn shard_file(out: &Path, kind: &str, shard: &str) -> PathBuf {
    out.join(kind).join(format!("{shard}.json"))
}

/// Mine shards and write their patterns.
pub fn mine_command(args: MineArgs, verbose: bool) -> anyhow::Result<()> {
    let config = load_configuration(&args.overrides, None)?;
    let pipeline = build_pipeline(config, !verbose)?;

    let outcomes = match (&args.sequences, &args.records) {
        (Some(path), _) => {
            let corpus = read_sequences(path)
                .with_context(|| format!("Invalid sequence corpus {}", path.display()))?;
            info!("Loaded {} sequences from {}", corpus.len(), path.display());
            vec![pipeline.mine_corpus(SINGLE_SHARD, corpus)?]
        }
        (None, Some(path)) => {
            let records = read_records(path)?;
            info!("Loaded {} records from {}", records.len(), path.display());
            pipeline.mine(records)?
        }
        (None, None) => bail!("Either a record file or --sequences is required"),
    };
    print_shard_table(&outcomes);
    persist_shards(&args.out, &outcomes, args.dump_sequences)?;
    report_failures(&outcomes);
    Ok(())
}

/// Merge pattern files.
pub fn merge_command(args: MergeArgs) -> anyhow::Result<()> {
    let mut store = ShardResults::new();
    for input in &args.inputs {
        let patterns = read_patterns(input)
            .with_context(|| format!("Failed to read patterns from {}", input.display()))?;
        store.insert(input.display().to_string(), patterns);
    }
    let merged = store.merged();
    write_patterns(&args.out, &merged)?;
    println!(
        "{} Merged {} files into {} patterns -> {}",
        style("✓").green().bold(),
        store.len(),
        merged.len(),
        style(args.out.display()).cyan()
    );
    Ok(())
}

/// Filter merged patterns against held-out records.
pub fn filter_command(args: FilterArgs, verbose: bool) -> anyhow::Result<()> {
    let config = load_configuration(&args.overrides, Some(&args.filter))?;
    let pipeline = build_pipeline(config, !verbose)?;

    let patterns = read_patterns(&args.patterns)?;
    let held_out = read_records(&args.held_out)?;
    let (artifact, report) = pipeline.filter(patterns, &held_out)?;

    write_scored_patterns(&args.out, &artifact)?;
    print_filter_report(&report);
    println!(
        "{} {} patterns -> {}",
        style("✓").green().bold(),
        artifact.len(),
        style(args.out.display()).cyan()
    );
    Ok(())
}

/// Mine, merge and filter.
pub fn run_command(args: RunArgs, verbose: bool) -> anyhow::Result<()> {
    let config = load_configuration(&args.overrides, Some(&args.filter))?;
    let pipeline = build_pipeline(config, !verbose)?;

    let training = read_records(&args.training)?;
    let held_out = read_records(&args.held_out)?;

    let outcomes = pipeline.mine(training)?;
    print_shard_table(&outcomes);
    let merged = persist_shards(&args.out, &outcomes, args.dump_sequences)?;

    let (artifact, report) = pipeline.filter(merged, &held_out)?;
    let artifact_path = args.out.join("fixes.json");
    write_scored_patterns(&artifact_path, &artifact)?;
    print_filter_report(&report);
    println!(
        "{} {} patterns -> {}",
        style("✓").green().bold(),
        artifact.len(),
        style(artifact_path.display()).cyan()
    );
    report_failures(&outcomes);
    Ok(())
}

fn report_failures(outcomes: &[ShardOutcome]) {
    for outcome in outcomes {
        if let Some(failure) = &outcome.failure {
            eprintln!(
                "{} shard {} stopped early and is partial: {}",
                style("!").yellow().bold(),
                outcome.shard,
                failure
            );
        }
    }
}

/// Show projections of the top patterns in a file.
pub fn explain_command(args: ExplainArgs) -> anyhow::Result<()> {
    let patterns = read_patterns(&args.patterns)?;
    println!(
        "{} {} patterns in {}",
        style("Patterns").bold(),
        patterns.len(),
        style(args.patterns.display()).cyan()
    );

    for (rank, pattern) in patterns.iter().take(args.top).enumerate() {
        println!();
        println!(
            "{} {}  {}",
            style(format!("#{}", rank + 1)).bold(),
            pattern.rendered().join(" "),
            style(format!("support {}", pattern.support)).dim()
        );
        for (label, projection) in [("trigger", Projection::Trigger), ("change ", Projection::Change)] {
            println!(
                "   {} {:?}",
                style(label).blue(),
                pattern.projection(projection)
            );
            println!(
                "   {} {}",
                style("  regex").dim(),
                pattern.to_regex_source(projection)
            );
        }
    }
    Ok(())
}

/// List supported languages.
pub fn list_languages() -> anyhow::Result<()> {
    let languages = registered_languages();
    println!("{}", style("Supported Programming Languages").blue().bold());
    println!("   Found {} supported languages", languages.len());
    println!();
    for info in languages {
        let extensions: Vec<String> = info.extensions.iter().map(|ext| format!(".{ext}")).collect();
        println!(
            "   {:<12} {:<6} {}",
            style(info.name).bold(),
            info.key,
            extensions.join(", ")
        );
    }
    Ok(())
}

/// Print default configuration.
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", style("# Default fixmine configuration").dim());
    println!("{}", style("# Save this to a file and customize as needed").dim());
    println!();
    print!("{}", serde_yaml::to_string(&FixmineConfig::default())?);
    Ok(())
}

/// Write a default configuration file.
pub fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            args.output.display()
        );
    }

    FixmineConfig::default().to_yaml_file(&args.output)?;
    println!(
        "{} {}",
        style("✅ Configuration saved to:").green().bold(),
        style(args.output.display()).cyan()
    );
    println!();
    println!("{}", style("Key settings you can customize:").blue().bold());
    for (setting, description) in [
        ("mining.min_support", "Occurrences a pattern needs within one shard"),
        ("filter.confidence_threshold", "Minimum held-out confidence to keep a pattern"),
        ("oracle.docker_image", "Run the structural diff tool through docker"),
        ("performance.shard_by", "Shard records by `year` or not at all (`none`)"),
    ] {
        println!("   {:<30} {}", style(setting).cyan(), description);
    }
    Ok(())
}

/// Validate a configuration file.
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        style("Validating configuration:").blue().bold(),
        style(args.config.display()).cyan()
    );

    let config = FixmineConfig::from_yaml_file(&args.config)
        .and_then(|config| config.validate().map(|()| config))
        .with_context(|| format!("Configuration validation failed: {}", args.config.display()))?;

    println!("{}", style("✅ Configuration file is valid!").green().bold());
    println!(
        "   min_support={}  confidence_threshold={}  max_sequence_tokens={}  shard_by={:?}",
        config.mining.min_support,
        config.filter.confidence_threshold,
        config.sequencing.max_sequence_tokens,
        config.performance.shard_by
    );
    if args.detailed {
        println!();
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}
