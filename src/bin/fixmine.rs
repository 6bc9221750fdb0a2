//! Fixmine CLI - mine recurring fix patterns from code diffs.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands, LogFormat};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    match cli.command {
        Commands::Mine(args) => cli::mine_command(args, cli.verbose)?,
        Commands::Merge(args) => cli::merge_command(args)?,
        Commands::Filter(args) => cli::filter_command(args, cli.verbose)?,
        Commands::Run(args) => cli::run_command(args, cli.verbose)?,
        Commands::Explain(args) => cli::explain_command(args)?,
        Commands::ListLanguages => cli::list_languages()?,
        Commands::PrintDefaultConfig => cli::print_default_config()?,
        Commands::InitConfig(args) => cli::init_config(args)?,
        Commands::ValidateConfig(args) => cli::validate_config(args)?,
    }

    Ok(())
}
