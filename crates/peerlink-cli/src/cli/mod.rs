//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = crate::config::resolve_path(cli.config.as_deref())?;

    // Create context for commands
    let ctx = commands::Context {
        config_path,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        verbose: cli.verbose,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Check => commands::check::execute(ctx).await,
        Commands::Inspect(args) => commands::inspect::execute(ctx, args).await,
        Commands::Sign(args) => commands::sign::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args),
    }
}
