//! wsu - Workspace Script Utility
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wsu::cli::{Cli, Commands};
use wsu::error::WsuResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose > 0 {
        EnvFilter::new("wsu=debug")
    } else {
        EnvFilter::new("wsu=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> WsuResult<ExitCode> {
    let ascii = cli.ascii;
    match cli.command {
        Commands::Run(args) => wsu::cli::commands::run(args, ascii).await,
        Commands::Build(args) => wsu::cli::commands::build(args, ascii).await,
        Commands::Dev(args) => wsu::cli::commands::dev(args, ascii).await,
        Commands::Clean(args) => wsu::cli::commands::clean(args, ascii).await,
        Commands::Cache(args) => wsu::cli::commands::cache(args, ascii).await,
    }
}
