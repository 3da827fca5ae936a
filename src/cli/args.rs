//! CLI argument definitions using clap derive

use crate::supervisor::DEFAULT_CONCURRENCY;
use clap::{ArgAction, Parser, Subcommand};

/// wsu - Workspace Script Utility
///
/// Discovers the packages of a JavaScript monorepo and runs their
/// lifecycle scripts in parallel, in sequence, or in dependency order,
/// with a content-addressed build cache.
#[derive(Parser, Debug)]
#[command(name = "wsu")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Force plain-text symbols in output
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a named script across workspace packages
    Run(RunArgs),

    /// Build packages in dependency order, skipping unchanged ones
    Build(BuildArgs),

    /// Start dev scripts and stream their output until interrupted
    Dev(DevArgs),

    /// Remove node_modules directories from workspace packages
    Clean(CleanArgs),

    /// Inspect or clear the build cache
    Cache(CacheArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Script name to run
    pub script: String,

    /// Only packages whose name matches this glob (*, ?, [...])
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Maximum number of packages running at once
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Run one package at a time, stopping at the first failure
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Only packages whose name matches this glob (plus their dependencies)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Maximum number of packages building at once within a batch
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Rebuild every package even when its cache entry is still valid
    #[arg(long)]
    pub no_skip_unchanged: bool,
}

/// Arguments for the dev command
#[derive(Parser, Debug)]
pub struct DevArgs {
    /// Only packages whose name matches this glob
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Maximum number of dev servers running at once
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Only packages whose name matches this glob
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache (defaults to status)
    #[command(subcommand)]
    pub action: Option<CacheAction>,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show which packages are cached and when they were built
    Status,

    /// Remove every cache entry
    Clear,
}
