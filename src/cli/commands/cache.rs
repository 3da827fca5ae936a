//! Cache command - report or clear build cache state

use super::current_dir;
use crate::cache::BuildCache;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::error::WsuResult;
use crate::ui::{output, Symbols};
use crate::workspace::{load_workspace, WorkspaceInfo};
use console::style;
use std::process::ExitCode;
use std::time::Duration;

/// Execute the cache command
pub async fn execute(args: CacheArgs, ascii: bool) -> WsuResult<ExitCode> {
    let symbols = Symbols::detect(ascii);
    let ws = load_workspace(&current_dir()?).await?;
    let mut cache = BuildCache::open(&ws.root).await?;

    match args.action.unwrap_or(CacheAction::Status) {
        CacheAction::Status => status(&ws, &cache, &symbols),
        CacheAction::Clear => {
            let cleared = cache.clear().await?;
            println!(
                "{} Cleared {} cache entr{}",
                style(symbols.check).green(),
                cleared,
                if cleared == 1 { "y" } else { "ies" }
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn status(ws: &WorkspaceInfo, cache: &BuildCache, symbols: &Symbols) {
    let cached = cache.cached_packages().len();
    println!(
        "Build cache: {} of {} package(s) cached ({})",
        style(cached).bold(),
        ws.packages.len(),
        ws.root.join(crate::cache::CACHE_DIR_NAME).display()
    );
    println!();

    for pkg in &ws.packages {
        match cache.entry(&pkg.name) {
            Some(entry) => {
                let short_hash = entry.input_hash.chars().take(12).collect::<String>();
                println!(
                    "  {} {}  {}  built {} in {}",
                    style(symbols.check).green(),
                    pkg.name,
                    style(short_hash).dim(),
                    entry.last_build.format("%Y-%m-%d %H:%M:%S UTC"),
                    output::human_duration(Duration::from_millis(entry.build_duration))
                );
            }
            None => {
                println!(
                    "  {} {}  {}",
                    style(symbols.bullet).dim(),
                    pkg.name,
                    style("not cached").dim()
                );
            }
        }
    }
}
