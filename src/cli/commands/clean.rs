//! Clean command - remove node_modules from workspace members
//!
//! Driven purely by the workspace model. The build cache under `.wsu/` is
//! left alone; `wsu cache clear` is the way to drop cache state.

use super::{current_dir, load_filtered, spinner};
use crate::error::WsuResult;
use crate::ui::Symbols;
use console::style;
use std::process::ExitCode;
use tracing::warn;

/// Execute the clean command
pub async fn execute(
    args: crate::cli::args::CleanArgs,
    ascii: bool,
) -> WsuResult<ExitCode> {
    let symbols = Symbols::detect(ascii);

    let pb = spinner("Loading workspace...");
    let loaded = load_filtered(&current_dir()?, args.filter.as_deref()).await;
    pb.finish_and_clear();
    let (_ws, selected) = loaded?;

    let mut removed = 0usize;
    for pkg in &selected {
        let target = pkg.path.join("node_modules");
        if !target.is_dir() {
            continue;
        }
        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => {
                println!(
                    "{} {} {}",
                    style(symbols.check).green(),
                    pkg.name,
                    style(target.display()).dim()
                );
                removed += 1;
            }
            Err(e) => warn!("Failed to remove {}: {}", target.display(), e),
        }
    }

    if removed == 0 {
        println!("Nothing to clean");
    } else {
        println!(
            "{} Removed node_modules from {} package(s)",
            style(symbols.check).green(),
            removed
        );
    }
    Ok(ExitCode::SUCCESS)
}
