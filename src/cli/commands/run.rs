//! Run command - execute a named script across the workspace

use super::{current_dir, exit_code, load_filtered, script_command, spinner};
use crate::cli::args::RunArgs;
use crate::error::{WsuError, WsuResult};
use crate::supervisor::{ProcessSupervisor, RunOptions};
use crate::ui::{output, Symbols};
use crate::workspace::partition_by_script;
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;

/// Execute the run command
pub async fn execute(args: RunArgs, ascii: bool) -> WsuResult<ExitCode> {
    let symbols = Symbols::detect(ascii);
    let started = Instant::now();

    let pb = spinner("Loading workspace...");
    let loaded = load_filtered(&current_dir()?, args.filter.as_deref()).await;
    pb.finish_and_clear();
    let (ws, selected) = loaded?;

    let (valid, invalid) = partition_by_script(&selected, &args.script);
    let missing: Vec<String> = invalid.into_iter().map(|p| p.name).collect();
    output::warn_missing_script(&symbols, &args.script, &missing);

    if valid.is_empty() {
        return Err(WsuError::NoTarget(format!(
            "no package declares a '{}' script",
            args.script
        )));
    }

    debug!(
        "Running '{}' in {} package(s) ({})",
        args.script,
        valid.len(),
        if args.sequential { "sequential" } else { "parallel" }
    );

    let specs = valid
        .iter()
        .map(|pkg| script_command(&ws, pkg, &args.script))
        .collect();
    let options = RunOptions {
        concurrency: args.concurrency,
        timestamps: false,
    };

    let supervisor = ProcessSupervisor::new(symbols);
    let results = if args.sequential {
        supervisor.run_sequential(specs, options).await
    } else {
        supervisor.run_parallel(specs, options).await
    };

    output::summary(&symbols, &results, 0, started.elapsed());
    Ok(exit_code(&results))
}
