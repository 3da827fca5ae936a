//! Dev command - long-running dev servers with graceful shutdown

use super::{current_dir, exit_code, load_filtered, script_command, spinner};
use crate::cli::args::DevArgs;
use crate::error::{WsuError, WsuResult};
use crate::supervisor::{ProcessSupervisor, RunOptions, StopSignal};
use crate::ui::{output, Symbols};
use crate::workspace::partition_by_script;
use console::style;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::warn;

const DEV_SCRIPT: &str = "dev";

/// How long children get to exit after SIGTERM before being killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Execute the dev command
pub async fn execute(args: DevArgs, ascii: bool) -> WsuResult<ExitCode> {
    let symbols = Symbols::detect(ascii);
    let started = Instant::now();

    let pb = spinner("Loading workspace...");
    let loaded = load_filtered(&current_dir()?, args.filter.as_deref()).await;
    pb.finish_and_clear();
    let (ws, selected) = loaded?;

    let (valid, invalid) = partition_by_script(&selected, DEV_SCRIPT);
    let missing: Vec<String> = invalid.into_iter().map(|p| p.name).collect();
    output::warn_missing_script(&symbols, DEV_SCRIPT, &missing);

    if valid.is_empty() {
        return Err(WsuError::NoTarget(format!(
            "no package declares a '{}' script",
            DEV_SCRIPT
        )));
    }

    let supervisor = ProcessSupervisor::new(symbols);
    install_signal_handlers(&supervisor);

    println!(
        "Starting {} dev server(s), {} to stop",
        valid.len(),
        style("Ctrl-C").bold()
    );

    let specs = valid
        .iter()
        .map(|pkg| script_command(&ws, pkg, DEV_SCRIPT))
        .collect();
    let options = RunOptions {
        concurrency: args.concurrency,
        timestamps: false,
    };
    let results = supervisor.run_parallel(specs, options).await;

    output::summary(&symbols, &results, 0, started.elapsed());
    Ok(exit_code(&results))
}

/// Wire SIGINT and SIGTERM to a graceful terminate-all followed by a
/// clean exit.
#[cfg(unix)]
fn install_signal_handlers(supervisor: &ProcessSupervisor) {
    use tokio::signal::unix::{signal, SignalKind};

    for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
        match signal(kind) {
            Ok(mut stream) => {
                let supervisor = supervisor.clone();
                tokio::spawn(async move {
                    stream.recv().await;
                    // Step past the echoed ^C before shutdown messages
                    println!();
                    supervisor
                        .terminate_all(StopSignal::Terminate, SHUTDOWN_GRACE)
                        .await;
                    std::process::exit(0);
                });
            }
            Err(e) => warn!("Failed to install signal handler: {}", e),
        }
    }
}

#[cfg(not(unix))]
fn install_signal_handlers(supervisor: &ProcessSupervisor) {
    let supervisor = supervisor.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            supervisor
                .terminate_all(StopSignal::Terminate, SHUTDOWN_GRACE)
                .await;
            std::process::exit(0);
        }
    });
}
