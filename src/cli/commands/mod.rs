//! CLI command implementations

pub mod build;
pub mod cache;
pub mod clean;
pub mod dev;
pub mod run;

pub use build::execute as build;
pub use cache::execute as cache;
pub use clean::execute as clean;
pub use dev::execute as dev;
pub use run::execute as run;

use crate::error::{WsuError, WsuResult};
use crate::supervisor::{CommandResult, CommandSpec};
use crate::workspace::{self, filter_by_name, PackageInfo, WorkspaceInfo};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

/// Spinner shown during workspace loading and cache checks; cleared
/// before any child output is emitted
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(progress_style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(progress_style);
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(message.to_string());
    pb
}

/// Load the workspace containing `start` and apply the name filter.
/// An empty selection is a `NoTarget` error.
pub(crate) async fn load_filtered(
    start: &Path,
    filter: Option<&str>,
) -> WsuResult<(WorkspaceInfo, Vec<PackageInfo>)> {
    let ws = workspace::load_workspace(start).await?;

    let selected = match filter {
        Some(pattern) => {
            let matched = filter_by_name(&ws.packages, pattern)?;
            if matched.is_empty() {
                return Err(WsuError::NoTarget(format!(
                    "no package name matches '{}'",
                    pattern
                )));
            }
            matched
        }
        None => ws.packages.clone(),
    };

    Ok((ws, selected))
}

/// Build the supervisor command for running `script` in one package
pub(crate) fn script_command(ws: &WorkspaceInfo, pkg: &PackageInfo, script: &str) -> CommandSpec {
    let (program, args) = ws.manager.run_script_command(script);
    CommandSpec::new(pkg.name.clone(), program, args, pkg.path.clone())
}

/// The invocation directory
pub(crate) fn current_dir() -> WsuResult<std::path::PathBuf> {
    std::env::current_dir().map_err(|e| WsuError::io("resolving current directory", e))
}

/// Fold task results into the process exit code: 0 only on full success
pub(crate) fn exit_code(results: &[CommandResult]) -> ExitCode {
    if results.iter().all(|r| r.success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
