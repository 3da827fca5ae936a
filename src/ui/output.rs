//! Line-oriented output for multiplexed child logs and run summaries
//!
//! Every child log line is assembled into one complete string before the
//! single `println!`, so concurrent emitters interleave at line granularity
//! and never mid-line.

use super::theme::Symbols;
use crate::supervisor::CommandResult;
use console::{style, Style};
use std::time::Duration;

/// Render the bracketed package prefix, e.g. `[web-app]`
pub fn prefix(color: &Style, package: &str) -> String {
    format!("[{}]", color.apply_to(package))
}

/// Emit one line of child output to the shared sink
pub fn child_line(prefix: &str, line: &str, stderr: bool, timestamps: bool) {
    let stamp = if timestamps {
        format!("{} ", style(chrono::Local::now().format("%H:%M:%S")).dim())
    } else {
        String::new()
    };
    if stderr {
        println!("{}{} {}", stamp, prefix, style(line).red());
    } else {
        println!("{}{} {}", stamp, prefix, line);
    }
}

/// Emit the spawn announcement for a command
pub fn start_line(prefix: &str, command: &str) {
    println!("{} {} {}", prefix, style("Start:").bold(), command);
}

/// Emit the one-line completion message for a finished command
pub fn completion_line(prefix: &str, symbols: &Symbols, result: &CommandResult) {
    let elapsed = human_duration(result.duration);
    if result.success {
        println!(
            "{} {} Completed in {}",
            prefix,
            style(symbols.check).green(),
            style(elapsed).dim()
        );
    } else {
        println!(
            "{} {} Failed with exit code {} after {}",
            prefix,
            style(symbols.cross).red(),
            result.exit_code,
            style(elapsed).dim()
        );
    }
}

/// Emit the diagnostic line for a command that could not be spawned
pub fn spawn_error_line(prefix: &str, symbols: &Symbols, command: &str, error: &std::io::Error) {
    println!(
        "{} {} Failed to start '{}': {}",
        prefix,
        style(symbols.cross).red(),
        command,
        error
    );
}

/// Warn about packages missing the requested script and continue
pub fn warn_missing_script(symbols: &Symbols, script: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!(
        "{} Skipping {} package(s) without a '{}' script: {}",
        style(symbols.warn).yellow(),
        names.len(),
        script,
        style(names.join(", ")).dim()
    );
}

/// Print the run summary: success/failure/skip counts and total duration
pub fn summary(symbols: &Symbols, results: &[CommandResult], skipped: usize, total: Duration) {
    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;

    println!();
    let mut parts = vec![format!(
        "{} {} succeeded",
        style(symbols.check).green(),
        succeeded
    )];
    if failed > 0 {
        parts.push(format!("{} {} failed", style(symbols.cross).red(), failed));
    }
    if skipped > 0 {
        parts.push(format!(
            "{} {} skipped (cached)",
            style(symbols.bullet).cyan(),
            skipped
        ));
    }
    println!("{}  {}", parts.join("  "), style(human_duration(total)).dim());

    for result in results.iter().filter(|r| !r.success) {
        println!(
            "  {} {} ({}, exit code {})",
            style(symbols.cross).red(),
            result.package,
            result.command,
            result.exit_code
        );
    }
}

/// Format a duration the way the completion lines do: `340ms` below one
/// second, `1.2s` below one minute, `2m 5s` beyond.
pub fn human_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
