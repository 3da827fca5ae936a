//! Spawning a single command and multiplexing its output
//!
//! `run_command` is the primitive every driver builds on: spawn the child
//! in its own process group, stream both pipes line by line to the shared
//! sink under the package prefix, and fold the exit into a `CommandResult`.

use super::{ProcessSupervisor, RunOptions};
use crate::ui::output;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::warn;

/// One command to run on behalf of a package
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Package the command belongs to; used as the log prefix
    pub package: String,
    /// Program to invoke
    pub program: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Working directory (the package directory)
    pub cwd: PathBuf,
    /// Extra environment entries on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(
        package: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        cwd: PathBuf,
    ) -> Self {
        Self {
            package: package.into(),
            program: program.into(),
            args,
            cwd,
            env: Vec::new(),
        }
    }

    /// Display form, e.g. `npm run build`
    pub fn rendered(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub package: String,
    pub command: String,
    /// True iff the exit code was exactly 0
    pub success: bool,
    pub exit_code: i32,
    /// Wall clock from pre-spawn to post-exit
    pub duration: Duration,
}

impl CommandResult {
    pub(crate) fn failed(spec: &CommandSpec, duration: Duration) -> Self {
        Self {
            package: spec.package.clone(),
            command: spec.rendered(),
            success: false,
            exit_code: 1,
            duration,
        }
    }
}

impl ProcessSupervisor {
    /// Run one command to completion, streaming its output to the sink.
    ///
    /// Never fails: a spawn error is reported as a failed result with exit
    /// code 1 after emitting a diagnostic line.
    pub async fn run_command(&self, spec: &CommandSpec, options: &RunOptions) -> CommandResult {
        let color = self.color_for(&spec.package);
        let prefix = output::prefix(&color, &spec.package);
        let command = spec.rendered();
        let symbols = self.symbols();
        let started = Instant::now();

        output::start_line(&prefix, &command);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("FORCE_COLOR", "1");
        if let Ok(node_env) = std::env::var("NODE_ENV") {
            cmd.env("NODE_ENV", node_env);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        // Own process group so terminate_all reaches grandchildren too
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                output::spawn_error_line(&prefix, &symbols, &command, &e);
                return CommandResult::failed(spec, started.elapsed());
            }
        };

        let id = self.register(child.id().unwrap_or(0), &spec.package);

        let stdout_task = child.stdout.take().map(|pipe| {
            tokio::spawn(stream_lines(
                pipe,
                prefix.clone(),
                false,
                options.timestamps,
            ))
        });
        let stderr_task = child.stderr.take().map(|pipe| {
            tokio::spawn(stream_lines(pipe, prefix.clone(), true, options.timestamps))
        });

        let status = child.wait().await;

        // Drain both pipes before reporting completion
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }
        self.unregister(id);

        let duration = started.elapsed();
        let (success, exit_code) = match status {
            Ok(status) => (status.success(), status.code().unwrap_or(1)),
            Err(e) => {
                warn!("{}: failed to wait on child: {}", spec.package, e);
                (false, 1)
            }
        };

        let result = CommandResult {
            package: spec.package.clone(),
            command,
            success,
            exit_code,
            duration,
        };
        output::completion_line(&prefix, &symbols, &result);
        result
    }
}

/// Forward every non-empty line from one pipe to the sink
async fn stream_lines<R>(pipe: R, prefix: String, stderr: bool, timestamps: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(pipe).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.trim().is_empty() {
            output::child_line(&prefix, &line, stderr, timestamps);
        }
    }
}
