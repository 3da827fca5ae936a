//! Execution drivers: parallel, sequential, batched
//!
//! All three sit on top of `run_command`. The concurrency bound is a
//! semaphore shared by the workers of one driver call; results always come
//! back in submission order, never completion order.

use super::{CommandResult, CommandSpec, ProcessSupervisor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

/// Default number of simultaneously live children
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Per-call driver options
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Maximum simultaneously live children
    pub concurrency: usize,
    /// Prepend a clock time to every emitted line
    pub timestamps: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timestamps: false,
        }
    }
}

impl ProcessSupervisor {
    /// Run all commands with at most `concurrency` live at once. A failure
    /// does not stop the others. Results are in submission order.
    pub async fn run_parallel(
        &self,
        specs: Vec<CommandSpec>,
        options: RunOptions,
    ) -> Vec<CommandResult> {
        let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
        let mut handles = Vec::with_capacity(specs.len());

        for spec in specs {
            let semaphore = Arc::clone(&semaphore);
            let supervisor = self.clone();
            let fallback = spec.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                supervisor.run_command(&spec, &options).await
            });
            handles.push((handle, fallback));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, fallback) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("{}: worker task aborted: {}", fallback.package, e);
                    results.push(CommandResult::failed(&fallback, Duration::ZERO));
                }
            }
        }
        results
    }

    /// Run commands one at a time, stopping at the first failure. The
    /// returned list covers exactly the commands that were attempted.
    pub async fn run_sequential(
        &self,
        specs: Vec<CommandSpec>,
        options: RunOptions,
    ) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.run_command(&spec, &options).await;
            let failed = !result.success;
            results.push(result);
            if failed {
                break;
            }
        }
        results
    }

    /// Run batches in order, each batch in parallel under the bound. When
    /// any member of a batch fails, its in-flight siblings run to
    /// completion and no later batch is started.
    pub async fn run_batched(
        &self,
        batches: Vec<Vec<CommandSpec>>,
        options: RunOptions,
    ) -> Vec<CommandResult> {
        let mut results = Vec::new();
        for batch in batches {
            let batch_results = self.run_parallel(batch, options).await;
            let failed = batch_results.iter().any(|r| !r.success);
            results.extend(batch_results);
            if failed {
                break;
            }
        }
        results
    }
}
