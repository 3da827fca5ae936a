//! Process supervisor
//!
//! Owns every live child process for the duration of an invocation: spawn,
//! line-multiplexed output, the concurrency-bounded drivers, and
//! coordinated shutdown. All state (live-children registry, prefix color
//! assignment) lives in the supervisor value itself and is shared by
//! cloning, never through globals.

pub mod command;
pub mod drivers;

pub use command::{CommandResult, CommandSpec};
pub use drivers::{RunOptions, DEFAULT_CONCURRENCY};

use crate::ui::theme::{prefix_style, Symbols};
use console::Style;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Signal delivered to live children by `terminate_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
    Kill,
}

#[derive(Debug)]
struct LiveChild {
    pid: u32,
    package: String,
}

#[derive(Debug, Default)]
struct SupervisorState {
    live: Mutex<HashMap<u64, LiveChild>>,
    colors: Mutex<HashMap<String, usize>>,
    next_id: AtomicU64,
    symbols: Symbols,
}

/// Shared handle to the supervisor. Clones refer to the same state.
#[derive(Clone)]
pub struct ProcessSupervisor {
    state: Arc<SupervisorState>,
}

impl ProcessSupervisor {
    pub fn new(symbols: Symbols) -> Self {
        Self {
            state: Arc::new(SupervisorState {
                symbols,
                ..Default::default()
            }),
        }
    }

    pub fn symbols(&self) -> Symbols {
        self.state.symbols
    }

    /// Prefix style for a package: assigned on first sight, cycling the
    /// palette in insertion order, stable for the supervisor's lifetime.
    pub fn color_for(&self, package: &str) -> Style {
        let mut colors = self.state.colors.lock().unwrap_or_else(|e| e.into_inner());
        let next = colors.len();
        let index = *colors.entry(package.to_string()).or_insert(next);
        prefix_style(index)
    }

    /// Number of currently live children
    pub fn live_count(&self) -> usize {
        self.state.live.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn register(&self, pid: u32, package: &str) -> u64 {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id,
                LiveChild {
                    pid,
                    package: package.to_string(),
                },
            );
        id
    }

    fn unregister(&self, id: u64) {
        self.state
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    fn live_snapshot(&self) -> Vec<(u64, u32, String)> {
        self.state
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, child)| (*id, child.pid, child.package.clone()))
            .collect()
    }

    fn any_alive(&self, ids: &[u64]) -> bool {
        let live = self.state.live.lock().unwrap_or_else(|e| e.into_inner());
        ids.iter().any(|id| live.contains_key(id))
    }

    /// Send `signal` to every live child's process group, wait up to
    /// `grace` for them to exit, then force-kill any holdout. Returns when
    /// every targeted child has exited or been force-killed.
    pub async fn terminate_all(&self, signal: StopSignal, grace: Duration) {
        let targets = self.live_snapshot();
        if targets.is_empty() {
            return;
        }

        debug!("Signalling {} live child(ren)", targets.len());
        for (_, pid, package) in &targets {
            debug!("{}: sending {:?} to pid {}", package, signal, pid);
            send_signal(*pid, signal);
        }

        let ids: Vec<u64> = targets.iter().map(|(id, _, _)| *id).collect();
        let deadline = tokio::time::Instant::now() + grace;
        while self.any_alive(&ids) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        if self.any_alive(&ids) {
            let live = self.live_snapshot();
            for (id, pid, package) in live {
                if ids.contains(&id) {
                    warn!("{} did not exit within the grace window, killing", package);
                    send_signal(pid, StopSignal::Kill);
                }
            }
            // SIGKILL cannot be ignored; give reapers a bounded window
            let kill_deadline = tokio::time::Instant::now() + Duration::from_secs(2);
            while self.any_alive(&ids) && tokio::time::Instant::now() < kill_deadline {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: StopSignal) {
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    if pid == 0 {
        return;
    }
    let sig = match signal {
        StopSignal::Interrupt => Signal::SIGINT,
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    let target = Pid::from_raw(pid as i32);
    // Children run in their own process group so the whole tree is reached;
    // fall back to the single pid if the group is already gone.
    if killpg(target, sig).is_err() {
        let _ = kill(target, sig);
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: StopSignal) {}
