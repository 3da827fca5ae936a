//! End-to-end scenarios driven through the library
//!
//! These mirror the build orchestration against real tempdir workspaces:
//! plan derivation, cache round trips, downstream invalidation, and the
//! driver failure semantics (via `sh`, so no JS package manager is needed).

use crate::{diamond, scaffold_workspace};
use std::time::Duration;
use wsu::cache::BuildCache;
use wsu::graph::DependencyGraph;
use wsu::workspace::{load_workspace, PackageInfo, WorkspaceInfo};

async fn load(dir: &tempfile::TempDir) -> WorkspaceInfo {
    load_workspace(dir.path()).await.unwrap()
}

fn pkg<'a>(ws: &'a WorkspaceInfo, name: &str) -> &'a PackageInfo {
    ws.package(name).unwrap()
}

/// Build every package in topological order the way the build command
/// does: update on success, then erase downstream entries.
async fn build_all(ws: &WorkspaceInfo, cache: &mut BuildCache, graph: &DependencyGraph) {
    for name in graph.topological_sort().unwrap() {
        cache
            .update(pkg(ws, &name), Duration::from_millis(10))
            .await
            .unwrap();
        cache.invalidate_dependents(&name, graph).await.unwrap();
    }
}

/// The skip-unchanged split: stale packages drop their dependents'
/// entries so one invocation rebuilds the whole chain.
async fn split(ws: &WorkspaceInfo, cache: &mut BuildCache, graph: &DependencyGraph) -> (Vec<String>, Vec<String>) {
    let mut to_build = Vec::new();
    let mut skipped = Vec::new();
    for name in graph.topological_sort().unwrap() {
        if cache.is_valid(pkg(ws, &name)).await {
            skipped.push(name);
        } else {
            cache.invalidate_dependents(&name, graph).await.unwrap();
            to_build.push(name);
        }
    }
    (to_build, skipped)
}

#[tokio::test]
async fn diamond_build_plan_has_three_batches() {
    let dir = scaffold_workspace(&diamond());
    let ws = load(&dir).await;

    let graph = DependencyGraph::from_packages(&ws.packages);
    let batches = graph.batches().unwrap();

    assert_eq!(
        batches,
        vec![
            vec!["core".to_string()],
            vec!["lib1".to_string(), "lib2".to_string()],
            vec!["app".to_string()],
        ]
    );
}

#[tokio::test]
async fn second_build_is_fully_cached() {
    let dir = scaffold_workspace(&diamond());
    let ws = load(&dir).await;
    let graph = DependencyGraph::from_packages(&ws.packages);

    let mut cache = BuildCache::open(&ws.root).await.unwrap();
    build_all(&ws, &mut cache, &graph).await;
    assert_eq!(cache.cached_packages().len(), 4);

    let (to_build, skipped) = split(&ws, &mut cache, &graph).await;
    assert!(to_build.is_empty());
    assert_eq!(skipped.len(), 4);
}

#[tokio::test]
async fn source_change_rebuilds_the_downstream_chain() {
    let dir = scaffold_workspace(&diamond());
    let ws = load(&dir).await;
    let graph = DependencyGraph::from_packages(&ws.packages);

    let mut cache = BuildCache::open(&ws.root).await.unwrap();
    build_all(&ws, &mut cache, &graph).await;

    // Touch a non-ignored file in core
    std::fs::write(
        dir.path().join("packages/core/index.js"),
        "// core, edited\n",
    )
    .unwrap();

    let (to_build, skipped) = split(&ws, &mut cache, &graph).await;
    assert_eq!(to_build, vec!["core", "lib1", "lib2", "app"]);
    assert!(skipped.is_empty());

    // The batch plan for the stale set is the full three-batch diamond
    let stale: Vec<PackageInfo> = to_build
        .iter()
        .map(|name| pkg(&ws, name).clone())
        .collect();
    let batches = DependencyGraph::from_packages(&stale).batches().unwrap();
    assert_eq!(batches.len(), 3);
}

#[tokio::test]
async fn unrelated_change_rebuilds_only_that_package() {
    let dir = scaffold_workspace(&diamond());
    let ws = load(&dir).await;
    let graph = DependencyGraph::from_packages(&ws.packages);

    let mut cache = BuildCache::open(&ws.root).await.unwrap();
    build_all(&ws, &mut cache, &graph).await;

    // app is a leaf; nothing depends on it
    std::fs::write(dir.path().join("apps/app/index.js"), "// app, edited\n").unwrap();

    let (to_build, skipped) = split(&ws, &mut cache, &graph).await;
    assert_eq!(to_build, vec!["app"]);
    assert_eq!(skipped.len(), 3);
}

#[tokio::test]
async fn gitignored_files_do_not_invalidate() {
    // Needs a real git checkout for the ignore query
    let git_ok = tokio::process::Command::new("git")
        .arg("--version")
        .output()
        .await
        .is_ok();
    if !git_ok {
        return;
    }

    let dir = scaffold_workspace(&diamond());
    let init = tokio::process::Command::new("git")
        .arg("-C")
        .arg(dir.path())
        .args(["init", "-q"])
        .output()
        .await;
    if !init.map(|o| o.status.success()).unwrap_or(false) {
        return;
    }
    std::fs::write(dir.path().join(".gitignore"), "dist/\n.wsu/\n").unwrap();

    let ws = load(&dir).await;
    let graph = DependencyGraph::from_packages(&ws.packages);
    let mut cache = BuildCache::open(&ws.root).await.unwrap();
    build_all(&ws, &mut cache, &graph).await;

    // A generated artifact under an ignored directory of lib1
    let dist = dir.path().join("packages/lib1/dist");
    std::fs::create_dir_all(&dist).unwrap();
    std::fs::write(dist.join("out.js"), "generated").unwrap();

    let (to_build, skipped) = split(&ws, &mut cache, &graph).await;
    assert!(to_build.is_empty(), "ignored files must not perturb hashes");
    assert_eq!(skipped.len(), 4);
}

#[tokio::test]
async fn filtered_build_closes_over_dependencies() {
    let dir = scaffold_workspace(&diamond());
    let ws = load(&dir).await;
    let graph = DependencyGraph::from_packages(&ws.packages);

    let closed = graph.closure(&["lib1".to_string()]);
    let names: Vec<&str> = closed.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["core", "lib1"]);
}

#[cfg(unix)]
mod process_scenarios {
    use wsu::supervisor::{CommandSpec, ProcessSupervisor, RunOptions};
    use wsu::ui::theme;

    fn sh(package: &str, script: &str) -> CommandSpec {
        CommandSpec::new(
            package,
            "sh",
            vec!["-c".to_string(), script.to_string()],
            std::env::temp_dir(),
        )
    }

    /// Three test scripts, the second failing: parallel runs all three,
    /// sequential never starts the third.
    #[tokio::test]
    async fn parallel_and_sequential_failure_semantics() {
        let supervisor = ProcessSupervisor::new(theme::ASCII);
        let specs = || {
            vec![
                sh("pkg-a", "exit 0"),
                sh("pkg-b", "exit 1"),
                sh("pkg-c", "exit 0"),
            ]
        };
        let options = RunOptions {
            concurrency: 3,
            timestamps: false,
        };

        let parallel = supervisor.run_parallel(specs(), options).await;
        assert_eq!(parallel.len(), 3);
        assert_eq!(parallel.iter().filter(|r| r.success).count(), 2);
        assert_eq!(parallel.iter().filter(|r| !r.success).count(), 1);

        let sequential = supervisor.run_sequential(specs(), options).await;
        assert_eq!(sequential.len(), 2, "third command never starts");
        assert!(!sequential[1].success);
    }

    /// Diamond-shaped batch plan with a failure in the middle batch:
    /// the final batch is withheld.
    #[tokio::test]
    async fn batched_failure_stops_later_batches() {
        let supervisor = ProcessSupervisor::new(theme::ASCII);
        let batches = vec![
            vec![sh("core", "exit 0")],
            vec![sh("lib1", "exit 1"), sh("lib2", "exit 0")],
            vec![sh("app", "exit 0")],
        ];
        let options = RunOptions {
            concurrency: 4,
            timestamps: false,
        };

        let results = supervisor.run_batched(batches, options).await;
        let names: Vec<&str> = results.iter().map(|r| r.package.as_str()).collect();
        assert_eq!(names, vec!["core", "lib1", "lib2"]);
    }
}
