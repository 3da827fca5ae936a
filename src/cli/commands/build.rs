//! Build command - dependency-ordered batched builds with cache skipping

use super::{current_dir, exit_code, load_filtered, script_command, spinner};
use crate::cache::BuildCache;
use crate::cli::args::BuildArgs;
use crate::error::{WsuError, WsuResult};
use crate::graph::DependencyGraph;
use crate::supervisor::{CommandSpec, ProcessSupervisor, RunOptions};
use crate::ui::{output, Symbols};
use crate::workspace::{partition_by_script, PackageInfo};
use console::style;
use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, warn};

const BUILD_SCRIPT: &str = "build";

/// Execute the build command
pub async fn execute(args: BuildArgs, ascii: bool) -> WsuResult<ExitCode> {
    let symbols = Symbols::detect(ascii);
    let started = Instant::now();

    let pb = spinner("Loading workspace...");
    let loaded = load_filtered(&current_dir()?, args.filter.as_deref()).await;
    pb.finish_and_clear();
    let (ws, selected) = loaded?;

    // A filtered build stays correct only when its dependencies come along
    let workspace_graph = DependencyGraph::from_packages(&ws.packages);
    let target_names: Vec<String> = selected.iter().map(|p| p.name.clone()).collect();
    let closed = workspace_graph.closure(&target_names);
    let candidates: Vec<PackageInfo> = ws
        .packages
        .iter()
        .filter(|pkg| closed.contains(&pkg.name))
        .cloned()
        .collect();

    let (valid, invalid) = partition_by_script(&candidates, BUILD_SCRIPT);
    let missing: Vec<String> = invalid.into_iter().map(|p| p.name).collect();
    output::warn_missing_script(&symbols, BUILD_SCRIPT, &missing);

    if valid.is_empty() {
        return Err(WsuError::NoTarget(format!(
            "no package declares a '{}' script",
            BUILD_SCRIPT
        )));
    }

    // Cycle diagnosis is fatal before anything is spawned
    let build_graph = DependencyGraph::from_packages(&valid);
    let order = build_graph.topological_sort()?;
    let by_name: HashMap<&str, &PackageInfo> =
        valid.iter().map(|pkg| (pkg.name.as_str(), pkg)).collect();

    let pb = spinner("Checking build cache...");
    let mut cache = match BuildCache::open(&ws.root).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!("Build cache unavailable: {}", e);
            None
        }
    };

    let (to_build, skipped) = match cache.as_mut() {
        Some(cache) if !args.no_skip_unchanged => {
            split_unchanged(cache, &order, &by_name, &workspace_graph).await
        }
        _ => (
            order
                .iter()
                .filter_map(|name| by_name.get(name.as_str()).map(|pkg| (*pkg).clone()))
                .collect(),
            Vec::new(),
        ),
    };
    pb.finish_and_clear();

    if !skipped.is_empty() {
        debug!("Cache-valid, skipping: {}", skipped.join(", "));
    }

    if to_build.is_empty() {
        println!(
            "{} All {} package(s) up to date",
            style(symbols.check).green(),
            skipped.len()
        );
        output::summary(&symbols, &[], skipped.len(), started.elapsed());
        return Ok(ExitCode::SUCCESS);
    }

    // Batches over just the packages being built
    let batch_graph = DependencyGraph::from_packages(&to_build);
    let batches = batch_graph.batches()?;
    debug!(
        "Building {} package(s) in {} batch(es)",
        to_build.len(),
        batches.len()
    );

    let build_by_name: HashMap<&str, &PackageInfo> =
        to_build.iter().map(|pkg| (pkg.name.as_str(), pkg)).collect();
    let spec_batches: Vec<Vec<CommandSpec>> = batches
        .iter()
        .map(|batch| {
            batch
                .iter()
                .filter_map(|name| build_by_name.get(name.as_str()))
                .map(|pkg| script_command(&ws, pkg, BUILD_SCRIPT))
                .collect()
        })
        .collect();

    let supervisor = ProcessSupervisor::new(symbols);
    let options = RunOptions {
        concurrency: args.concurrency,
        timestamps: false,
    };
    let results = supervisor.run_batched(spec_batches, options).await;

    // Record successful builds; each update erases downstream entries so
    // stale dependency fingerprints are never trusted
    if let Some(cache) = cache.as_mut() {
        for result in results.iter().filter(|r| r.success) {
            let Some(pkg) = build_by_name.get(result.package.as_str()) else {
                continue;
            };
            match cache.update(pkg, result.duration).await {
                Ok(()) => {
                    if let Err(e) = cache
                        .invalidate_dependents(&result.package, &workspace_graph)
                        .await
                    {
                        warn!("Cache invalidation failed for {}: {}", result.package, e);
                    }
                }
                Err(e) => warn!("Cache update failed for {}: {}", result.package, e),
            }
        }
    }

    output::summary(&symbols, &results, skipped.len(), started.elapsed());
    Ok(exit_code(&results))
}

/// Split build candidates into cache-valid (skipped) and stale (to build).
///
/// Walks in topological order; when a package turns out stale, its
/// transitive dependents' entries are dropped immediately so the walk
/// classifies them as stale too, and a single invocation rebuilds the
/// whole downstream chain.
async fn split_unchanged(
    cache: &mut BuildCache,
    order: &[String],
    by_name: &HashMap<&str, &PackageInfo>,
    workspace_graph: &DependencyGraph,
) -> (Vec<PackageInfo>, Vec<String>) {
    let mut to_build = Vec::new();
    let mut skipped = Vec::new();

    for name in order {
        let Some(pkg) = by_name.get(name.as_str()) else {
            continue;
        };
        if cache.is_valid(pkg).await {
            skipped.push(name.clone());
        } else {
            if let Err(e) = cache.invalidate_dependents(name, workspace_graph).await {
                warn!("Cache invalidation failed for {}: {}", name, e);
            }
            to_build.push((*pkg).clone());
        }
    }

    (to_build, skipped)
}
