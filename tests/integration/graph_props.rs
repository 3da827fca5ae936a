//! Property tests for the dependency graph engine

use proptest::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use wsu::graph::DependencyGraph;
use wsu::workspace::{PackageInfo, PackageManifest};

fn pkg(name: String, deps: Vec<String>) -> PackageInfo {
    let manifest = PackageManifest {
        name: Some(name.clone()),
        dependencies: deps.into_iter().map(|d| (d, "*".to_string())).collect(),
        ..Default::default()
    };
    PackageInfo::from_manifest(PathBuf::from("/ws").join(&name), manifest).unwrap()
}

/// Random DAG: package `p_i` may depend only on packages with a lower
/// index, which rules out cycles by construction.
fn dag_strategy() -> impl Strategy<Value = Vec<PackageInfo>> {
    proptest::collection::vec(proptest::collection::vec(any::<bool>(), 10), 2..10).prop_map(
        |rows| {
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    let deps: Vec<String> = (0..i)
                        .filter(|&j| row[j])
                        .map(|j| format!("p{j}"))
                        .collect();
                    pkg(format!("p{i}"), deps)
                })
                .collect()
        },
    )
}

/// A single ring of 2..8 packages
fn ring_strategy() -> impl Strategy<Value = Vec<PackageInfo>> {
    (2usize..8).prop_map(|n| {
        (0..n)
            .map(|i| pkg(format!("p{i}"), vec![format!("p{}", (i + 1) % n)]))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn toposort_puts_every_dependency_earlier(packages in dag_strategy()) {
        let graph = DependencyGraph::from_packages(&packages);
        let order = graph.topological_sort().unwrap();
        prop_assert_eq!(order.len(), packages.len());

        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        for name in graph.names() {
            for dep in &graph.node(name).unwrap().dependencies {
                prop_assert!(position[dep.as_str()] < position[name.as_str()]);
            }
        }
    }

    #[test]
    fn batches_are_minimal_levels(packages in dag_strategy()) {
        let graph = DependencyGraph::from_packages(&packages);
        let batches = graph.batches().unwrap();

        let batch_of: HashMap<&str, usize> = batches
            .iter()
            .enumerate()
            .flat_map(|(k, batch)| batch.iter().map(move |name| (name.as_str(), k)))
            .collect();

        for name in graph.names() {
            let k = batch_of[name.as_str()];
            let deps = &graph.node(name).unwrap().dependencies;
            for dep in deps {
                prop_assert!(batch_of[dep.as_str()] < k);
            }
            // k is the lowest admissible batch
            if k > 0 {
                let highest_dep = deps.iter().map(|d| batch_of[d.as_str()]).max();
                prop_assert_eq!(highest_dep, Some(k - 1));
            }
        }
    }

    #[test]
    fn closure_is_idempotent(packages in dag_strategy(), seed in 0usize..10) {
        let graph = DependencyGraph::from_packages(&packages);
        let target = vec![format!("p{}", seed % packages.len())];

        let once = graph.closure(&target);
        let twice = graph.closure(&once.iter().cloned().collect::<Vec<_>>());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn edges_are_symmetric(packages in dag_strategy()) {
        let graph = DependencyGraph::from_packages(&packages);
        for x in graph.names() {
            let node = graph.node(x).unwrap();
            for y in &node.dependents {
                prop_assert!(graph.node(y).unwrap().dependencies.contains(x));
            }
            for y in &node.dependencies {
                prop_assert!(graph.node(y).unwrap().dependents.contains(x));
            }
        }
    }

    #[test]
    fn rings_report_a_cycle_touching_every_node(packages in ring_strategy()) {
        let graph = DependencyGraph::from_packages(&packages);
        let err = graph.topological_sort().unwrap_err();

        let cycles = match err {
            wsu::WsuError::DependencyCycle { cycles } => cycles,
            other => panic!("unexpected error: {other}"),
        };
        prop_assert!(!cycles.is_empty());

        let full_ring = cycles.iter().any(|cycle| {
            cycle.len() == packages.len()
                && packages.iter().all(|p| cycle.contains(&p.name))
        });
        prop_assert!(full_ring, "no reported cycle covers the ring: {cycles:?}");
    }
}
