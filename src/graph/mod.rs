//! Dependency graph engine
//!
//! A name-keyed directed graph over workspace members. Edges run from a
//! package to its workspace dependencies; external dependency names are
//! ignored at construction. Provides topological ordering (Kahn), cycle
//! diagnosis (DFS), batch partitioning for dependency-aware parallelism,
//! and the closures used by filtered builds and cache invalidation.

use crate::error::{WsuError, WsuResult};
use crate::workspace::PackageInfo;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Edges of a single package
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    /// Outgoing edges: workspace packages this one depends on
    pub dependencies: BTreeSet<String>,
    /// Incoming edges: workspace packages that depend on this one
    pub dependents: BTreeSet<String>,
}

/// Workspace dependency graph
///
/// Invariant: `dependents(x)` contains `y` iff `dependencies(y)` contains
/// `x`. Insertion order is retained so traversals are deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, GraphNode>,
    names: Vec<String>,
}

impl DependencyGraph {
    /// Build the graph for a set of packages. Only names that are
    /// themselves members become edges; self-references are dropped.
    pub fn from_packages(packages: &[PackageInfo]) -> Self {
        let mut graph = Self::default();
        let members: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();

        for pkg in packages {
            graph.add_node(&pkg.name);
        }
        for pkg in packages {
            for dep in pkg.declared_dependencies() {
                if dep != pkg.name && members.contains(dep) {
                    graph.add_edge(&pkg.name, dep);
                }
            }
        }
        graph
    }

    fn add_node(&mut self, name: &str) {
        if !self.nodes.contains_key(name) {
            self.names.push(name.to_string());
            self.nodes.insert(name.to_string(), GraphNode::default());
        }
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(from) {
            node.dependencies.insert(to.to_string());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.dependents.insert(from.to_string());
        }
    }

    /// Number of packages in the graph
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Package names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Edges of one package
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    /// Kahn topological sort: every package appears after all of its
    /// workspace dependencies. Fails with the full cycle diagnosis when the
    /// graph is cyclic.
    pub fn topological_sort(&self) -> WsuResult<Vec<String>> {
        let mut remaining: HashMap<&str, usize> = self
            .names
            .iter()
            .map(|name| (name.as_str(), self.nodes[name].dependencies.len()))
            .collect();

        let mut queue: VecDeque<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| remaining[name] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.names.len());
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            for dependent in &self.nodes[name].dependents {
                if let Some(count) = remaining.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if order.len() < self.names.len() {
            return Err(WsuError::DependencyCycle {
                cycles: self.find_cycles(),
            });
        }
        Ok(order)
    }

    /// Report every cycle as a concrete list of names, in first-encountered
    /// traversal order.
    fn find_cycles(&self) -> Vec<Vec<String>> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        fn visit(
            graph: &DependencyGraph,
            name: &str,
            colors: &mut HashMap<String, u8>,
            path: &mut Vec<String>,
            cycles: &mut Vec<Vec<String>>,
        ) {
            colors.insert(name.to_string(), GRAY);
            path.push(name.to_string());

            for dep in &graph.nodes[name].dependencies {
                match colors.get(dep.as_str()).copied().unwrap_or(WHITE) {
                    WHITE => visit(graph, dep, colors, path, cycles),
                    GRAY => {
                        // Back edge: the cycle is the path suffix from dep
                        if let Some(start) = path.iter().position(|n| n == dep) {
                            cycles.push(path[start..].to_vec());
                        }
                    }
                    _ => {}
                }
            }

            path.pop();
            colors.insert(name.to_string(), BLACK);
        }

        let mut colors: HashMap<String, u8> = HashMap::new();
        let mut cycles = Vec::new();
        for name in &self.names {
            if colors.get(name.as_str()).copied().unwrap_or(WHITE) == WHITE {
                let mut path = Vec::new();
                visit(self, name, &mut colors, &mut path, &mut cycles);
            }
        }
        cycles
    }

    /// Partition the graph into executable batches: every package in batch
    /// `k` has all of its dependencies in batches `0..k`, and `k` is the
    /// lowest batch with that property. Within a batch, topological
    /// relative order is preserved.
    pub fn batches(&self) -> WsuResult<Vec<Vec<String>>> {
        let order = self.topological_sort()?;
        let mut levels: HashMap<&str, usize> = HashMap::new();
        let mut batches: Vec<Vec<String>> = Vec::new();

        for name in &order {
            let level = self.nodes[name]
                .dependencies
                .iter()
                .map(|dep| levels[dep.as_str()] + 1)
                .max()
                .unwrap_or(0);
            levels.insert(name, level);

            if batches.len() <= level {
                batches.push(Vec::new());
            }
            batches[level].push(name.clone());
        }
        Ok(batches)
    }

    /// Close a target set under dependencies: the targets plus, recursively,
    /// every workspace dependency of every package reached. Idempotent.
    pub fn closure(&self, targets: &[String]) -> BTreeSet<String> {
        let mut reached = BTreeSet::new();
        let mut worklist: Vec<&str> = targets
            .iter()
            .map(String::as_str)
            .filter(|name| self.nodes.contains_key(*name))
            .collect();

        while let Some(name) = worklist.pop() {
            if !reached.insert(name.to_string()) {
                continue;
            }
            worklist.extend(self.nodes[name].dependencies.iter().map(String::as_str));
        }
        reached
    }

    /// Every package that depends on `name`, directly or transitively
    pub fn transitive_dependents(&self, name: &str) -> BTreeSet<String> {
        let mut reached = BTreeSet::new();
        let mut worklist: Vec<&str> = match self.nodes.get(name) {
            Some(node) => node.dependents.iter().map(String::as_str).collect(),
            None => return reached,
        };

        while let Some(current) = worklist.pop() {
            if !reached.insert(current.to_string()) {
                continue;
            }
            worklist.extend(self.nodes[current].dependents.iter().map(String::as_str));
        }
        reached
    }

    /// Packages with no workspace dependencies
    pub fn roots(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| self.nodes[*name].dependencies.is_empty())
            .cloned()
            .collect()
    }

    /// Packages no other member depends on
    pub fn leaves(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| self.nodes[*name].dependents.is_empty())
            .cloned()
            .collect()
    }
}
