//! Workspace discovery and loading
//!
//! Walks upward from a starting directory to the workspace root, expands
//! the member globs declared by the active package manager, and loads every
//! member manifest into the immutable `WorkspaceInfo` the orchestrators
//! share for the rest of the invocation.

pub mod filter;
pub mod manifest;

pub use filter::{filter_by_name, partition_by_script};
pub use manifest::{PackageInfo, PackageManifest, MANIFEST_FILE};

use crate::error::{WsuError, WsuResult};
use crate::manager::{detect_package_manager, PackageManager, PackageManagerKind};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An immutable view of the loaded workspace
#[derive(Debug)]
pub struct WorkspaceInfo {
    /// Workspace root directory
    pub root: PathBuf,
    /// Members in deterministic (path-sorted) order
    pub packages: Vec<PackageInfo>,
    /// The active package-manager adapter
    pub manager: Box<dyn PackageManager>,
    index: HashMap<String, usize>,
}

impl WorkspaceInfo {
    /// Look up a member by name
    pub fn package(&self, name: &str) -> Option<&PackageInfo> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    /// Whether `name` is a workspace member
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Identity of the active package manager
    pub fn manager_kind(&self) -> PackageManagerKind {
        self.manager.kind()
    }
}

/// Walk upward from `start` until a directory declares a workspace: a
/// package.json with a `workspaces` field or a pnpm-workspace.yaml.
pub async fn find_workspace_root(start: &Path) -> WsuResult<PathBuf> {
    let start = start
        .canonicalize()
        .map_err(|e| WsuError::io(format!("resolving {}", start.display()), e))?;

    let mut dir: &Path = &start;
    loop {
        if is_workspace_root(dir).await {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(WsuError::WorkspaceNotDetected(start)),
        }
    }
}

async fn is_workspace_root(dir: &Path) -> bool {
    if dir.join("pnpm-workspace.yaml").is_file() {
        return true;
    }
    matches!(
        crate::manager::manifest_workspace_globs(dir).await,
        Ok(Some(_))
    )
}

/// Load the workspace that contains `start`
pub async fn load_workspace(start: &Path) -> WsuResult<WorkspaceInfo> {
    let root = find_workspace_root(start).await?;
    let manager = detect_package_manager(&root).await?;
    debug!(
        "Workspace root {} ({} workspace)",
        root.display(),
        manager.kind()
    );

    let globs = manager.workspace_globs(&root).await?;
    let member_dirs = expand_member_globs(&root, &globs)?;

    let mut packages: Vec<PackageInfo> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for dir in member_dirs {
        // Directories without a manifest are not members
        if !dir.join(MANIFEST_FILE).is_file() {
            continue;
        }

        let info = PackageInfo::load(&dir).await?;
        if let Some(&existing) = index.get(&info.name) {
            return Err(WsuError::DuplicatePackageName {
                name: info.name,
                first: packages[existing].path.clone(),
                second: dir,
            });
        }

        index.insert(info.name.clone(), packages.len());
        packages.push(info);
    }

    debug!("Loaded {} workspace package(s)", packages.len());

    Ok(WorkspaceInfo {
        root,
        packages,
        manager,
        index,
    })
}

/// Expand workspace member globs into member directories.
///
/// Only directories are admitted. A `!`-prefixed glob subtracts its matches
/// from the positive set after expansion. The result is path-sorted for
/// deterministic member order.
fn expand_member_globs(root: &Path, patterns: &[String]) -> WsuResult<Vec<PathBuf>> {
    let mut matched: BTreeSet<PathBuf> = BTreeSet::new();
    let mut negated: BTreeSet<PathBuf> = BTreeSet::new();

    for pattern in patterns {
        let (target, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (&mut negated, rest),
            None => (&mut matched, pattern.as_str()),
        };

        let full = root.join(pattern);
        let entries =
            glob::glob(&full.to_string_lossy()).map_err(|e| WsuError::WorkspaceConfigInvalid {
                path: root.to_path_buf(),
                reason: format!("bad workspace glob '{}': {}", pattern, e),
            })?;

        for entry in entries.flatten() {
            if entry.is_dir() {
                target.insert(entry);
            }
        }
    }

    Ok(matched.difference(&negated).cloned().collect())
}
