//! Package-manager adapters
//!
//! One adapter per supported package manager (npm, pnpm, Bun). Each answers
//! three questions: am I active here, which globs declare the workspace
//! members, and how is a named script invoked. Adapters are probed in a
//! fixed preference order and scored on the evidence found on disk.

mod bun;
mod npm;
mod pnpm;

pub use bun::Bun;
pub use npm::Npm;
pub use pnpm::Pnpm;

use crate::error::{WsuError, WsuResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Detection points per piece of evidence
const LOCK_FILE_POINTS: u32 = 4;
const CONFIG_FILE_POINTS: u32 = 2;
const PARSED_CONFIG_POINTS: u32 = 1;

/// Identity of a supported package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManagerKind {
    Npm,
    Pnpm,
    Bun,
}

impl fmt::Debug for dyn PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Bun => "bun",
        };
        write!(f, "{}", name)
    }
}

/// Abstract package-manager interface
///
/// Implementations differ in which files they probe and how they read the
/// workspace declaration (manifest `workspaces` field vs. a YAML file).
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Which package manager this adapter represents
    fn kind(&self) -> PackageManagerKind;

    /// The lock file this manager writes at the workspace root
    fn lock_file_name(&self) -> &'static str;

    /// Confidence that this manager is active at `root`. Zero means no
    /// evidence at all.
    async fn detect_score(&self, root: &Path) -> u32;

    /// The workspace member glob patterns declared at `root`
    async fn workspace_globs(&self, root: &Path) -> WsuResult<Vec<String>>;

    /// The command and arguments that run a named script
    fn run_script_command(&self, script: &str) -> (String, Vec<String>);
}

/// Probe all adapters at `root` and return the best match.
///
/// Adapters are scored independently; the highest score wins and ties are
/// broken by declaration order (npm, pnpm, bun). A zero score across the
/// board means the directory is not a workspace.
pub async fn detect_package_manager(root: &Path) -> WsuResult<Box<dyn PackageManager>> {
    let candidates: Vec<Box<dyn PackageManager>> =
        vec![Box::new(Npm), Box::new(Pnpm), Box::new(Bun)];

    let mut best: Option<(u32, Box<dyn PackageManager>)> = None;
    for candidate in candidates {
        let score = candidate.detect_score(root).await;
        debug!("{} scored {} at {}", candidate.kind(), score, root.display());
        if score > 0 && best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, candidate));
        }
    }

    match best {
        Some((_, manager)) => Ok(manager),
        None => Err(WsuError::WorkspaceNotDetected(root.to_path_buf())),
    }
}

/// Read the `workspaces` field of `root/package.json`, if any.
///
/// Accepts both the plain array form and the `{ "packages": [...] }` object
/// form. Returns `Ok(None)` when the manifest or the field is absent.
pub(crate) async fn manifest_workspace_globs(root: &Path) -> WsuResult<Option<Vec<String>>> {
    let manifest_path = root.join("package.json");
    let content = match tokio::fs::read_to_string(&manifest_path).await {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| WsuError::ManifestMalformed {
        path: manifest_path.clone(),
        reason: e.to_string(),
    })?;

    let field = match value.get("workspaces") {
        Some(field) => field,
        None => return Ok(None),
    };

    let patterns = match field {
        Value::Array(items) => collect_patterns(items),
        Value::Object(map) => match map.get("packages") {
            Some(Value::Array(items)) => collect_patterns(items),
            _ => None,
        },
        _ => None,
    };

    match patterns {
        Some(globs) => Ok(Some(globs)),
        None => Err(WsuError::WorkspaceConfigInvalid {
            path: manifest_path,
            reason: "workspaces must be an array of globs or { \"packages\": [...] }".to_string(),
        }),
    }
}

fn collect_patterns(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Score shared by the manifest-workspaces managers (npm, bun)
pub(crate) async fn manifest_based_score(root: &Path, lock_files: &[&str]) -> u32 {
    let mut score = 0;
    if lock_files.iter().any(|name| root.join(name).is_file()) {
        score += LOCK_FILE_POINTS;
    }
    match manifest_workspace_globs(root).await {
        Ok(Some(globs)) => {
            score += CONFIG_FILE_POINTS;
            if !globs.is_empty() {
                score += PARSED_CONFIG_POINTS;
            }
        }
        Ok(None) | Err(_) => {}
    }
    score
}
