//! pnpm adapter: pnpm-lock.yaml plus pnpm-workspace.yaml
//!
//! The workspace file is a small fixed-shape YAML document; the `packages:`
//! list is read with a line-level parse rather than a YAML dependency.

use super::{
    PackageManager, PackageManagerKind, CONFIG_FILE_POINTS, LOCK_FILE_POINTS, PARSED_CONFIG_POINTS,
};
use crate::error::{WsuError, WsuResult};
use async_trait::async_trait;
use std::path::Path;

const WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

pub struct Pnpm;

impl Pnpm {
    async fn read_workspace_file(root: &Path) -> Option<String> {
        tokio::fs::read_to_string(root.join(WORKSPACE_FILE)).await.ok()
    }
}

#[async_trait]
impl PackageManager for Pnpm {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Pnpm
    }

    fn lock_file_name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    async fn detect_score(&self, root: &Path) -> u32 {
        let mut score = 0;
        if root.join(self.lock_file_name()).is_file() {
            score += LOCK_FILE_POINTS;
        }
        if let Some(content) = Self::read_workspace_file(root).await {
            score += CONFIG_FILE_POINTS;
            if parse_workspace_yaml(&content).is_some_and(|globs| !globs.is_empty()) {
                score += PARSED_CONFIG_POINTS;
            }
        }
        score
    }

    async fn workspace_globs(&self, root: &Path) -> WsuResult<Vec<String>> {
        let path = root.join(WORKSPACE_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| WsuError::io(format!("reading {}", path.display()), e))?;

        parse_workspace_yaml(&content).ok_or_else(|| WsuError::WorkspaceConfigInvalid {
            path,
            reason: "no packages list".to_string(),
        })
    }

    fn run_script_command(&self, script: &str) -> (String, Vec<String>) {
        (
            "pnpm".to_string(),
            vec!["run".to_string(), script.to_string()],
        )
    }
}

/// Extract the `packages:` list from pnpm-workspace.yaml.
///
/// Handles the document shape pnpm itself documents: a top-level `packages:`
/// key followed by `- pattern` items, optionally quoted. Returns `None` when
/// the key is missing entirely.
fn parse_workspace_yaml(content: &str) -> Option<Vec<String>> {
    let mut patterns = Vec::new();
    let mut in_packages = false;
    let mut seen_packages = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed == "packages:" {
            in_packages = true;
            seen_packages = true;
            continue;
        }

        if in_packages {
            if let Some(rest) = trimmed.strip_prefix('-') {
                let pattern = rest.trim().trim_matches('\'').trim_matches('"');
                if !pattern.is_empty() {
                    patterns.push(pattern.to_string());
                }
            } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
                // Another top-level key ends the list
                in_packages = false;
            }
        }
    }

    seen_packages.then_some(patterns)
}
