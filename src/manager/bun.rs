//! Bun adapter: bun.lockb / bun.lock plus the manifest `workspaces` field

use super::{manifest_based_score, manifest_workspace_globs, PackageManager, PackageManagerKind};
use crate::error::{WsuError, WsuResult};
use async_trait::async_trait;
use std::path::Path;

pub struct Bun;

#[async_trait]
impl PackageManager for Bun {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Bun
    }

    fn lock_file_name(&self) -> &'static str {
        "bun.lockb"
    }

    async fn detect_score(&self, root: &Path) -> u32 {
        // Bun 1.2 switched to a text lock file; accept both spellings
        manifest_based_score(root, &[self.lock_file_name(), "bun.lock"]).await
    }

    async fn workspace_globs(&self, root: &Path) -> WsuResult<Vec<String>> {
        manifest_workspace_globs(root)
            .await?
            .ok_or_else(|| WsuError::WorkspaceConfigInvalid {
                path: root.join("package.json"),
                reason: "no workspaces field".to_string(),
            })
    }

    fn run_script_command(&self, script: &str) -> (String, Vec<String>) {
        ("bun".to_string(), vec!["run".to_string(), script.to_string()])
    }
}
