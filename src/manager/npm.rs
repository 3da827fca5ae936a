//! npm adapter: package-lock.json plus the manifest `workspaces` field

use super::{manifest_based_score, manifest_workspace_globs, PackageManager, PackageManagerKind};
use crate::error::{WsuError, WsuResult};
use async_trait::async_trait;
use std::path::Path;

pub struct Npm;

#[async_trait]
impl PackageManager for Npm {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Npm
    }

    fn lock_file_name(&self) -> &'static str {
        "package-lock.json"
    }

    async fn detect_score(&self, root: &Path) -> u32 {
        manifest_based_score(root, &[self.lock_file_name()]).await
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
        ("npm".to_string(), vec!["run".to_string(), script.to_string()])
    }
}
