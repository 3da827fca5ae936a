//! VCS-ignore filtering for the source set
//!
//! Generated artifacts that git already ignores must not perturb input
//! hashes. Candidate paths are checked with `git check-ignore` in batches
//! to amortize the process-spawn cost; when the invocation fails (no git,
//! not a checkout) the unfiltered set is used.

use std::collections::HashSet;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Candidate paths per `git check-ignore` invocation
const BATCH_SIZE: usize = 50;

/// Subtract git-ignored paths from a package's candidate files.
///
/// `files` are POSIX-style paths relative to `package_dir`; the ignore
/// query runs against the workspace root so root-level ignore rules apply.
pub(crate) async fn filter_ignored(
    workspace_root: &Path,
    package_dir: &Path,
    files: Vec<String>,
) -> Vec<String> {
    if files.is_empty() {
        return files;
    }

    let package_prefix = match package_dir.strip_prefix(workspace_root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => return files,
    };

    let candidates: Vec<String> = files
        .iter()
        .map(|file| {
            if package_prefix.is_empty() {
                file.clone()
            } else {
                format!("{}/{}", package_prefix, file)
            }
        })
        .collect();

    let mut ignored: HashSet<String> = HashSet::new();
    for chunk in candidates.chunks(BATCH_SIZE) {
        let output = Command::new("git")
            .arg("-C")
            .arg(workspace_root)
            .arg("check-ignore")
            .args(chunk)
            .output()
            .await;

        match output {
            // Exit 0: some paths are ignored (listed on stdout).
            // Exit 1: none in this batch.
            Ok(out) if matches!(out.status.code(), Some(0) | Some(1)) => {
                for line in String::from_utf8_lossy(&out.stdout).lines() {
                    ignored.insert(line.trim().to_string());
                }
            }
            Ok(out) => {
                debug!(
                    "git check-ignore unavailable (exit {:?}), using unfiltered set",
                    out.status.code()
                );
                return files;
            }
            Err(e) => {
                debug!("git check-ignore failed ({}), using unfiltered set", e);
                return files;
            }
        }
    }

    files
        .into_iter()
        .zip(candidates)
        .filter(|(_, candidate)| !ignored.contains(candidate))
        .map(|(file, _)| file)
        .collect()
}
