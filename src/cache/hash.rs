//! Input hash computation
//!
//! The fingerprint of a package is a SHA256 over three parts with stable
//! separators (newline between parts, comma within lists):
//!
//! 1. the hash of the manifest file's exact bytes,
//! 2. `relative-path:hash` pairs for the source set, sorted by path,
//! 3. `dep-name:dep-input-hash` pairs for every declared dependency,
//!    sorted by name, with `MISSING` for names without a cache entry.
//!
//! Per-file hashing takes a fast path through the file index when the
//! current `(mtime, size)` stat matches.

use super::{ignore, FileIndex, FileIndexEntry};
use crate::error::{WsuError, WsuResult};
use crate::workspace::PackageInfo;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Directories never included in a source set
const EXCLUDED_DIRS: [&str; 3] = ["node_modules", ".git", super::CACHE_DIR_NAME];

/// Compute the package's input hash, refreshing `index` in place.
pub(crate) async fn compute_input_hash(
    pkg: &PackageInfo,
    workspace_root: &Path,
    index: &mut FileIndex,
    dependency_hashes: &BTreeMap<String, String>,
) -> WsuResult<String> {
    let manifest_path = pkg.manifest_path();
    let manifest_bytes = tokio::fs::read(&manifest_path)
        .await
        .map_err(|e| WsuError::cache_io(format!("reading {}", manifest_path.display()), e))?;
    let manifest_hash = hex::encode(Sha256::digest(&manifest_bytes));

    let mut files = collect_source_files(&pkg.path)?;
    files = ignore::filter_ignored(workspace_root, &pkg.path, files).await;

    let mut file_parts = Vec::with_capacity(files.len());
    for rel in &files {
        if let Some(hash) = hash_with_index(&pkg.path, rel, index) {
            file_parts.push(format!("{}:{}", rel, hash));
        }
    }
    // Entries for files that no longer exist are stale; drop them
    index.retain(|rel, _| files.binary_search(rel).is_ok());

    let dep_parts: Vec<String> = dependency_hashes
        .iter()
        .map(|(name, hash)| format!("{}:{}", name, hash))
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(manifest_hash.as_bytes());
    hasher.update(b"\n");
    hasher.update(file_parts.join(",").as_bytes());
    hasher.update(b"\n");
    hasher.update(dep_parts.join(",").as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Collect the package's candidate source files as sorted POSIX-style
/// relative paths, skipping excluded directories at any depth.
pub(crate) fn collect_source_files(package_dir: &Path) -> WsuResult<Vec<String>> {
    let mut files = Vec::new();
    walk(package_dir, "", &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut Vec<String>) -> WsuResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| WsuError::cache_io(format!("reading {}", dir.display()), e))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(_) => continue,
        };
        if file_type.is_dir() {
            if EXCLUDED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk(&entry.path(), &rel, files)?;
        } else if file_type.is_file() {
            files.push(rel);
        }
    }
    Ok(())
}

/// Hash one file, reusing the indexed hash when `(mtime, size)` still
/// matches. Files that fail to stat or read contribute nothing.
fn hash_with_index(package_dir: &Path, rel: &str, index: &mut FileIndex) -> Option<String> {
    let path = package_dir.join(rel);
    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(_) => {
            index.remove(rel);
            return None;
        }
    };

    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let size = meta.len();

    if let Some(entry) = index.get(rel) {
        if entry.mtime == mtime && entry.size == size {
            return Some(entry.hash.clone());
        }
    }

    let contents = match std::fs::read(&path) {
        Ok(contents) => contents,
        Err(_) => {
            index.remove(rel);
            return None;
        }
    };
    let hash = hex::encode(Sha256::digest(&contents));
    index.insert(
        rel.to_string(),
        FileIndexEntry {
            mtime,
            size,
            hash: hash.clone(),
        },
    );
    Some(hash)
}
