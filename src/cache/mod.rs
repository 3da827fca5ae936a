//! Content-addressed build cache
//!
//! Skips re-execution of packages whose inputs are unchanged. Cache keys
//! are SHA256 input hashes composed from the package manifest, the source
//! set, and the stored fingerprints of workspace dependencies.
//!
//! # On-disk layout
//!
//! ```text
//! <workspace>/.wsu/
//!   manifest.json               workspace-wide index of cached packages
//!   packages/<name>/
//!     cache.json                CacheEntry: inputHash + dependency snapshot
//!     files.json                FileIndex: per-file (mtime, size) -> hash
//! ```
//!
//! The manifest is the source of truth for which entries exist; entries
//! missing on disk are dropped silently on load. `files.json` is purely an
//! advisory speedup and is safe to discard at any time.
//!
//! Package names are used verbatim as directory names (scoped names like
//! `@org/pkg` nest one level). Names differing only by case collide on
//! case-insensitive filesystems; known limitation.

pub mod hash;
pub mod ignore;

use crate::error::{WsuError, WsuResult};
use crate::graph::DependencyGraph;
use crate::workspace::PackageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Cache directory name under the workspace root
pub const CACHE_DIR_NAME: &str = ".wsu";

/// Bumped when the on-disk format changes; mismatched manifests are
/// silently replaced with an empty one
pub const CACHE_VERSION: u32 = 1;

/// Sentinel recorded for a dependency with no cache entry
pub const MISSING_HASH: &str = "MISSING";

const MANIFEST_NAME: &str = "manifest.json";
const PACKAGES_DIR: &str = "packages";
const ENTRY_NAME: &str = "cache.json";
const INDEX_NAME: &str = "files.json";

/// Fingerprint of a package's last successful build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Hex SHA256 over manifest, source set, and dependency fingerprints
    pub input_hash: String,
    /// Each declared dependency's input hash at record time
    pub dependency_hashes: BTreeMap<String, String>,
    pub last_build: DateTime<Utc>,
    /// Milliseconds
    pub build_duration: u64,
    pub built_by: String,
}

/// Per-file hash memo; authoritative only while `(mtime, size)` matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIndexEntry {
    /// Modification time, milliseconds since the epoch
    pub mtime: u64,
    pub size: u64,
    pub hash: String,
}

/// POSIX-normalized relative path to its index entry
pub type FileIndex = BTreeMap<String, FileIndexEntry>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheManifest {
    version: u32,
    packages: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            packages: Vec::new(),
        }
    }
}

/// The workspace build cache
pub struct BuildCache {
    root: PathBuf,
    dir: PathBuf,
    manifest: CacheManifest,
    entries: HashMap<String, CacheEntry>,
    indexes: HashMap<String, FileIndex>,
}

impl BuildCache {
    /// Open (creating if needed) the cache for a workspace root.
    ///
    /// Ensures the `.wsu/` layout exists and that `.gitignore` covers it,
    /// then pre-loads every entry the manifest references. A corrupt or
    /// version-mismatched manifest is replaced with an empty one.
    pub async fn open(root: &Path) -> WsuResult<Self> {
        let dir = root.join(CACHE_DIR_NAME);
        fs::create_dir_all(dir.join(PACKAGES_DIR))
            .await
            .map_err(|e| WsuError::cache_io(format!("creating {}", dir.display()), e))?;
        ensure_gitignore(root).await?;

        let manifest = match fs::read_to_string(dir.join(MANIFEST_NAME)).await {
            Ok(content) => match serde_json::from_str::<CacheManifest>(&content) {
                Ok(manifest) if manifest.version == CACHE_VERSION => manifest,
                Ok(manifest) => {
                    debug!(
                        "Cache manifest version {} != {}, starting fresh",
                        manifest.version, CACHE_VERSION
                    );
                    CacheManifest::default()
                }
                Err(e) => {
                    debug!("Corrupt cache manifest, starting fresh: {}", e);
                    CacheManifest::default()
                }
            },
            Err(_) => CacheManifest::default(),
        };

        let mut cache = Self {
            root: root.to_path_buf(),
            dir,
            manifest,
            entries: HashMap::new(),
            indexes: HashMap::new(),
        };

        // Pre-load referenced entries; names whose files are gone are
        // dropped from the manifest
        let names = cache.manifest.packages.clone();
        for name in names {
            let entry_path = cache.package_dir(&name).join(ENTRY_NAME);
            match fs::read_to_string(&entry_path).await {
                Ok(content) => match serde_json::from_str::<CacheEntry>(&content) {
                    Ok(entry) => {
                        cache.entries.insert(name.clone(), entry);
                    }
                    Err(e) => debug!("Dropping corrupt cache entry for {}: {}", name, e),
                },
                Err(_) => debug!("Dropping missing cache entry for {}", name),
            }

            let index_path = cache.package_dir(&name).join(INDEX_NAME);
            if let Ok(content) = fs::read_to_string(&index_path).await {
                if let Ok(index) = serde_json::from_str::<FileIndex>(&content) {
                    cache.indexes.insert(name.clone(), index);
                }
            }
        }
        cache
            .manifest
            .packages
            .retain(|name| cache.entries.contains_key(name));

        Ok(cache)
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.dir.join(PACKAGES_DIR).join(name)
    }

    /// The stored entry for a package, if any
    pub fn entry(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    /// Names with on-disk entries, in manifest order
    pub fn cached_packages(&self) -> &[String] {
        &self.manifest.packages
    }

    /// Snapshot of each declared dependency's current input hash, with the
    /// `MISSING` sentinel where no entry exists
    fn dependency_hashes(&self, pkg: &PackageInfo) -> BTreeMap<String, String> {
        pkg.declared_dependencies()
            .into_iter()
            .map(|dep| {
                let hash = self
                    .entries
                    .get(dep)
                    .map(|entry| entry.input_hash.clone())
                    .unwrap_or_else(|| MISSING_HASH.to_string());
                (dep.to_string(), hash)
            })
            .collect()
    }

    /// Recompute the package's input hash, updating its file index as a
    /// side effect.
    pub async fn compute_input_hash(&mut self, pkg: &PackageInfo) -> WsuResult<String> {
        let dep_hashes = self.dependency_hashes(pkg);
        let mut index = self.indexes.remove(&pkg.name).unwrap_or_default();
        let result = hash::compute_input_hash(pkg, &self.root, &mut index, &dep_hashes).await;
        self.indexes.insert(pkg.name.clone(), index);
        result
    }

    /// Whether the stored fingerprint still matches the package's inputs.
    /// Cache IO problems degrade to "not valid" with a warning.
    pub async fn is_valid(&mut self, pkg: &PackageInfo) -> bool {
        if !self.entries.contains_key(&pkg.name) {
            return false;
        }
        match self.compute_input_hash(pkg).await {
            Ok(current) => self
                .entries
                .get(&pkg.name)
                .is_some_and(|entry| entry.input_hash == current),
            Err(e) => {
                warn!("Cache check failed for {}: {}", pkg.name, e);
                false
            }
        }
    }

    /// Record a successful build: recompute the fingerprint, snapshot
    /// dependency hashes, and persist entry + file index atomically.
    pub async fn update(&mut self, pkg: &PackageInfo, build_duration: Duration) -> WsuResult<()> {
        let input_hash = self.compute_input_hash(pkg).await?;
        let entry = CacheEntry {
            input_hash,
            dependency_hashes: self.dependency_hashes(pkg),
            last_build: Utc::now(),
            build_duration: build_duration.as_millis() as u64,
            built_by: format!("wsu@{}", env!("CARGO_PKG_VERSION")),
        };

        let pkg_dir = self.package_dir(&pkg.name);
        fs::create_dir_all(&pkg_dir)
            .await
            .map_err(|e| WsuError::cache_io(format!("creating {}", pkg_dir.display()), e))?;

        write_json_atomic(&pkg_dir.join(ENTRY_NAME), &entry).await?;
        if let Some(index) = self.indexes.get(&pkg.name) {
            write_json_atomic(&pkg_dir.join(INDEX_NAME), index).await?;
        }

        self.entries.insert(pkg.name.clone(), entry);
        if !self.manifest.packages.contains(&pkg.name) {
            self.manifest.packages.push(pkg.name.clone());
        }
        self.persist_manifest().await
    }

    /// Drop one package's entry (its file index stays as a speedup)
    pub async fn invalidate(&mut self, name: &str) -> WsuResult<()> {
        self.remove_entry(name).await?;
        self.persist_manifest().await
    }

    /// Drop the entries of every package that depends on `name`,
    /// transitively.
    pub async fn invalidate_dependents(
        &mut self,
        name: &str,
        graph: &DependencyGraph,
    ) -> WsuResult<()> {
        let downstream = graph.transitive_dependents(name);
        if downstream.is_empty() {
            return Ok(());
        }
        debug!(
            "Invalidating {} dependent(s) of {}",
            downstream.len(),
            name
        );
        for dependent in &downstream {
            self.remove_entry(dependent).await?;
        }
        self.persist_manifest().await
    }

    async fn remove_entry(&mut self, name: &str) -> WsuResult<()> {
        self.entries.remove(name);
        self.manifest.packages.retain(|p| p != name);

        let entry_path = self.package_dir(name).join(ENTRY_NAME);
        match fs::remove_file(&entry_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WsuError::cache_io(
                format!("removing {}", entry_path.display()),
                e,
            )),
        }
    }

    /// Remove every per-package directory and empty the manifest. The
    /// `.wsu/` directory itself is retained.
    pub async fn clear(&mut self) -> WsuResult<usize> {
        let count = self.manifest.packages.len();
        let packages_dir = self.dir.join(PACKAGES_DIR);
        match fs::remove_dir_all(&packages_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(WsuError::cache_io(
                    format!("clearing {}", packages_dir.display()),
                    e,
                ))
            }
        }
        fs::create_dir_all(&packages_dir)
            .await
            .map_err(|e| WsuError::cache_io(format!("creating {}", packages_dir.display()), e))?;

        self.entries.clear();
        self.indexes.clear();
        self.manifest.packages.clear();
        self.persist_manifest().await?;
        Ok(count)
    }

    async fn persist_manifest(&self) -> WsuResult<()> {
        write_json_atomic(&self.dir.join(MANIFEST_NAME), &self.manifest).await
    }
}

/// Write pretty JSON via a temp file + rename for crash safety
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WsuResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => {
            return Err(WsuError::cache_io(
                format!("invalid cache path {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            ))
        }
    };

    fs::write(&tmp, &json)
        .await
        .map_err(|e| WsuError::cache_io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| WsuError::cache_io(format!("renaming to {}", path.display()), e))
}

/// Make sure `.gitignore` at the workspace root covers `.wsu/`; creates
/// the file when absent, appends otherwise, and is idempotent.
async fn ensure_gitignore(root: &Path) -> WsuResult<()> {
    let path = root.join(".gitignore");
    let line = format!("{}/", CACHE_DIR_NAME);

    let existing = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(WsuError::cache_io(format!("reading {}", path.display()), e)),
    };

    let covered = existing
        .lines()
        .map(str::trim)
        .any(|l| l == line || l == CACHE_DIR_NAME);
    if covered {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&line);
    content.push('\n');

    fs::write(&path, content)
        .await
        .map_err(|e| WsuError::cache_io(format!("writing {}", path.display()), e))
}
