//! Package manifest model
//!
//! `PackageManifest` is the serde view of a member's package.json; unknown
//! fields are preserved so diagnostics can show the manifest as written.
//! `PackageInfo` is the loaded, validated record the rest of the tool works
//! with.

use crate::error::{WsuError, WsuResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Name of the manifest file every member must carry
pub const MANIFEST_FILE: &str = "package.json";

/// Parsed package.json contents
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Everything else in the manifest, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A loaded workspace member
#[derive(Debug, Clone)]
pub struct PackageInfo {
    /// Package name, unique within the workspace
    pub name: String,
    /// Absolute path of the directory containing the manifest
    pub path: PathBuf,
    /// Script name to shell command, as declared
    pub scripts: BTreeMap<String, String>,
    /// Names declared under dependencies
    pub dependencies: BTreeSet<String>,
    /// Names declared under devDependencies
    pub dev_dependencies: BTreeSet<String>,
    /// The full manifest parse, kept for diagnostics
    pub manifest: PackageManifest,
}

impl PackageInfo {
    /// Build a `PackageInfo` from a parsed manifest. Fails when the manifest
    /// has no usable name.
    pub fn from_manifest(path: PathBuf, manifest: PackageManifest) -> WsuResult<Self> {
        let name = match manifest.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(WsuError::ManifestInvalid { path }),
        };

        Ok(Self {
            name,
            scripts: manifest.scripts.clone(),
            dependencies: manifest.dependencies.keys().cloned().collect(),
            dev_dependencies: manifest.dev_dependencies.keys().cloned().collect(),
            path,
            manifest,
        })
    }

    /// Parse a manifest file and build the member record
    pub async fn load(dir: &Path) -> WsuResult<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| WsuError::io(format!("reading {}", manifest_path.display()), e))?;

        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|e| WsuError::ManifestMalformed {
                path: manifest_path.clone(),
                reason: e.to_string(),
            })?;

        Self::from_manifest(dir.to_path_buf(), manifest)
    }

    /// Absolute path of this member's manifest file
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    /// The script command, if present and non-empty
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts
            .get(name)
            .map(String::as_str)
            .filter(|cmd| !cmd.trim().is_empty())
    }

    /// Whether the package declares a runnable script under `name`
    pub fn has_script(&self, name: &str) -> bool {
        self.script(name).is_some()
    }

    /// All declared upstream names: dependencies plus devDependencies
    pub fn declared_dependencies(&self) -> BTreeSet<&str> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .map(String::as_str)
            .collect()
    }
}
