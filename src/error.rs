//! Error types for wsu
//!
//! All modules use `WsuResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wsu operations
pub type WsuResult<T> = Result<T, WsuError>;

/// All errors that can occur in wsu
#[derive(Error, Debug)]
pub enum WsuError {
    // Workspace detection errors
    #[error("No workspace detected from {0}")]
    WorkspaceNotDetected(PathBuf),

    #[error("Workspace configuration invalid at {path}: {reason}")]
    WorkspaceConfigInvalid { path: PathBuf, reason: String },

    // Manifest errors
    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestMalformed { path: PathBuf, reason: String },

    #[error("Manifest {path} has no package name")]
    ManifestInvalid { path: PathBuf },

    #[error("Duplicate package name '{name}' at {first} and {second}")]
    DuplicatePackageName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    // Graph errors
    #[error("Dependency cycle detected:\n{}", format_cycles(.cycles))]
    DependencyCycle { cycles: Vec<Vec<String>> },

    // Target selection errors
    #[error("No packages to run: {0}")]
    NoTarget(String),

    #[error("Invalid filter pattern '{pattern}': {reason}")]
    FilterInvalid { pattern: String, reason: String },

    // Cache errors
    #[error("Cache IO error: {context}")]
    CacheIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            let mut names = cycle.clone();
            if let Some(first) = cycle.first() {
                names.push(first.clone());
            }
            format!("  {}", names.join(" -> "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl WsuError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache IO error with context
    pub fn cache_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::CacheIo {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::WorkspaceNotDetected(_) => Some(
                "Run wsu inside a workspace: a package.json with a \"workspaces\" field, \
                 or a directory with pnpm-workspace.yaml",
            ),
            Self::DependencyCycle { .. } => {
                Some("Break the cycle by removing one of the listed dependency edges")
            }
            Self::NoTarget(_) => Some("Check the --filter pattern and package scripts"),
            _ => None,
        }
    }
}
