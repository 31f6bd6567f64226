//! Reconciliation of client-advertised roots into the allow-list.
//!
//! Clients that support the MCP roots protocol announce the directories the
//! server may work in. Each announced root is resolved to a real directory;
//! the accepted ones replace the session allow-list wholesale. One bad root
//! never aborts the batch, and a batch with no usable root leaves the
//! previous allow-list in place.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::allowed_dirs::AllowedDirectories;
use super::normalize::{expand_home, normalize_path};
use super::path_validator::absolutize;

/// A root announced by the client: a `file://` URI or a bare path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSpecification {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RootSpecification {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Why a root or startup directory was not accepted.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("Invalid root URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Cannot resolve '{path}': {source}")]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },
}

/// A root that was left out of the allow-list.
#[derive(Debug)]
pub struct SkippedRoot {
    pub uri: String,
    pub error: RootError,
}

/// Outcome of one reconciliation batch.
#[derive(Debug, Default)]
pub struct RootsReconciliation {
    /// Accepted directories, in input order.
    pub accepted: Vec<String>,
    /// Roots that were skipped, with the reason.
    pub skipped: Vec<SkippedRoot>,
    /// Whether the allow-list was replaced.
    pub applied: bool,
}

/// Resolve one root to a real, normalized directory path.
pub fn resolve_root_directory(spec: &RootSpecification) -> Result<String, RootError> {
    let path = root_uri_to_path(&spec.uri)?;
    let expanded = expand_home(&path.to_string_lossy());
    let absolute = absolutize(&expanded).map_err(|source| RootError::Unresolvable {
        path: PathBuf::from(&expanded),
        source,
    })?;
    let real = dunce::canonicalize(&absolute).map_err(|source| RootError::Unresolvable {
        path: absolute.clone(),
        source,
    })?;

    let metadata = std::fs::metadata(&real).map_err(|source| RootError::Unresolvable {
        path: real.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(RootError::NotADirectory { path: real });
    }

    Ok(normalize_path(&real.to_string_lossy()))
}

/// Resolve every root, keeping input order and duplicates.
pub fn resolve_root_directories(
    specs: &[RootSpecification],
) -> (Vec<String>, Vec<SkippedRoot>) {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();

    for spec in specs {
        match resolve_root_directory(spec) {
            Ok(dir) => accepted.push(dir),
            Err(error) => skipped.push(SkippedRoot {
                uri: spec.uri.clone(),
                error,
            }),
        }
    }

    (accepted, skipped)
}

/// Resolve `specs` and, if at least one is usable, replace the allow-list.
pub fn reconcile_roots(
    specs: &[RootSpecification],
    allowed: &AllowedDirectories,
) -> RootsReconciliation {
    let (accepted, skipped) = resolve_root_directories(specs);

    for root in &skipped {
        warn!(uri = %root.uri, "Skipping root: {}", root.error);
    }

    if accepted.is_empty() {
        warn!(
            roots = specs.len(),
            "No valid root directories supplied by client; keeping existing allow-list"
        );
        return RootsReconciliation {
            accepted,
            skipped,
            applied: false,
        };
    }

    allowed.replace_all(&accepted);
    info!(
        directories = ?accepted,
        "Allowed directories updated from client roots"
    );

    RootsReconciliation {
        accepted,
        skipped,
        applied: true,
    }
}

/// Resolve the directories given on the command line or in the environment.
///
/// Existing entries are symlink-resolved; missing ones are kept as literal
/// absolute paths so they can be created later.
///
/// # Errors
///
/// [`RootError::NotADirectory`] when an entry exists but is not a directory.
pub fn resolve_startup_directories(dirs: &[PathBuf]) -> Result<Vec<String>, RootError> {
    let mut resolved = Vec::with_capacity(dirs.len());

    for dir in dirs {
        let expanded = expand_home(&dir.to_string_lossy());
        let absolute = absolutize(&expanded).map_err(|source| RootError::Unresolvable {
            path: dir.clone(),
            source,
        })?;

        match dunce::canonicalize(&absolute) {
            Ok(real) => {
                if !real.is_dir() {
                    return Err(RootError::NotADirectory { path: real });
                }
                resolved.push(normalize_path(&real.to_string_lossy()));
            }
            Err(e) => {
                warn!(
                    path = %absolute.display(),
                    "Allowed directory is not accessible yet ({}); keeping it", e
                );
                resolved.push(normalize_path(&absolute.to_string_lossy()));
            }
        }
    }

    Ok(resolved)
}

fn root_uri_to_path(uri: &str) -> Result<PathBuf, RootError> {
    if !uri.starts_with("file://") {
        return Ok(Path::new(uri).to_path_buf());
    }

    let url = Url::parse(uri).map_err(|e| RootError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    url.to_file_path().map_err(|()| RootError::InvalidUri {
        uri: uri.to_string(),
        reason: "not a local file path".to_string(),
    })
}
