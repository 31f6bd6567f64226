use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::allowed_dirs::AllowedDirectories;
use super::containment::is_path_within_allowed_directories;
use super::normalize::{expand_home, normalize_path};

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    /// The caller handed over something that is not a usable path.
    #[error("Malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: &'static str },

    #[error("Access denied - path outside allowed directories: {path} not in [{}]", join_dirs(.allowed))]
    OutsideAllowedDirectories { path: String, allowed: Vec<String> },

    #[error(
        "Access denied - symlink target outside allowed directories: {path} -> {target} not in [{}]",
        join_dirs(.allowed)
    )]
    SymlinkOutsideAllowedDirectories {
        path: String,
        target: String,
        allowed: Vec<String>,
    },

    #[error(
        "Access denied - parent directory outside allowed directories: {parent} (for {path}) not in [{}]",
        join_dirs(.allowed)
    )]
    ParentOutsideAllowedDirectories {
        path: String,
        parent: String,
        allowed: Vec<String>,
    },

    #[error("Parent directory does not exist: '{parent}' (for {path})")]
    ParentNotFound {
        path: String,
        parent: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot resolve path '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl PathSecurityError {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        Self::MalformedPath {
            path: path.replace('\0', "\\0"),
            reason,
        }
    }

    /// Whether this is a sandbox rejection rather than a lookup failure.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::OutsideAllowedDirectories { .. }
                | Self::SymlinkOutsideAllowedDirectories { .. }
                | Self::ParentOutsideAllowedDirectories { .. }
        )
    }
}

fn join_dirs(dirs: &[String]) -> String {
    dirs.join(", ")
}

/// Validates that a requested path may be used under the current allow-list.
///
/// This function performs the following checks, in order:
/// 1. Expands `~` and resolves the path against the working directory
/// 2. Normalizes it and checks containment before any filesystem access
/// 3. Resolves symlinks and checks containment of the real location
/// 4. For a path that does not exist yet, resolves its parent instead and
///    checks containment of the parent's real location
///
/// The allow-list is read once, so a concurrent replacement does not affect
/// a validation that is already in flight.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The real path, or for a not-yet-existing target the
///   absolute requested path inside a real, allowed parent
/// * `Err(PathSecurityError)` - If validation fails
///
/// # Examples
///
/// ```rust,ignore
/// let allowed = AllowedDirectories::new(["/home/user/project"]);
/// let safe_path = validate_path("/home/user/project/src/main.rs", &allowed)?;
/// ```
pub fn validate_path(
    input_path: &str,
    allowed: &AllowedDirectories,
) -> Result<PathBuf, PathSecurityError> {
    if input_path.is_empty() {
        return Err(PathSecurityError::malformed(input_path, "path is empty"));
    }
    if input_path.contains('\0') {
        return Err(PathSecurityError::malformed(input_path, "path contains a NUL byte"));
    }

    let allowed_dirs = allowed.snapshot();
    let expanded = expand_home(input_path);
    let absolute = absolutize(&expanded).map_err(|source| PathSecurityError::Io {
        path: expanded.clone(),
        source,
    })?;
    let requested = normalize_path(&absolute.to_string_lossy());

    if !is_path_within_allowed_directories(&requested, &allowed_dirs)? {
        return Err(PathSecurityError::OutsideAllowedDirectories {
            path: requested,
            allowed: allowed_dirs,
        });
    }

    // The normalized form only decides containment; the filesystem sees the
    // name as given, quotes and trailing blanks included.
    let literal = resolve_dot_segments(&absolute);
    match dunce::canonicalize(&literal) {
        Ok(real) => {
            let target = normalize_path(&real.to_string_lossy());
            if !is_path_within_allowed_directories(&target, &allowed_dirs)? {
                return Err(PathSecurityError::SymlinkOutsideAllowedDirectories {
                    path: requested,
                    target,
                    allowed: allowed_dirs,
                });
            }
            debug!(path = %requested, real = %target, "Path validated");
            Ok(real)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            validate_new_entry(requested, literal, allowed_dirs)
        }
        Err(source) => Err(PathSecurityError::Io {
            path: requested,
            source,
        }),
    }
}

/// Validation tail for a path that does not resolve yet.
fn validate_new_entry(
    requested: String,
    absolute: PathBuf,
    allowed_dirs: Vec<String>,
) -> Result<PathBuf, PathSecurityError> {
    let Some(parent) = absolute.parent() else {
        return Err(PathSecurityError::Io {
            path: requested,
            source: io::Error::new(io::ErrorKind::NotFound, "path has no parent directory"),
        });
    };

    let real_parent = match dunce::canonicalize(parent) {
        Ok(p) => p,
        Err(source) => {
            return Err(PathSecurityError::ParentNotFound {
                path: requested,
                parent: parent.to_string_lossy().to_string(),
                source,
            });
        }
    };

    let parent_str = normalize_path(&real_parent.to_string_lossy());
    if !is_path_within_allowed_directories(&parent_str, &allowed_dirs)? {
        return Err(PathSecurityError::ParentOutsideAllowedDirectories {
            path: requested,
            parent: parent_str,
            allowed: allowed_dirs,
        });
    }

    // A dangling symlink also fails to resolve; its target must still stay inside.
    if let Some(target) = dangling_link_target(&absolute, &real_parent) {
        let target = normalize_path(&target.to_string_lossy());
        if !is_path_within_allowed_directories(&target, &allowed_dirs)? {
            return Err(PathSecurityError::SymlinkOutsideAllowedDirectories {
                path: requested,
                target,
                allowed: allowed_dirs,
            });
        }
    }

    debug!(path = %requested, parent = %parent_str, "New path validated");
    Ok(absolute)
}

fn dangling_link_target(path: &Path, real_parent: &Path) -> Option<PathBuf> {
    let meta = fs::symlink_metadata(path).ok()?;
    if !meta.file_type().is_symlink() {
        return None;
    }
    let target = fs::read_link(path).ok()?;
    Some(if target.is_absolute() {
        target
    } else {
        real_parent.join(target)
    })
}

/// Resolve `.` and `..` lexically, leaving every other segment untouched.
fn resolve_dot_segments(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

/// Resolve a path against the process working directory.
pub(crate) fn absolutize(path: &str) -> io::Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
