//! Path normalization shared by the allow-list and every path validation.
//!
//! Produces a canonical string form so that two spellings of the same
//! location compare equal with plain string operations. Normalization is
//! lexical and best-effort: it never touches the filesystem and never fails.
//!
//! # Platform policy
//!
//! The host platform is fixed at compile time. On every host, a path with a
//! drive-letter prefix (`C:`) or a UNC prefix (`\\`) is Windows-style. On
//! Windows hosts a leading-slash path is also Windows-style when it has the
//! Git-Bash drive form `/c/...`, which is rewritten to `C:\...`; WSL paths
//! (`/mnt/c/...`) and any other leading-slash path stay POSIX. On other hosts
//! everything without a drive or UNC prefix is POSIX.

/// Separator convention a path string follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `/`-separated, rooted at `/`.
    Posix,
    /// `\`-separated, rooted at a drive letter or a UNC share.
    Windows,
}

impl PathStyle {
    /// Classify a (raw or normalized) path string.
    pub fn of(path: &str) -> Self {
        if has_drive_prefix(path) || path.starts_with("\\\\") {
            return Self::Windows;
        }
        if !cfg!(windows) {
            return Self::Posix;
        }
        if path.starts_with('/') && !is_git_bash_drive(path) {
            Self::Posix
        } else {
            Self::Windows
        }
    }

    /// The separator used by this style.
    pub fn separator(self) -> char {
        match self {
            Self::Posix => '/',
            Self::Windows => '\\',
        }
    }
}

/// Normalize a path string into its canonical comparable form.
///
/// Strips surrounding quotes and whitespace, collapses duplicate separators,
/// resolves `.` and `..` segments, drops trailing separators and uppercases
/// the drive letter. An empty input normalizes to `/`.
pub fn normalize_path(path: &str) -> String {
    // Removing a trailing separator can expose a quote or blank that the
    // first pass kept, so iterate to a fixed point.
    let mut current = normalize_once(path);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Whether a normalized path is absolute under its own style.
///
/// A bare drive (`C:`) counts as the drive root.
pub fn is_absolute_normalized(path: &str) -> bool {
    match PathStyle::of(path) {
        PathStyle::Posix => path.starts_with('/'),
        PathStyle::Windows => {
            path.starts_with("\\\\")
                || (has_drive_prefix(path) && (path.len() == 2 || path[2..].starts_with('\\')))
        }
    }
}

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// Paths without the shorthand, and every path when no home directory can
/// be determined, are returned unchanged.
pub fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.to_string_lossy(), &path[1..]);
        }
    }
    path.to_string()
}

/// Whether the path starts with `X:` for an ASCII drive letter.
pub(crate) fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn is_git_bash_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && (bytes.len() == 2 || bytes[2] == b'/')
}

fn normalize_once(path: &str) -> String {
    let trimmed = path.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
    if trimmed.is_empty() {
        return "/".to_string();
    }

    match PathStyle::of(trimmed) {
        PathStyle::Posix => normalize_posix(trimmed),
        PathStyle::Windows => normalize_windows(&convert_git_bash_drive(trimmed)),
    }
}

fn convert_git_bash_drive(path: &str) -> String {
    if !is_git_bash_drive(path) {
        return path.to_string();
    }
    let drive = path[1..2].to_ascii_uppercase();
    let rest = &path[2..];
    if rest.is_empty() {
        format!("{drive}:\\")
    } else {
        format!("{drive}:{rest}")
    }
}

fn normalize_posix(path: &str) -> String {
    let absolute = path.starts_with('/');
    let parts = resolve_segments(path.split('/'), absolute, 0);
    let joined = parts.join("/");

    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn normalize_windows(path: &str) -> String {
    let path = path.replace('/', "\\");

    if let Some(rest) = path.strip_prefix("\\\\") {
        // Server and share are never popped by `..`.
        let parts = resolve_segments(rest.split('\\'), true, 2);
        return format!("\\\\{}", parts.join("\\"));
    }

    let (drive, rest) = if has_drive_prefix(&path) {
        (format!("{}:", path[..1].to_ascii_uppercase()), &path[2..])
    } else {
        (String::new(), path.as_str())
    };
    let rooted = rest.starts_with('\\');
    let joined = resolve_segments(rest.split('\\'), rooted, 0).join("\\");

    match (drive.is_empty(), rooted) {
        (false, true) => format!("{drive}\\{joined}"),
        (false, false) => format!("{drive}{joined}"),
        (true, true) => format!("\\{joined}"),
        (true, false) if joined.is_empty() => ".".to_string(),
        (true, false) => joined,
    }
}

/// Resolve `.`/`..` and drop empty segments.
///
/// `floor` segments at the front are pinned; rooted paths discard `..` that
/// would climb above the root, relative paths keep them.
fn resolve_segments<'a>(
    segments: impl Iterator<Item = &'a str>,
    rooted: bool,
    floor: usize,
) -> Vec<&'a str> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.len() > floor && parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts
}
