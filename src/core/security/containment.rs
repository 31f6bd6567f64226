//! Containment predicate: is a path at or beneath an allowed directory?

use super::normalize::{PathStyle, has_drive_prefix, is_absolute_normalized, normalize_path};
use super::path_validator::PathSecurityError;

/// Check whether `candidate` lies at or beneath any directory in `allowed`.
///
/// Both sides are normalized before comparison. Matching requires a full
/// path segment: `/a/b` contains `/a/b/c` but not `/a/bc`.
///
/// # Errors
///
/// [`PathSecurityError::MalformedPath`] when the candidate is empty, contains
/// a NUL byte or is not absolute after normalization, or when an allowed
/// entry is not absolute. Empty or NUL-containing allowed entries never
/// match.
pub fn is_path_within_allowed_directories(
    candidate: &str,
    allowed: &[String],
) -> Result<bool, PathSecurityError> {
    if candidate.is_empty() {
        return Err(PathSecurityError::malformed(candidate, "path is empty"));
    }
    if candidate.contains('\0') {
        return Err(PathSecurityError::malformed(candidate, "path contains a NUL byte"));
    }

    let candidate = normalize_path(candidate);
    if !is_absolute_normalized(&candidate) {
        return Err(PathSecurityError::malformed(
            &candidate,
            "path is not absolute after normalization",
        ));
    }

    for dir in allowed {
        if dir.is_empty() || dir.contains('\0') {
            continue;
        }
        let dir = normalize_path(dir);
        if !is_absolute_normalized(&dir) {
            return Err(PathSecurityError::malformed(
                &dir,
                "allowed directory is not absolute after normalization",
            ));
        }
        if directory_contains(&dir, &candidate) {
            return Ok(true);
        }
    }

    Ok(false)
}

fn directory_contains(dir: &str, candidate: &str) -> bool {
    if candidate == dir {
        return true;
    }

    let style = PathStyle::of(dir);
    let separator = style.separator();

    if style == PathStyle::Posix && dir == "/" {
        return candidate.starts_with('/');
    }

    if style == PathStyle::Windows && is_drive_root(dir) {
        return has_drive_prefix(candidate)
            && candidate[..1].eq_ignore_ascii_case(&dir[..1])
            && candidate[2..].starts_with('\\');
    }

    candidate
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with(separator))
}

fn is_drive_root(dir: &str) -> bool {
    has_drive_prefix(dir) && (dir.len() == 2 || &dir[2..] == "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reflexive() {
        let allowed = dirs(&["/a/b", "/srv"]);
        for dir in &allowed {
            assert!(is_path_within_allowed_directories(dir, &allowed).unwrap());
        }
    }

    #[test]
    fn test_sibling_prefix_does_not_match() {
        let allowed = dirs(&["/a/b"]);
        assert!(!is_path_within_allowed_directories("/a/bc", &allowed).unwrap());
        assert!(!is_path_within_allowed_directories("/home/user-evil", &dirs(&["/home/user"])).unwrap());
    }

    #[test]
    fn test_separator_boundary_matches() {
        let allowed = dirs(&["/a/b"]);
        assert!(is_path_within_allowed_directories("/a/b/c", &allowed).unwrap());
        assert!(is_path_within_allowed_directories("/a/b/c/d.txt", &allowed).unwrap());
    }

    #[test]
    fn test_parent_is_not_contained() {
        let allowed = dirs(&["/a/b"]);
        assert!(!is_path_within_allowed_directories("/a", &allowed).unwrap());
    }

    #[test]
    fn test_root_allows_everything() {
        let allowed = dirs(&["/"]);
        assert!(is_path_within_allowed_directories("/etc/passwd", &allowed).unwrap());
        assert!(is_path_within_allowed_directories("/", &allowed).unwrap());
    }

    #[test]
    fn test_candidate_is_normalized() {
        let allowed = dirs(&["/a/b/"]);
        assert!(is_path_within_allowed_directories("/a//b/./c/", &allowed).unwrap());
        assert!(!is_path_within_allowed_directories("/a/b/../c", &allowed).unwrap());
    }

    #[test]
    fn test_empty_allow_list_contains_nothing() {
        assert!(!is_path_within_allowed_directories("/a", &[]).unwrap());
    }

    #[test]
    fn test_malformed_candidates_are_errors() {
        let allowed = dirs(&["/a"]);
        for bad in ["", "/a/\0b", "relative/path"] {
            let err = is_path_within_allowed_directories(bad, &allowed).unwrap_err();
            assert!(matches!(err, PathSecurityError::MalformedPath { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_relative_allowed_entry_is_error() {
        let err = is_path_within_allowed_directories("/a", &dirs(&["rel"])).unwrap_err();
        assert!(matches!(err, PathSecurityError::MalformedPath { .. }));
    }

    #[test]
    fn test_unusable_allowed_entries_are_skipped() {
        let allowed = dirs(&["", "/x\0y", "/ok"]);
        assert!(is_path_within_allowed_directories("/ok/file", &allowed).unwrap());
        assert!(!is_path_within_allowed_directories("/x", &allowed).unwrap());
    }

    #[test]
    fn test_windows_drive_root() {
        let allowed = dirs(&["C:\\"]);
        assert!(is_path_within_allowed_directories("c:\\Users\\me", &allowed).unwrap());
        assert!(!is_path_within_allowed_directories("D:\\Users", &allowed).unwrap());

        let bare = dirs(&["C:"]);
        assert!(is_path_within_allowed_directories("C:\\temp", &bare).unwrap());
    }

    #[test]
    fn test_windows_sibling_prefix_does_not_match() {
        let allowed = dirs(&["C:\\work"]);
        assert!(is_path_within_allowed_directories("C:/work/src", &allowed).unwrap());
        assert!(!is_path_within_allowed_directories("C:\\workspace", &allowed).unwrap());
    }
}
