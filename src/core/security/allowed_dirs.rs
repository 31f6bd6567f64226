//! The per-session allow-list of directories.

use std::sync::{Arc, PoisonError, RwLock};

use super::normalize::normalize_path;

/// Allow-list of absolute, normalized directory paths.
///
/// Cloning yields another handle to the same list. The list is only ever
/// replaced as a whole; readers get a copy that later replacements cannot
/// change.
#[derive(Debug, Clone, Default)]
pub struct AllowedDirectories {
    inner: Arc<RwLock<Arc<[String]>>>,
}

impl AllowedDirectories {
    /// Create a store seeded with `directories`.
    pub fn new<I, S>(directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::default();
        store.replace_all(directories);
        store
    }

    /// Replace the whole list. The last caller wins; nothing is merged.
    pub fn replace_all<I, S>(&self, directories: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next: Arc<[String]> = directories
            .into_iter()
            .map(|dir| normalize_path(dir.as_ref()))
            .collect();
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// Copy of the current list, in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.current().to_vec()
    }

    /// Whether the list is currently empty.
    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    fn current(&self) -> Arc<[String]> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_normalized() {
        let store = AllowedDirectories::new(["/srv//data/", "'/opt/app'"]);
        assert_eq!(store.snapshot(), vec!["/srv/data", "/opt/app"]);
    }

    #[test]
    fn test_replace_all_does_not_merge() {
        let store = AllowedDirectories::new(["/x"]);
        store.replace_all(["/y"]);
        assert_eq!(store.snapshot(), vec!["/y"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = AllowedDirectories::new(["/x"]);
        let mut copy = store.snapshot();
        copy.push("/evil".to_string());
        assert_eq!(store.snapshot(), vec!["/x"]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = AllowedDirectories::default();
        assert!(store.is_empty());
        let handle = store.clone();
        handle.replace_all(["/shared"]);
        assert_eq!(store.snapshot(), vec!["/shared"]);
    }

    #[test]
    fn test_duplicates_preserved() {
        let store = AllowedDirectories::new(["/a", "/a/"]);
        assert_eq!(store.snapshot(), vec!["/a", "/a"]);
    }
}
