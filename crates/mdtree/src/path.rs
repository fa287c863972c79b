//! Path normalization and the comparison key used for node identity

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, TreeError};

/// Lexically normalize a path into an absolute form.
///
/// Relative inputs are resolved against the current working directory,
/// `.` components are dropped and `..` pops the previous component. The
/// filesystem is never consulted, so symlinks keep their in-tree spelling
/// and paths that do not exist yet normalize just the same.
pub fn normalize<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the filesystem root stays at the root
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            Component::Normal(name) => normalized.push(name),
        }
    }

    Ok(normalized)
}

/// An absolute, normalized path.
///
/// Equality and hashing go through a comparison key that follows the host
/// filesystem's case policy: exact on Unix, ASCII case-folded on Windows.
/// The original spelling is preserved for display and for `as_path`.
#[derive(Clone)]
pub struct NormPath(PathBuf);

impl NormPath {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        normalize(path)
            .map(NormPath)
            .map_err(|source| TreeError::InvalidPath {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Parent directory; `None` at the filesystem root.
    pub fn parent(&self) -> Option<NormPath> {
        self.0.parent().map(|p| NormPath(p.to_path_buf()))
    }

    /// Append a single directory entry name.
    pub(crate) fn join_name(&self, name: &OsStr) -> NormPath {
        NormPath(self.0.join(name))
    }

    /// Base name, or the whole path for a filesystem root like `/`.
    pub fn base_name(&self) -> String {
        match self.0.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.0.display().to_string(),
        }
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn is_within(&self, ancestor: &NormPath) -> bool {
        let key = self.key();
        let ancestor_key = ancestor.key();
        key != ancestor_key && key.starts_with(&*ancestor_key)
    }

    #[cfg(windows)]
    fn key(&self) -> Cow<'_, Path> {
        Cow::Owned(PathBuf::from(self.0.to_string_lossy().to_ascii_lowercase()))
    }

    #[cfg(not(windows))]
    fn key(&self) -> Cow<'_, Path> {
        Cow::Borrowed(&self.0)
    }
}

impl PartialEq for NormPath {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NormPath {}

impl Hash for NormPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for NormPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for NormPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.display(), f)
    }
}

impl AsRef<Path> for NormPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_dots() {
        let normalized = normalize("/a/./b/../c").unwrap();
        assert_eq!(normalized, PathBuf::from("/a/c"));
    }

    #[test]
    fn test_normalize_does_not_climb_above_root() {
        let normalized = normalize("/../../x").unwrap();
        assert_eq!(normalized, PathBuf::from("/x"));
    }

    #[test]
    fn test_normalize_strips_trailing_separator() {
        assert_eq!(normalize("/a/b/").unwrap(), normalize("/a/b").unwrap());
    }

    #[test]
    fn test_relative_path_becomes_absolute() {
        let normalized = normalize("some/dir").unwrap();
        assert!(normalized.is_absolute());
        assert_eq!(normalized, std::env::current_dir().unwrap().join("some/dir"));
    }

    #[test]
    fn test_differently_spelled_paths_are_equal() {
        let a = NormPath::new("/proj/docs/../notes").unwrap();
        let b = NormPath::new("/proj/./notes/").unwrap();
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_is_within_is_component_wise() {
        let root = NormPath::new("/proj").unwrap();
        assert!(NormPath::new("/proj/a.md").unwrap().is_within(&root));
        assert!(NormPath::new("/proj/sub/b.md").unwrap().is_within(&root));
        assert!(!NormPath::new("/project/a.md").unwrap().is_within(&root));
        assert!(!root.is_within(&root));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(NormPath::new("/proj/notes.md").unwrap().base_name(), "notes.md");
        assert_eq!(NormPath::new("/").unwrap().base_name(), "/");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_case_sensitive_on_unix() {
        assert_ne!(
            NormPath::new("/Proj/A.md").unwrap(),
            NormPath::new("/proj/a.md").unwrap()
        );
    }
}
