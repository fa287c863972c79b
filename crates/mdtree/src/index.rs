//! Unified tree over a set of independent project directories
//!
//! A [`TreeIndex`] owns an ordered list of roots, each with its own display
//! name, and derives everything below them from the live filesystem on every
//! query. Nothing under a root is cached, so there is nothing to go stale;
//! the only state is the root list itself, which is replaced wholesale.

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, TreeError};
use crate::filter::ExtensionFilter;
use crate::path::NormPath;

/// A project directory as handed to [`TreeIndex::load_roots`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub path: PathBuf,
    pub display_name: String,
}

impl RootEntry {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }
}

/// Stable identity of one position in the tree.
///
/// Equality is logical: roots compare by row and path, entries by their
/// normalized path. Two queries for the same position always produce equal
/// handles, so consumers can key expand/selection state on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeHandle {
    Root { row: usize, path: NormPath },
    Entry(NormPath),
}

impl NodeHandle {
    pub fn is_root(&self) -> bool {
        matches!(self, NodeHandle::Root { .. })
    }

    /// Normalized path this handle was issued for.
    ///
    /// Unlike [`TreeIndex::resolve_path`] this does not check that the
    /// handle is still live.
    pub fn path(&self) -> &Path {
        self.norm_path().as_path()
    }

    fn norm_path(&self) -> &NormPath {
        match self {
            NodeHandle::Root { path, .. } => path,
            NodeHandle::Entry(path) => path,
        }
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeHandle::Root { row, path } => write!(f, "root #{} ({})", row, path),
            NodeHandle::Entry(path) => write!(f, "{}", path),
        }
    }
}

#[derive(Debug, Clone)]
struct Root {
    path: NormPath,
    display_name: String,
}

/// The active root list plus a path -> row lookup.
#[derive(Debug, Default)]
struct RootSet {
    roots: Vec<Root>,
    rows_by_path: HashMap<NormPath, usize>,
    generation: u64,
}

impl RootSet {
    fn from_roots(roots: Vec<Root>, generation: u64) -> Self {
        let rows_by_path = roots
            .iter()
            .enumerate()
            .map(|(row, root)| (root.path.clone(), row))
            .collect();
        Self {
            roots,
            rows_by_path,
            generation,
        }
    }

    /// Normalize, drop missing paths and de-duplicate keeping the first
    /// occurrence.
    fn build<I>(entries: I) -> Vec<Root>
    where
        I: IntoIterator<Item = RootEntry>,
    {
        let mut roots: Vec<Root> = Vec::new();
        for entry in entries {
            let path = match NormPath::new(&entry.path) {
                Ok(path) => path,
                Err(err) => {
                    debug!(path = %entry.path.display(), error = %err, "dropping root");
                    continue;
                }
            };
            if !path.as_path().exists() {
                debug!(path = %path, name = %entry.display_name, "dropping missing root");
                continue;
            }
            if roots.iter().any(|root| root.path == path) {
                debug!(path = %path, name = %entry.display_name, "dropping duplicate root");
                continue;
            }
            roots.push(Root {
                path,
                display_name: entry.display_name,
            });
        }
        roots
    }

    fn handle(&self, row: usize) -> NodeHandle {
        NodeHandle::Root {
            row,
            path: self.roots[row].path.clone(),
        }
    }

    fn row_of_path(&self, path: &NormPath) -> Option<usize> {
        self.rows_by_path.get(path).copied()
    }

    /// True when some root lies strictly above `path`.
    fn encloses(&self, path: &NormPath) -> bool {
        self.roots.iter().any(|root| path.is_within(&root.path))
    }

    fn is_live(&self, node: &NodeHandle) -> bool {
        match node {
            NodeHandle::Root { row, path } => {
                self.roots.get(*row).is_some_and(|root| &root.path == path)
            }
            NodeHandle::Entry(path) => self.encloses(path),
        }
    }

    fn ensure_live(&self, node: &NodeHandle) -> Result<()> {
        if self.is_live(node) {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(node.clone()))
        }
    }
}

/// Lazily populated tree over several independent root directories.
///
/// Queries take a read lock on the root list; `load_roots` and
/// `set_single_root` replace it under the write lock, so readers always see
/// either the old or the new list in full. Filesystem reads happen after the
/// lock is released.
#[derive(Debug, Default)]
pub struct TreeIndex {
    roots: RwLock<RootSet>,
    filter: ExtensionFilter,
}

impl TreeIndex {
    /// Empty index showing markdown files.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: ExtensionFilter) -> Self {
        Self {
            roots: RwLock::new(RootSet::default()),
            filter,
        }
    }

    pub fn with_roots<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = RootEntry>,
    {
        let index = Self::new();
        index.load_roots(entries);
        index
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    /// Replace the whole root set.
    ///
    /// Entries whose path does not exist are dropped, and entries that
    /// normalize to an already-seen path are skipped. Every handle issued
    /// for a root that is not kept at the same row becomes unknown.
    pub fn load_roots<I>(&self, entries: I)
    where
        I: IntoIterator<Item = RootEntry>,
    {
        let roots = RootSet::build(entries);
        let mut set = self.roots.write();
        let generation = set.generation + 1;
        info!(roots = roots.len(), generation, "loaded roots");
        *set = RootSet::from_roots(roots, generation);
    }

    /// Show exactly one root, named after its directory.
    ///
    /// If `path` already is the sole root nothing is reset and the existing
    /// root handle is returned, leaving the generation untouched.
    pub fn set_single_root<P: AsRef<Path>>(&self, path: P) -> Result<NodeHandle> {
        let path = NormPath::new(path)?;
        if !path.as_path().exists() {
            return Err(TreeError::NotFound(path.into_path_buf()));
        }

        let set = self.roots.upgradable_read();
        if set.roots.len() == 1 && set.roots[0].path == path {
            return Ok(set.handle(0));
        }

        let mut set = RwLockUpgradableReadGuard::upgrade(set);
        let generation = set.generation + 1;
        let root = Root {
            display_name: path.base_name(),
            path,
        };
        info!(path = %root.path, generation, "switched to single root");
        *set = RootSet::from_roots(vec![root], generation);
        Ok(set.handle(0))
    }

    /// Bumped on every root-set replacement.
    pub fn generation(&self) -> u64 {
        self.roots.read().generation
    }

    pub fn root_count(&self) -> usize {
        self.roots.read().roots.len()
    }

    /// Handles for the active roots, in row order.
    pub fn roots(&self) -> Vec<NodeHandle> {
        let set = self.roots.read();
        (0..set.roots.len()).map(|row| set.handle(row)).collect()
    }

    /// Path of the first root, if any.
    pub fn root_path(&self) -> Option<PathBuf> {
        self.roots
            .read()
            .roots
            .first()
            .map(|root| root.path.as_path().to_path_buf())
    }

    /// Immediate visible children of a root or directory.
    ///
    /// Directories come first, then files, each group ordered by name. A
    /// file, a vanished directory or an unreadable one has no children.
    pub fn children_of(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.roots.read().ensure_live(node)?;
        Ok(self.list_dir(node.norm_path()))
    }

    /// Parent of a node; `None` for roots.
    ///
    /// An entry whose directory is itself a root resolves to that root, so
    /// with nested roots the closest enclosing one wins.
    pub fn parent_of(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        let set = self.roots.read();
        match node {
            NodeHandle::Root { .. } => {
                set.ensure_live(node)?;
                Ok(None)
            }
            NodeHandle::Entry(path) => {
                let parent = match path.parent() {
                    Some(parent) if set.encloses(path) => parent,
                    _ => return Err(TreeError::OutOfScope(path.as_path().to_path_buf())),
                };
                match set.row_of_path(&parent) {
                    Some(row) => Ok(Some(set.handle(row))),
                    None => Ok(Some(NodeHandle::Entry(parent))),
                }
            }
        }
    }

    /// Root display name, or the entry's base name.
    pub fn display_name(&self, node: &NodeHandle) -> Result<String> {
        let set = self.roots.read();
        set.ensure_live(node)?;
        Ok(match node {
            NodeHandle::Root { row, .. } => set.roots[*row].display_name.clone(),
            NodeHandle::Entry(path) => path.base_name(),
        })
    }

    pub fn resolve_path(&self, node: &NodeHandle) -> Result<PathBuf> {
        self.roots.read().ensure_live(node)?;
        Ok(node.path().to_path_buf())
    }

    /// Whether the node is a directory right now. Not cached.
    pub fn is_directory(&self, node: &NodeHandle) -> Result<bool> {
        self.roots.read().ensure_live(node)?;
        Ok(fs::metadata(node.path())
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    /// Number of rows under `parent`; `None` is the top level of roots.
    pub fn row_count(&self, parent: Option<&NodeHandle>) -> Result<usize> {
        match parent {
            None => Ok(self.root_count()),
            Some(node) => Ok(self.children_of(node)?.len()),
        }
    }

    /// Resolve a (row, parent) coordinate. Rows past the end yield `None`.
    pub fn child_at(&self, parent: Option<&NodeHandle>, row: usize) -> Result<Option<NodeHandle>> {
        match parent {
            None => {
                let set = self.roots.read();
                Ok((row < set.roots.len()).then(|| set.handle(row)))
            }
            Some(node) => Ok(self.children_of(node)?.into_iter().nth(row)),
        }
    }

    /// Row of a node within its parent, the inverse of [`Self::child_at`].
    pub fn row_of(&self, node: &NodeHandle) -> Result<usize> {
        match node {
            NodeHandle::Root { row, .. } => {
                self.roots.read().ensure_live(node)?;
                Ok(*row)
            }
            NodeHandle::Entry(_) => {
                let parent = self
                    .parent_of(node)?
                    .ok_or_else(|| TreeError::UnknownNode(node.clone()))?;
                self.children_of(&parent)?
                    .iter()
                    .position(|child| child == node)
                    .ok_or_else(|| TreeError::UnknownNode(node.clone()))
            }
        }
    }

    /// Handle for an arbitrary path inside one of the roots.
    pub fn handle_for_path<P: AsRef<Path>>(&self, path: P) -> Result<NodeHandle> {
        let path = NormPath::new(path)?;
        let set = self.roots.read();
        if let Some(row) = set.row_of_path(&path) {
            return Ok(set.handle(row));
        }
        if set.encloses(&path) {
            return Ok(NodeHandle::Entry(path));
        }
        Err(TreeError::OutOfScope(path.into_path_buf()))
    }

    fn list_dir(&self, dir: &NormPath) -> Vec<NodeHandle> {
        let read_dir = match fs::read_dir(dir.as_path()) {
            Ok(rd) => rd,
            Err(err) => {
                debug!(path = %dir, error = %err, "listing failed, showing no children");
                return Vec::new();
            }
        };

        let mut entries: Vec<(bool, OsString)> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let is_dir = entry_is_dir(&entry);
                let name = entry.file_name();
                self.filter.accepts(&name, is_dir).then_some((is_dir, name))
            })
            .collect();
        entries.sort_by(compare_entries);

        entries
            .into_iter()
            .map(|(_, name)| NodeHandle::Entry(dir.join_name(&name)))
            .collect()
    }
}

/// Follows symlinks so a link to a directory is listed as one.
fn entry_is_dir(entry: &fs::DirEntry) -> bool {
    match entry.file_type() {
        Ok(file_type) if file_type.is_symlink() => fs::metadata(entry.path())
            .map(|meta| meta.is_dir())
            .unwrap_or(false),
        Ok(file_type) => file_type.is_dir(),
        Err(_) => false,
    }
}

/// Directories first, then case-insensitive name, then exact name.
fn compare_entries(a: &(bool, OsString), b: &(bool, OsString)) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| {
            let a_name = a.1.to_string_lossy().to_lowercase();
            let b_name = b.1.to_string_lossy().to_lowercase();
            a_name.cmp(&b_name)
        })
        .then_with(|| a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("b.md"), "# b").unwrap();
        fs::write(root.join("A.md"), "# A").unwrap();
        fs::write(root.join("notes.txt"), "skip").unwrap();
        fs::create_dir(root.join("zdir")).unwrap();
        fs::create_dir(root.join("adir")).unwrap();
        temp_dir
    }

    fn names(index: &TreeIndex, nodes: &[NodeHandle]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| index.display_name(node).unwrap())
            .collect()
    }

    #[test]
    fn test_children_sorted_dirs_first() {
        let temp_dir = fixture();
        let index = TreeIndex::with_roots([RootEntry::new(temp_dir.path(), "Docs")]);
        let root = index.roots().remove(0);

        let children = index.children_of(&root).unwrap();
        assert_eq!(names(&index, &children), vec!["adir", "zdir", "A.md", "b.md"]);
    }

    #[test]
    fn test_compare_entries_breaks_ties_on_exact_name() {
        let mut entries = vec![
            (false, OsString::from("readme.md")),
            (false, OsString::from("README.md")),
            (true, OsString::from("zz")),
        ];
        entries.sort_by(compare_entries);
        assert_eq!(entries[0].1, OsString::from("zz"));
        assert_eq!(entries[1].1, OsString::from("README.md"));
        assert_eq!(entries[2].1, OsString::from("readme.md"));
    }

    #[test]
    fn test_file_has_no_children() {
        let temp_dir = fixture();
        let index = TreeIndex::with_roots([RootEntry::new(temp_dir.path(), "Docs")]);
        let file = index.handle_for_path(temp_dir.path().join("b.md")).unwrap();

        assert!(index.children_of(&file).unwrap().is_empty());
        assert!(!index.is_directory(&file).unwrap());
    }

    #[test]
    fn test_root_display_name_and_path() {
        let temp_dir = fixture();
        let index = TreeIndex::with_roots([RootEntry::new(temp_dir.path(), "My Docs")]);
        let root = index.roots().remove(0);

        assert_eq!(index.display_name(&root).unwrap(), "My Docs");
        assert_eq!(
            index.resolve_path(&root).unwrap(),
            crate::path::normalize(temp_dir.path()).unwrap()
        );
        assert!(index.is_directory(&root).unwrap());
        assert_eq!(index.parent_of(&root).unwrap(), None);
    }

    #[test]
    fn test_generation_bumps_on_replacement() {
        let temp_dir = fixture();
        let index = TreeIndex::new();
        assert_eq!(index.generation(), 0);

        index.load_roots([RootEntry::new(temp_dir.path(), "Docs")]);
        assert_eq!(index.generation(), 1);

        index.set_single_root(temp_dir.path().join("adir")).unwrap();
        assert_eq!(index.generation(), 2);
        assert_eq!(
            index.root_path(),
            Some(crate::path::normalize(temp_dir.path().join("adir")).unwrap())
        );

        index.set_single_root(temp_dir.path().join("adir")).unwrap();
        assert_eq!(index.generation(), 2);
    }

    #[test]
    fn test_missing_and_duplicate_roots_dropped() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        let index = TreeIndex::with_roots([
            RootEntry::new(root.join("missing"), "Gone"),
            RootEntry::new(root, "First"),
            RootEntry::new(root.join("adir").join(".."), "Second"),
            RootEntry::new(root.join("adir"), "A"),
        ]);

        let roots = index.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(names(&index, &roots), vec!["First", "A"]);
    }

    #[test]
    fn test_custom_filter_is_used_for_listings() {
        let temp_dir = fixture();
        let index = TreeIndex::with_filter(ExtensionFilter::new(["txt"]));
        assert_eq!(index.filter().suffixes(), &[".txt".to_string()]);

        index.load_roots([RootEntry::new(temp_dir.path(), "Docs")]);
        let root = index.roots().remove(0);
        let children = index.children_of(&root).unwrap();
        assert_eq!(names(&index, &children), vec!["adir", "zdir", "notes.txt"]);
    }

    #[test]
    fn test_set_single_root_missing_path() {
        let temp_dir = fixture();
        let index = TreeIndex::new();
        let err = index
            .set_single_root(temp_dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, TreeError::NotFound(_)));
        assert_eq!(index.root_count(), 0);
    }
}
