use std::io;
use std::path::PathBuf;

use crate::index::NodeHandle;

/// Failures reported by [`crate::TreeIndex`] queries.
///
/// Listing failures are never reported here: an unreadable directory
/// simply has no visible children.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The handle refers to a root that was removed or replaced, or to a
    /// path no active root encloses.
    #[error("unknown node: {0}")]
    UnknownNode(NodeHandle),

    /// The path lies outside every active root.
    #[error("path is outside every root: {}", .0.display())]
    OutOfScope(PathBuf),

    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot normalize {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TreeError>;
