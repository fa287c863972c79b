//! Virtual multi-root file tree.
//!
//! Presents several independent project directories, each with its own
//! display name, as one lazily populated tree of markdown documents:
//! - [`TreeIndex`] resolves handles, lists children and walks to parents
//! - [`ExtensionFilter`] decides which files are visible
//! - [`ProjectList`] persists the `{name, path}` project list
//! - [`Settings`] holds the command-line tool's configuration

pub mod error;
pub mod filter;
pub mod index;
pub mod logging;
pub mod path;
pub mod projects;
pub mod settings;

pub use error::{Result, TreeError};
pub use filter::{ExtensionFilter, MARKDOWN_EXTENSIONS};
pub use index::{NodeHandle, RootEntry, TreeIndex};
pub use path::NormPath;
pub use projects::{Project, ProjectList};
pub use settings::Settings;
