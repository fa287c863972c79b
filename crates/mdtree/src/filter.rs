//! Extension filter applied to directory listings

use std::ffi::OsStr;

/// Suffixes shown by default: markdown documents and prompt files.
pub const MARKDOWN_EXTENSIONS: &[&str] = &[".md", ".markdown", ".prompt"];

/// A fixed set of accepted file suffixes, matched case-insensitively.
///
/// Directories always pass so that matching descendants stay reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    /// Build a filter from suffixes given with or without the leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut suffixes: Vec<String> = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
                format!(".{}", ext)
            })
            .filter(|suffix| suffix.len() > 1)
            .collect();
        suffixes.sort();
        suffixes.dedup();
        Self { suffixes }
    }

    pub fn markdown() -> Self {
        Self::new(MARKDOWN_EXTENSIONS)
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Whether a file name ends with one of the accepted suffixes.
    pub fn matches_name(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy().to_lowercase();
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Whether a directory entry should appear in a listing.
    pub fn accepts(&self, name: &OsStr, is_dir: bool) -> bool {
        is_dir || self.matches_name(name)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::markdown()
    }
}
