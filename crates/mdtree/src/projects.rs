//! Saved project list (`projects.json`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::index::RootEntry;
use crate::settings::config_dir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
}

impl Default for ProjectList {
    fn default() -> Self {
        Self {
            projects: vec![Project {
                name: "Documents".to_string(),
                path: shellexpand::tilde("~/Documents").to_string(),
            }],
        }
    }
}

impl ProjectList {
    /// Load the project list.
    ///
    /// A missing file or one that is not JSON is replaced by the default
    /// list. A JSON file of the wrong shape is left untouched and yields an
    /// empty list; entries that are not `{name, path}` records are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no projects file, writing defaults");
                return Self::write_default(path);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read projects from {}", path.display()))
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "projects file is not JSON, writing defaults");
                return Self::write_default(path);
            }
        };

        let Some(entries) = value.get("projects").and_then(|p| p.as_array()) else {
            warn!(path = %path.display(), "projects file has no project list, ignoring it");
            return Ok(Self { projects: Vec::new() });
        };

        let projects = entries
            .iter()
            .filter_map(|entry| match Project::deserialize(entry) {
                Ok(project) => Some(project),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping malformed project entry");
                    None
                }
            })
            .collect();

        Ok(Self { projects })
    }

    fn write_default(path: &Path) -> Result<Self> {
        let list = Self::default();
        list.save(path)?;
        Ok(list)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize projects")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write projects to {}", path.display()))?;

        Ok(())
    }

    /// Append a project. The path is stored tilde-expanded and normalized.
    pub fn add<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        let path = path.as_ref();
        let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
        let normalized = crate::path::normalize(&expanded)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;

        self.projects.push(Project {
            name: name.to_string(),
            path: normalized.display().to_string(),
        });
        Ok(())
    }

    /// Remove every project named `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.projects.len();
        self.projects.retain(|project| project.name != name);
        before - self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Root entries for [`crate::TreeIndex::load_roots`], in file order.
    pub fn root_entries(&self) -> Vec<RootEntry> {
        self.projects
            .iter()
            .map(|project| {
                let path = PathBuf::from(shellexpand::tilde(&project.path).to_string());
                RootEntry::new(path, project.name.clone())
            })
            .collect()
    }

    /// `<config dir>/mdtree/projects.json`
    pub fn default_path() -> PathBuf {
        config_dir().join("projects.json")
    }
}
