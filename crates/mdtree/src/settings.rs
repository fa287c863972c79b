//! Configuration and settings management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub projects: ProjectSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectSettings {
    /// Overrides the default `projects.json` location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_show_icons")]
    pub show_icons: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            show_icons: default_show_icons(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_show_icons() -> bool {
    true
}

impl Settings {
    /// Load settings from a file, or return defaults if file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    /// Projects file to use: the configured override (tilde-expanded) or the
    /// default location.
    pub fn projects_path(&self) -> PathBuf {
        match &self.projects.file {
            Some(file) => PathBuf::from(shellexpand::tilde(&file.to_string_lossy()).to_string()),
            None => crate::projects::ProjectList::default_path(),
        }
    }

    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        config_dir().join("settings.toml")
    }
}

/// `<platform config dir>/mdtree`, or `./mdtree` when none can be determined
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mdtree")
}
