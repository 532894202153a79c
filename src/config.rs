//! Viewer configuration persistence
//!
//! Stores paging preferences in `~/.config/logview/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page length used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Viewer configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Files with more records than this are streamed through the
    /// prefetch cache instead of being held in memory
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: usize,

    /// Records per section when `partial_load` is on
    #[serde(default = "default_section_size")]
    pub section_size: usize,

    /// Stop counting large files after one section and report that as the
    /// total. Faster to open, but the last page is the end of the section.
    #[serde(default)]
    pub partial_load: bool,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_large_file_threshold() -> usize {
    50_000
}

fn default_section_size() -> usize {
    10_000
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            large_file_threshold: default_large_file_threshold(),
            section_size: default_section_size(),
            partial_load: false,
        }
    }
}

impl ViewerConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load config from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<ViewerConfig>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config.sanitized()
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to `path`
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Replace zero sizes, which would make paging meaningless
    pub fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            tracing::warn!("page_size of 0 in config, using {}", DEFAULT_PAGE_SIZE);
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.section_size == 0 {
            self.section_size = default_section_size();
        }
        self
    }
}
