//! Command-line argument parsing for the viewer
//!
//! Supports:
//! - Opening a log file at startup
//! - Overriding the saved paging configuration
//! - Running a fixed list of commands instead of the interactive prompt

use clap::Parser;
use std::path::PathBuf;

use crate::config::ViewerConfig;

/// A paginated viewer for JSON-lines log files
#[derive(Parser, Debug)]
#[command(name = "logview", version, about = "A paginated viewer for JSON-lines log files")]
pub struct CliArgs {
    /// Log file to open
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Records per page
    #[arg(short = 'p', long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Stream files with more records than N instead of loading them
    #[arg(long, value_name = "N")]
    pub large_file_threshold: Option<usize>,

    /// Records per section in partial-load mode
    #[arg(long, value_name = "N")]
    pub section_size: Option<usize>,

    /// Only count the first section of large files
    #[arg(long)]
    pub partial: bool,

    /// Run a command and exit (repeatable, e.g. `-c next -c "sort level"`)
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,
}

/// How the binary should drive the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupMode {
    /// Read commands from stdin until `quit` or EOF
    Interactive,
    /// Run these commands in order, then exit
    Script(Vec<String>),
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// File to load before the first command
    pub path: Option<PathBuf>,
    /// Saved config with command-line overrides applied
    pub viewer: ViewerConfig,
    pub mode: StartupMode,
}

impl CliArgs {
    /// Convert parsed CLI args into startup configuration, layered over `base`
    pub fn into_config(self, base: ViewerConfig) -> Result<StartupConfig, String> {
        let mut viewer = base;

        if let Some(page_size) = self.page_size {
            if page_size == 0 {
                return Err("--page-size must be at least 1".to_string());
            }
            viewer.page_size = page_size;
        }
        if let Some(threshold) = self.large_file_threshold {
            viewer.large_file_threshold = threshold;
        }
        if let Some(section_size) = self.section_size {
            if section_size == 0 {
                return Err("--section-size must be at least 1".to_string());
            }
            viewer.section_size = section_size;
        }
        if self.partial {
            viewer.partial_load = true;
        }

        let mode = if self.commands.is_empty() {
            StartupMode::Interactive
        } else {
            StartupMode::Script(self.commands)
        };

        Ok(StartupConfig {
            path: self.path,
            viewer,
            mode,
        })
    }
}
