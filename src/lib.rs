//! logview - paginated viewer for JSON-lines log files
//!
//! This crate provides the page store that loads, pages, sorts and filters
//! structured log files, plus the command layer the `logview` binary drives.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod render;
pub mod store;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use commands::Command;
pub use config::ViewerConfig;
pub use store::{Page, PageRole, PageStore, StoreError};
