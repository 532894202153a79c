//! Where logview keeps its own files
//!
//! `config.yaml` and the daily log files under `logs/` share one per-user
//! directory, see [`config_dir`].

use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "logview";
const CONFIG_FILE: &str = "config.yaml";
const LOGS_DIR: &str = "logs";

/// `%APPDATA%\logview` on Windows, otherwise `$XDG_CONFIG_HOME/logview`
/// or `~/.config/logview`
pub fn config_dir() -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        env::var_os("APPDATA").map(PathBuf::from)
    } else {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
    };
    base.map(|dir| dir.join(APP_DIR))
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(LOGS_DIR))
}

/// Create the logs directory for the file log layer, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = logs_dir().ok_or_else(|| "no config directory available".to_string())?;
    fs::create_dir_all(&logs)
        .map_err(|e| format!("failed to create {}: {}", logs.display(), e))?;
    Ok(logs)
}
