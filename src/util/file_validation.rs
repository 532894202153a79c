//! File validation for log sources
//!
//! Validates a path before the store opens it, checking for:
//! - File existence and permissions
//! - Directories passed where a file is expected
//! - Binary content (null bytes near the start)
//!
//! There is no size limit: large files are the reason the prefetching
//! page source exists.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected by [`is_likely_binary`]
const BINARY_SNIFF_LEN: usize = 8192;

/// Errors that can occur when validating a log file for opening
#[derive(Debug, Clone, PartialEq)]
pub enum FileOpenError {
    /// File does not exist
    NotFound,
    /// Permission denied to read file
    PermissionDenied,
    /// Path is a directory, not a file
    IsDirectory,
    /// File appears to be binary (contains null bytes)
    BinaryFile,
    /// Other I/O error
    IoError(String),
}

impl FileOpenError {
    /// Get a user-friendly error message
    pub fn user_message(&self, filename: &str) -> String {
        match self {
            Self::NotFound => format!("Log file not found: {}", filename),
            Self::PermissionDenied => format!("Permission denied: {}", filename),
            Self::IsDirectory => format!("Cannot open directory: {}", filename),
            Self::BinaryFile => format!("Not a text log file: {}", filename),
            Self::IoError(msg) => format!("Error opening {}: {}", filename, msg),
        }
    }

    pub(crate) fn from_io(e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => FileOpenError::NotFound,
            std::io::ErrorKind::PermissionDenied => FileOpenError::PermissionDenied,
            _ => FileOpenError::IoError(e.to_string()),
        }
    }
}

impl std::fmt::Display for FileOpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::IsDirectory => write!(f, "is a directory"),
            Self::BinaryFile => write!(f, "binary file"),
            Self::IoError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FileOpenError {}

/// Validate a log file before the store opens it
///
/// Checks that the path exists, is not a directory, can be opened for
/// reading, and does not look like binary data.
pub fn validate_log_file(path: &Path) -> Result<(), FileOpenError> {
    let metadata = fs::metadata(path).map_err(|e| FileOpenError::from_io(&e))?;

    if metadata.is_dir() {
        return Err(FileOpenError::IsDirectory);
    }

    // Opening catches permission problems that metadata() does not
    let mut file = File::open(path).map_err(|e| FileOpenError::from_io(&e))?;

    if is_likely_binary(&mut file) {
        return Err(FileOpenError::BinaryFile);
    }

    Ok(())
}

/// Check if a reader is likely binary by scanning for null bytes
///
/// Reads the first 8KB and checks for null bytes, which never appear in
/// JSON text. Returns `false` on any read error (the real read will fail
/// later with a better error).
pub fn is_likely_binary<R: Read>(reader: &mut R) -> bool {
    let mut buffer = [0u8; BINARY_SNIFF_LEN];
    let Ok(bytes_read) = reader.read(&mut buffer) else {
        return false;
    };

    buffer[..bytes_read].contains(&0)
}

/// Get the filename from a path for display in error messages
pub fn filename_for_display(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
