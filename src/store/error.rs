//! Error taxonomy for the log store

use super::record::ParseError;
use crate::util::FileOpenError;

/// Errors surfaced by the page store and its page sources
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The source path is missing, unreadable, a directory, or binary
    FileAccess(FileOpenError),
    /// A line of the source file is not a JSON object
    MalformedRecord(ParseError),
    /// Reading the source failed after it was opened
    Io(String),
    /// The operation needs the full resident record set
    Unsupported { operation: &'static str },
    /// No file has been loaded yet
    NotLoaded,
    /// Asked for a section past the end of the file (zero-based index)
    NoSuchSection { index: usize, available: usize },
    /// A background task panicked
    Background(String),
}

impl StoreError {
    pub(crate) fn io(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }

    /// Whether the loaded source can no longer be trusted after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FileAccess(_) | Self::MalformedRecord(_) | Self::Io(_) | Self::Background(_)
        )
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileAccess(e) => write!(f, "cannot open log file: {}", e),
            Self::MalformedRecord(e) => write!(f, "{}", e),
            Self::Io(msg) => write!(f, "read error: {}", msg),
            Self::Unsupported { operation } => {
                write!(f, "{} is not available in large-file mode", operation)
            }
            Self::NotLoaded => write!(f, "no log file loaded"),
            Self::NoSuchSection { index, available } => write!(
                f,
                "section {} does not exist (file has {})",
                index + 1,
                available
            ),
            Self::Background(msg) => write!(f, "background task failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileAccess(e) => Some(e),
            Self::MalformedRecord(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FileOpenError> for StoreError {
    fn from(e: FileOpenError) -> Self {
        StoreError::FileAccess(e)
    }
}

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        StoreError::MalformedRecord(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported() {
        let err = StoreError::Unsupported { operation: "filter" };
        assert_eq!(err.to_string(), "filter is not available in large-file mode");
    }

    #[test]
    fn test_display_malformed_includes_line() {
        let err: StoreError = ParseError {
            message: "expected value".to_string(),
            line: Some(7),
        }
        .into();
        assert_eq!(err.to_string(), "malformed record at line 7: expected value");
    }

    #[test]
    fn test_is_fatal() {
        assert!(StoreError::Io("boom".to_string()).is_fatal());
        assert!(StoreError::Background("panicked".to_string()).is_fatal());
        assert!(!StoreError::NotLoaded.is_fatal());
        assert!(!StoreError::Unsupported { operation: "sort" }.is_fatal());
        assert!(!StoreError::NoSuchSection { index: 3, available: 2 }.is_fatal());
    }

    #[test]
    fn test_display_no_such_section_is_one_based() {
        let err = StoreError::NoSuchSection { index: 3, available: 2 };
        assert_eq!(err.to_string(), "section 4 does not exist (file has 2)");
    }
}
