//! Error types for comparison runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Which input of the differ an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum MergeSide {
    /// The first input (target / reference side).
    A,
    /// The second input (source side).
    B,
}

/// Errors that can occur while comparing.
#[derive(Debug, Error)]
pub enum CompareError {
    /// An input of the differ was not sorted.
    #[error(
        "sort order not given in list [{side}]: last item is greater than current item\nlast   [{previous}]\n> curr [{current}]"
    )]
    SortOrder {
        side: MergeSide,
        previous: String,
        current: String,
    },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool { message: String },

    /// `start` was called on a walker that is already running.
    #[error("Walk already started")]
    AlreadyStarted,
}

impl CompareError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this is a sort order violation of the differ's input.
    pub fn is_sort_order(&self) -> bool {
        matches!(self, Self::SortOrder { .. })
    }
}

/// Kind of walk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory.
    ReadError,
    /// Error reading entry metadata.
    MetadataError,
    /// A listing was not sorted as the differ requires.
    SortOrder,
    /// A directory task panicked.
    TaskPanicked,
}

/// Non-fatal problem encountered for a single directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
    /// OS error code, when there is one.
    pub code: Option<i32>,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
            code: None,
        }
    }

    /// Create a warning from an I/O error while reading a directory.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            _ => WarningKind::ReadError,
        };
        Self {
            path: path.into(),
            message: error.to_string(),
            kind,
            code: error.raw_os_error(),
        }
    }

    /// Create a warning from an I/O error while reading entry metadata.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            kind: WarningKind::MetadataError,
            code: error.raw_os_error(),
        }
    }

    /// Create a warning for a listing the differ rejected.
    pub fn sort_order(path: impl Into<PathBuf>, error: &CompareError) -> Self {
        Self::new(
            path,
            format!("{error}\nHINT: force sorting of the source/target listings to compare this directory"),
            WarningKind::SortOrder,
        )
    }

    /// Create a warning for a task that panicked.
    pub fn task_panicked(path: impl Into<PathBuf>, message: &str) -> Self {
        Self::new(path, format!("task panicked: {message}"), WarningKind::TaskPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_error_io() {
        let err = CompareError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, CompareError::PermissionDenied { .. }));
    }

    #[test]
    fn test_sort_order_message() {
        let err = CompareError::SortOrder {
            side: MergeSide::B,
            previous: "b".into(),
            current: "a".into(),
        };
        assert!(err.is_sort_order());
        assert!(err.to_string().contains("list [B]"));

        let warning = WalkWarning::sort_order("/x", &err);
        assert_eq!(warning.kind, WarningKind::SortOrder);
        assert!(warning.message.contains("HINT"));
    }

    #[test]
    fn test_read_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = WalkWarning::read_error("/x", &err);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
    }
}
