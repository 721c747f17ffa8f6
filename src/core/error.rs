//! Defines the error types for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Only the root validation of a scan is fatal. Everything that goes wrong
/// below the root is reported as a [`ScanIssue`] instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The scan root does not exist or is not a directory.
    #[error("Path is not a valid directory: {0}")]
    InvalidPath(PathBuf),
}

/// A non-fatal problem encountered while walking a directory tree.
///
/// The affected subtree is treated as empty and the scan carries on with its
/// siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanIssue {
    /// A directory (or entry) could not be opened for lack of permission.
    #[error("Permission denied, skipping subtree: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other read failure: vanished entries, dangling links, loops.
    #[error("Failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl ScanIssue {
    /// The path the issue was reported for.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanIssue::PermissionDenied { path } | ScanIssue::Io { path, .. } => path,
        }
    }

    /// Returns true when the issue was caused by missing permissions.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ScanIssue::PermissionDenied { .. })
    }
}
