//! Per-file results of writing a parsed block to disk.

use serde::{Deserialize, Serialize};
use std::io;

/// Why a single file could not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailureKind {
    PermissionDenied,
    /// Malformed name, or a name that escapes the destination root.
    InvalidPath,
    StorageFull,
    Other,
}

impl From<io::ErrorKind> for WriteFailureKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                WriteFailureKind::PermissionDenied
            }
            io::ErrorKind::NotFound
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidFilename
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::AlreadyExists => WriteFailureKind::InvalidPath,
            io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => {
                WriteFailureKind::StorageFull
            }
            _ => WriteFailureKind::Other,
        }
    }
}

/// A failed write, keyed by filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub filename: String,
    pub kind: WriteFailureKind,
    /// Underlying OS error text.
    pub detail: String,
}

impl FileFailure {
    pub fn from_io(filename: impl Into<String>, err: &io::Error) -> Self {
        Self {
            filename: filename.into(),
            kind: err.kind().into(),
            detail: err.to_string(),
        }
    }
}

/// Outcome of one filename within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Written,
    Skipped,
    Failed,
}

/// Result of a materialize batch. Every selected filename appears in
/// exactly one of the three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeResult {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<FileFailure>,
}

impl MaterializeResult {
    pub fn outcome(&self, filename: &str) -> Option<FileOutcome> {
        if self.written.iter().any(|f| f == filename) {
            Some(FileOutcome::Written)
        } else if self.skipped.iter().any(|f| f == filename) {
            Some(FileOutcome::Skipped)
        } else if self.errors.iter().any(|e| e.filename == filename) {
            Some(FileOutcome::Failed)
        } else {
            None
        }
    }

    /// Number of filenames accounted for.
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.errors.len()
    }
}
