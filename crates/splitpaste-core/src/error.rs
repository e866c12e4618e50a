//! Error types for splitpaste.

use splitpaste_types::{DelimiterError, ParseFailure};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SplitpasteError {
    #[error("Content buffer is empty")]
    EmptyBuffer,

    #[error("No file delimiter configured")]
    NoDelimiter,

    #[error("No destination folder set")]
    NoDestination,

    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(#[from] DelimiterError),

    #[error("No files were detected in the content")]
    NoSegmentsFound,

    #[error("Destination folder is no longer valid: {0:?}")]
    FolderBecameInvalid(PathBuf),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SplitpasteError {
    /// Input errors abort an operation before any filesystem activity.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SplitpasteError::EmptyBuffer
                | SplitpasteError::NoDelimiter
                | SplitpasteError::NoDestination
        )
    }

    /// Reason code reported to the UI when a parse is refused.
    pub fn parse_failure(&self) -> ParseFailure {
        match self {
            SplitpasteError::EmptyBuffer => ParseFailure::EmptyBuffer,
            SplitpasteError::NoDelimiter => ParseFailure::NoDelimiter,
            SplitpasteError::NoDestination => ParseFailure::NoDestination,
            SplitpasteError::NoSegmentsFound => ParseFailure::NoSegmentsFound,
            other => ParseFailure::Other(other.to_string()),
        }
    }
}
