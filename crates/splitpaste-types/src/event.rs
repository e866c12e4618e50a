//! Events the session manager broadcasts to the UI layer.

use crate::MaterializeResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Where new buffer text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferSource {
    Manual,
    Clipboard,
}

/// Background monitors owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monitor {
    Clipboard,
    Folder,
}

/// Reasons a parse was refused before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailure {
    EmptyBuffer,
    NoDelimiter,
    NoDestination,
    NoSegmentsFound,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    BufferUpdated {
        session_id: Uuid,
        source: BufferSource,
        file_count: usize,
    },
    Materialized {
        session_id: Uuid,
        destination: PathBuf,
        result: MaterializeResult,
    },
    ParseFailed {
        session_id: Uuid,
        reason: ParseFailure,
    },
    /// The destination folder disappeared; auto-parse was switched off.
    FolderInvalid { session_id: Uuid, path: PathBuf },
    MonitorChanged {
        session_id: Uuid,
        monitor: Monitor,
        armed: bool,
    },
    SessionClosed { session_id: Uuid },
}
