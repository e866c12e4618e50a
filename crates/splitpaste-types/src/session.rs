//! Session summary types.

use crate::DelimiterSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Read-only view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub delimiter: Option<DelimiterSpec>,
    pub destination: Option<PathBuf>,
    pub auto_clipboard: bool,
    pub auto_parse: bool,
    pub clipboard_armed: bool,
    pub folder_armed: bool,
    pub active: bool,
    pub buffer_len: usize,
    pub filenames: Vec<String>,
    pub selected: Vec<String>,
}

/// A destination folder remembered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: i64,
    pub path: PathBuf,
}

/// A body that was written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub filename: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
