//! Delimiter-driven content splitting and the monitors that feed it.

mod clipboard;
mod db;
mod detect;
mod error;
mod folder;
mod materializer;
mod recognizer;
mod scheduler;
mod session;
mod splitter;
mod timer;

pub use clipboard::{ClipboardSource, SystemClipboard};
pub use db::SessionStore;
pub use detect::detect_markers;
pub use error::SplitpasteError;
pub use folder::{FolderPrompt, NoPrompt};
pub use materializer::{FileMaterializer, Selection};
pub use recognizer::MarkerRecognizer;
pub use scheduler::Scheduler;
pub use session::{Session, SessionManager, SessionManagerConfig};
pub use splitter::{ContentSplitter, split};
pub use timer::PollTimer;

/// Result type for splitpaste operations.
pub type Result<T> = std::result::Result<T, SplitpasteError>;
