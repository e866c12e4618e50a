//! Clipboard polling for the active session.

use crate::{Result, SessionManager, SplitpasteError};
use splitpaste_types::BufferSource;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Somewhere to read clipboard text from.
pub trait ClipboardSource {
    /// Current clipboard text, or `None` when it holds no text.
    fn read_text(&mut self) -> Result<Option<String>>;
}

/// The system clipboard via `arboard`.
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| SplitpasteError::Clipboard(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<Option<String>> {
        match self.clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(SplitpasteError::Clipboard(e.to_string())),
        }
    }
}

impl SessionManager {
    /// Tick the active session's clipboard monitor if its timer is due.
    pub fn tick_clipboard(&mut self, clipboard: &mut dyn ClipboardSource, now: Instant) {
        let Some(id) = self.active_id() else {
            return;
        };
        let Ok(session) = self.session_mut(id) else {
            return;
        };
        if !session.clipboard_timer.is_due(now) {
            return;
        }
        session.clipboard_timer.advance(now);

        if let Err(e) = self.poll_clipboard(id, clipboard) {
            warn!(
                target: "splitpaste::clipboard",
                "Clipboard check failed for session {}: {}",
                id,
                e
            );
        }
    }

    /// Compare the clipboard with the session's last snapshot and, on change,
    /// load it into the buffer. With auto parse on, the new buffer is
    /// materialized immediately and then cleared.
    ///
    /// Returns whether the clipboard had changed.
    pub fn poll_clipboard(
        &mut self,
        id: Uuid,
        clipboard: &mut dyn ClipboardSource,
    ) -> Result<bool> {
        let text = clipboard.read_text()?.unwrap_or_default();
        let session = self.session_mut(id)?;
        if text == session.last_clipboard {
            trace!(target: "splitpaste::clipboard", "Clipboard unchanged for session {}", id);
            return Ok(false);
        }
        session.last_clipboard = text.clone();
        let auto_parse = session.auto_parse;

        self.update_buffer(id, text, BufferSource::Clipboard)?;
        info!(target: "splitpaste::clipboard", "Clipboard content loaded into session {}", id);

        if auto_parse {
            // Failures are already logged and broadcast by parse.
            if let Ok(result) = self.parse(id) {
                debug!(
                    target: "splitpaste::clipboard",
                    "Auto parse wrote {} files for session {}",
                    result.written.len(),
                    id
                );
            }
            self.update_buffer(id, String::new(), BufferSource::Clipboard)?;
        }
        Ok(true)
    }

    /// Copy the clipboard into the buffer on request, if it differs from it.
    pub fn paste_from_clipboard(
        &mut self,
        id: Uuid,
        clipboard: &mut dyn ClipboardSource,
    ) -> Result<bool> {
        let text = clipboard.read_text()?.unwrap_or_default();
        let session = self.session_mut(id)?;
        if text == session.buffer() {
            return Ok(false);
        }
        session.last_clipboard = text.clone();
        self.update_buffer(id, text, BufferSource::Manual)?;
        info!(target: "splitpaste::clipboard", "Content copied from clipboard into session {}", id);
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted clipboard contents, repeating the last one forever.
    #[derive(Debug, Default)]
    pub struct ScriptedClipboard {
        script: VecDeque<Option<String>>,
        last: Option<String>,
        pub reads: usize,
    }

    impl ScriptedClipboard {
        pub fn new(script: &[&str]) -> Self {
            Self {
                script: script.iter().map(|s| Some(s.to_string())).collect(),
                last: None,
                reads: 0,
            }
        }
    }

    impl ClipboardSource for ScriptedClipboard {
        fn read_text(&mut self) -> Result<Option<String>> {
            self.reads += 1;
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            Ok(self.last.clone())
        }
    }

    pub struct BrokenClipboard;

    impl ClipboardSource for BrokenClipboard {
        fn read_text(&mut self) -> Result<Option<String>> {
            Err(SplitpasteError::Clipboard("no display".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{BrokenClipboard, ScriptedClipboard};
    use super::*;
    use crate::{SessionManagerConfig, SessionStore};
    use splitpaste_types::SessionEvent;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_manager() -> (SessionManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(&temp_dir.path().join("folders.db")).unwrap();
        let manager = SessionManager::with_store(SessionManagerConfig::default(), store);
        (manager, temp_dir)
    }

    #[test]
    fn test_changed_clipboard_replaces_buffer() {
        let (mut manager, _dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        let mut clipboard = ScriptedClipboard::new(&["// a.txt\nhello\n"]);

        assert!(manager.poll_clipboard(id, &mut clipboard).unwrap());

        let session = manager.session(id).unwrap();
        assert_eq!(session.buffer(), "// a.txt\nhello\n");
        assert_eq!(session.last_clipboard(), "// a.txt\nhello\n");
        assert_eq!(session.block().body("a.txt"), Some("hello"));
    }

    #[test]
    fn test_unchanged_clipboard_is_a_no_op() {
        let (mut manager, dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager.set_destination(id, dir.path().join("out")).unwrap();
        manager
            .enable_auto_parse(id, &mut crate::NoPrompt, Instant::now())
            .unwrap();
        let mut clipboard = ScriptedClipboard::new(&["// a.txt\nhello\n"]);
        assert!(manager.poll_clipboard(id, &mut clipboard).unwrap());
        // Simulate the user typing into the buffer between ticks.
        manager
            .update_buffer(id, "typed", BufferSource::Manual)
            .unwrap();
        let mut events = manager.subscribe();

        assert!(!manager.poll_clipboard(id, &mut clipboard).unwrap());

        assert_eq!(manager.session(id).unwrap().buffer(), "typed");
        assert!(events.try_recv().is_err());
        assert_eq!(manager.store().list_parsed_items(None).unwrap().len(), 1);
    }

    #[test]
    fn test_auto_parse_writes_and_clears_buffer() {
        let (mut manager, dir) = create_test_manager();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let id = manager.create_session(Instant::now()).unwrap();
        manager.set_destination(id, &out).unwrap();
        manager
            .enable_auto_parse(id, &mut crate::NoPrompt, Instant::now())
            .unwrap();
        let mut events = manager.subscribe();
        let mut clipboard = ScriptedClipboard::new(&["// a.txt\nhello\n// b.txt\n\n"]);

        assert!(manager.poll_clipboard(id, &mut clipboard).unwrap());

        assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "hello");
        assert!(!out.join("b.txt").exists());
        let session = manager.session(id).unwrap();
        assert_eq!(session.buffer(), "");
        assert!(session.block().is_empty());
        assert_eq!(session.last_clipboard(), "// a.txt\nhello\n// b.txt\n\n");

        let materialized = std::iter::from_fn(|| events.try_recv().ok()).find_map(|e| match e {
            SessionEvent::Materialized { result, .. } => Some(result),
            _ => None,
        });
        let result = materialized.expect("materialized event");
        assert_eq!(result.written, vec!["a.txt"]);
        assert_eq!(result.skipped, vec!["b.txt"]);
    }

    #[test]
    fn test_auto_parse_failure_still_clears_buffer() {
        let (mut manager, dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager.set_destination(id, dir.path()).unwrap();
        manager
            .enable_auto_parse(id, &mut crate::NoPrompt, Instant::now())
            .unwrap();
        let mut clipboard = ScriptedClipboard::new(&["plain text, no markers"]);

        assert!(manager.poll_clipboard(id, &mut clipboard).unwrap());
        assert_eq!(manager.session(id).unwrap().buffer(), "");
    }

    #[test]
    fn test_tick_respects_timer_and_active_session() {
        let (mut manager, _dir) = create_test_manager();
        let t0 = Instant::now();
        let first = manager.create_session(t0).unwrap();
        manager.enable_auto_clipboard(first, t0).unwrap();
        let mut clipboard = ScriptedClipboard::new(&["one", "two"]);

        manager.tick_clipboard(&mut clipboard, t0 + Duration::from_millis(500));
        assert_eq!(clipboard.reads, 0);

        manager.tick_clipboard(&mut clipboard, t0 + Duration::from_secs(1));
        assert_eq!(clipboard.reads, 1);
        assert_eq!(manager.session(first).unwrap().buffer(), "one");

        let second = manager.create_session(t0 + Duration::from_secs(1)).unwrap();
        manager.tick_clipboard(&mut clipboard, t0 + Duration::from_secs(5));
        assert_eq!(clipboard.reads, 1);
        assert_eq!(manager.session(second).unwrap().buffer(), "");
    }

    #[test]
    fn test_clipboard_error_leaves_session_untouched() {
        let (mut manager, _dir) = create_test_manager();
        let t0 = Instant::now();
        let id = manager.create_session(t0).unwrap();
        manager
            .update_buffer(id, "keep", BufferSource::Manual)
            .unwrap();
        manager.enable_auto_clipboard(id, t0).unwrap();

        manager.tick_clipboard(&mut BrokenClipboard, t0 + Duration::from_secs(1));

        let session = manager.session(id).unwrap();
        assert_eq!(session.buffer(), "keep");
        assert!(session.clipboard_timer().is_armed());
    }

    #[test]
    fn test_paste_from_clipboard() {
        let (mut manager, _dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        let mut clipboard = ScriptedClipboard::new(&["// x.rs\nfn x() {}\n"]);

        assert!(manager.paste_from_clipboard(id, &mut clipboard).unwrap());
        assert!(!manager.paste_from_clipboard(id, &mut clipboard).unwrap());
        assert_eq!(manager.session(id).unwrap().block().body("x.rs"), Some("fn x() {}"));
    }
}
