//! Session manager owning every open session and its monitors.

use crate::{
    ContentSplitter, FileMaterializer, PollTimer, Result, Selection, SessionStore, SplitpasteError,
};
use chrono::{DateTime, Utc};
use splitpaste_types::{
    BufferSource, DelimiterSpec, MaterializeResult, Monitor, ParsedBlock, SessionEvent,
    SessionSnapshot,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    pub db_path: PathBuf,
    /// Delimiter given to new sessions.
    pub default_delimiter: Option<DelimiterSpec>,
    /// Destination given to new sessions.
    pub default_destination: Option<PathBuf>,
    pub saved_markers: Vec<String>,
    pub clipboard_interval: Duration,
    pub folder_check_interval: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            db_path: dirs::data_local_dir()
                .unwrap_or_default()
                .join("splitpaste")
                .join("folders.db"),
            default_delimiter: Some(DelimiterSpec::default()),
            default_destination: None,
            saved_markers: ["//", "###", "/*", "<!--"].map(String::from).to_vec(),
            clipboard_interval: Duration::from_secs(1),
            folder_check_interval: Duration::from_secs(10),
        }
    }
}

/// One tab's worth of state: buffer, delimiter, destination and monitors.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    buffer: String,
    splitter: Option<ContentSplitter>,
    destination: Option<PathBuf>,
    pub(crate) last_clipboard: String,
    pub(crate) auto_clipboard: bool,
    pub(crate) auto_parse: bool,
    pub(crate) clipboard_timer: PollTimer,
    pub(crate) folder_timer: PollTimer,
    block: ParsedBlock,
    selection: Selection,
}

impl Session {
    fn new(config: &SessionManagerConfig) -> Result<Self> {
        let splitter = config
            .default_delimiter
            .as_ref()
            .map(ContentSplitter::new)
            .transpose()?;
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            buffer: String::new(),
            splitter,
            destination: config.default_destination.clone(),
            last_clipboard: String::new(),
            auto_clipboard: false,
            auto_parse: false,
            clipboard_timer: PollTimer::new(config.clipboard_interval),
            folder_timer: PollTimer::new(config.folder_check_interval),
            block: ParsedBlock::new(),
            selection: Selection::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn delimiter(&self) -> Option<&DelimiterSpec> {
        self.splitter.as_ref().map(ContentSplitter::spec)
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn block(&self) -> &ParsedBlock {
        &self.block
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn last_clipboard(&self) -> &str {
        &self.last_clipboard
    }

    pub fn auto_clipboard(&self) -> bool {
        self.auto_clipboard
    }

    pub fn auto_parse(&self) -> bool {
        self.auto_parse
    }

    pub fn clipboard_timer(&self) -> &PollTimer {
        &self.clipboard_timer
    }

    pub fn folder_timer(&self) -> &PollTimer {
        &self.folder_timer
    }

    /// Replace the buffer and re-split it. The selection resets to every file.
    fn set_buffer(&mut self, text: String) {
        self.buffer = text;
        self.resplit();
    }

    fn resplit(&mut self) {
        self.block = match &self.splitter {
            Some(splitter) => splitter.split(&self.buffer),
            None => ParsedBlock::new(),
        };
        self.selection = Selection::all_of(&self.block);
    }

    /// Validate everything a parse needs, returning the destination.
    fn parse_target(&self) -> Result<&Path> {
        if self.buffer.trim().is_empty() {
            return Err(SplitpasteError::EmptyBuffer);
        }
        let destination = self
            .destination
            .as_deref()
            .ok_or(SplitpasteError::NoDestination)?;
        if self.splitter.is_none() {
            return Err(SplitpasteError::NoDelimiter);
        }
        if self.block.is_empty() {
            return Err(SplitpasteError::NoSegmentsFound);
        }
        Ok(destination)
    }

    fn snapshot(&self, active: bool) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            delimiter: self.delimiter().cloned(),
            destination: self.destination.clone(),
            auto_clipboard: self.auto_clipboard,
            auto_parse: self.auto_parse,
            clipboard_armed: self.clipboard_timer.is_armed(),
            folder_armed: self.folder_timer.is_armed(),
            active,
            buffer_len: self.buffer.len(),
            filenames: self.block.filenames().map(String::from).collect(),
            selected: self.selection.iter().map(String::from).collect(),
        }
    }
}

/// Owns all sessions, keyed by id, and the store they write through.
///
/// Exactly one session may be active; only the active session's clipboard
/// timer is ever armed.
pub struct SessionManager {
    config: SessionManagerConfig,
    store: SessionStore,
    sessions: HashMap<Uuid, Session>,
    order: Vec<Uuid>,
    active: Option<Uuid>,
    saved_markers: Vec<String>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(config: SessionManagerConfig) -> Result<Self> {
        let store = SessionStore::open(&config.db_path)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: SessionManagerConfig, store: SessionStore) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let mut saved_markers: Vec<String> = Vec::new();
        for marker in &config.saved_markers {
            let marker = marker.trim();
            if !marker.is_empty() && !saved_markers.iter().any(|m| m == marker) {
                saved_markers.push(marker.to_string());
            }
        }
        Self {
            config,
            store,
            sessions: HashMap::new(),
            order: Vec::new(),
            active: None,
            saved_markers,
            event_tx,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open a new session and make it the active one.
    pub fn create_session(&mut self, now: Instant) -> Result<Uuid> {
        let session = Session::new(&self.config)?;
        let id = session.id;
        self.sessions.insert(id, session);
        self.order.push(id);
        info!(target: "splitpaste::session", "Created session {}", id);
        self.activate(id, now)?;
        Ok(id)
    }

    /// Close a session, stopping both of its timers first.
    ///
    /// If it was active, the neighbouring session becomes active.
    pub fn close_session(&mut self, id: Uuid, now: Instant) -> Result<()> {
        let session = self.session_mut(id)?;
        session.clipboard_timer.stop();
        session.folder_timer.stop();
        self.sessions.remove(&id);

        let position = self.order.iter().position(|s| *s == id);
        self.order.retain(|s| *s != id);
        info!(target: "splitpaste::session", "Closed session {}", id);
        self.emit(SessionEvent::SessionClosed { session_id: id });

        if self.active == Some(id) {
            self.active = None;
            let next = position.and_then(|pos| {
                self.order
                    .get(pos)
                    .or_else(|| pos.checked_sub(1).and_then(|p| self.order.get(p)))
                    .copied()
            });
            if let Some(next) = next {
                self.activate(next, now)?;
            }
        }
        Ok(())
    }

    /// Switch the active session. The previous session's clipboard timer
    /// stops; the new one's starts if it has auto clipboard on.
    pub fn activate(&mut self, id: Uuid, now: Instant) -> Result<()> {
        if !self.sessions.contains_key(&id) {
            return Err(SplitpasteError::SessionNotFound(id));
        }
        if self.active == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.active.take() {
            if let Some(session) = self.sessions.get_mut(&previous) {
                if session.clipboard_timer.is_armed() {
                    session.clipboard_timer.stop();
                    self.emit(SessionEvent::MonitorChanged {
                        session_id: previous,
                        monitor: Monitor::Clipboard,
                        armed: false,
                    });
                }
            }
        }

        self.active = Some(id);
        let session = self.session_mut(id)?;
        if session.auto_clipboard {
            session.clipboard_timer.start(now);
            self.emit(SessionEvent::MonitorChanged {
                session_id: id,
                monitor: Monitor::Clipboard,
                armed: true,
            });
        }
        debug!(target: "splitpaste::session", "Activated session {}", id);
        Ok(())
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn session(&self, id: Uuid) -> Result<&Session> {
        self.sessions
            .get(&id)
            .ok_or(SplitpasteError::SessionNotFound(id))
    }

    pub(crate) fn session_mut(&mut self, id: Uuid) -> Result<&mut Session> {
        self.sessions
            .get_mut(&id)
            .ok_or(SplitpasteError::SessionNotFound(id))
    }

    pub(crate) fn session_ids(&self) -> Vec<Uuid> {
        self.order.clone()
    }

    /// Sessions in the order they were opened.
    pub fn list(&self) -> Vec<SessionSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| s.snapshot(self.active == Some(s.id)))
            .collect()
    }

    pub fn set_delimiter(&mut self, id: Uuid, spec: DelimiterSpec) -> Result<()> {
        let splitter = ContentSplitter::new(&spec)?;
        let session = self.session_mut(id)?;
        session.splitter = Some(splitter);
        session.resplit();
        info!(
            target: "splitpaste::session",
            "Session {} delimiter set to {:?}",
            id,
            spec.example_line()
        );
        Ok(())
    }

    pub fn clear_delimiter(&mut self, id: Uuid) -> Result<()> {
        let session = self.session_mut(id)?;
        session.splitter = None;
        session.resplit();
        Ok(())
    }

    pub fn saved_markers(&self) -> &[String] {
        &self.saved_markers
    }

    /// Remember a marker for later selection. Returns false if already known.
    pub fn save_marker(&mut self, marker: &str) -> bool {
        let marker = marker.trim();
        if marker.is_empty() || self.saved_markers.iter().any(|m| m == marker) {
            return false;
        }
        self.saved_markers.push(marker.to_string());
        true
    }

    /// Replace the buffer and return the freshly split block.
    pub fn update_buffer(
        &mut self,
        id: Uuid,
        text: impl Into<String>,
        source: BufferSource,
    ) -> Result<ParsedBlock> {
        let session = self.session_mut(id)?;
        session.set_buffer(text.into());
        let block = session.block.clone();
        debug!(
            target: "splitpaste::session",
            "Session {} buffer updated: {} files",
            id,
            block.len()
        );
        self.emit(SessionEvent::BufferUpdated {
            session_id: id,
            source,
            file_count: block.len(),
        });
        Ok(block)
    }

    pub fn set_destination(&mut self, id: Uuid, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if let Err(e) = self.store.record_folder(&path) {
            warn!(target: "splitpaste::session", "Failed to save folder {}: {}", path.display(), e);
        }
        info!(
            target: "splitpaste::session",
            "Session {} destination set to {}",
            id,
            path.display()
        );
        self.session_mut(id)?.destination = Some(path);
        Ok(())
    }

    pub fn select(&mut self, id: Uuid, filename: &str) -> Result<bool> {
        let session = self.session_mut(id)?;
        if !session.block.contains(filename) {
            return Ok(false);
        }
        Ok(session.selection.insert(filename))
    }

    pub fn deselect(&mut self, id: Uuid, filename: &str) -> Result<bool> {
        Ok(self.session_mut(id)?.selection.remove(filename))
    }

    pub fn select_all(&mut self, id: Uuid) -> Result<()> {
        let session = self.session_mut(id)?;
        session.selection = Selection::all_of(&session.block);
        Ok(())
    }

    pub fn deselect_all(&mut self, id: Uuid) -> Result<()> {
        self.session_mut(id)?.selection.clear();
        Ok(())
    }

    /// Select everything unless everything is already selected, in which
    /// case clear the selection. Returns whether all files are now selected.
    pub fn toggle_select_all(&mut self, id: Uuid) -> Result<bool> {
        let session = self.session_mut(id)?;
        let all_selected = session.selection.len() == session.block.len()
            && session.block.filenames().all(|f| session.selection.contains(f));
        if all_selected && !session.block.is_empty() {
            session.selection.clear();
            Ok(false)
        } else {
            session.selection = Selection::all_of(&session.block);
            Ok(true)
        }
    }

    /// Materialize the session's current block and selection.
    ///
    /// Input problems are reported before anything touches the filesystem.
    pub fn parse(&self, id: Uuid) -> Result<MaterializeResult> {
        let session = self.session(id)?;
        let destination = match session.parse_target() {
            Ok(destination) => destination,
            Err(e) => {
                warn!(target: "splitpaste::session", "Parse refused for session {}: {}", id, e);
                self.emit(SessionEvent::ParseFailed {
                    session_id: id,
                    reason: e.parse_failure(),
                });
                return Err(e);
            }
        };

        let result = self.materialize(&session.block, &session.selection, destination);
        self.emit(SessionEvent::Materialized {
            session_id: id,
            destination: destination.to_path_buf(),
            result: result.clone(),
        });
        Ok(result)
    }

    /// Write `selection` of `block` under `root`, logging to this manager's store.
    pub fn materialize(
        &self,
        block: &ParsedBlock,
        selection: &Selection,
        root: &Path,
    ) -> MaterializeResult {
        FileMaterializer::new(&self.store).materialize(block, selection, root)
    }

    /// Write the raw buffer to a single file.
    pub fn save_buffer(&self, id: Uuid, path: &Path) -> Result<()> {
        let session = self.session(id)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &session.buffer)?;
        info!(target: "splitpaste::session", "Saved session {} buffer to {}", id, path.display());
        Ok(())
    }

    pub fn enable_auto_clipboard(&mut self, id: Uuid, now: Instant) -> Result<()> {
        let active = self.active == Some(id);
        let session = self.session_mut(id)?;
        session.auto_clipboard = true;
        if active && !session.clipboard_timer.is_armed() {
            session.clipboard_timer.start(now);
            self.emit(SessionEvent::MonitorChanged {
                session_id: id,
                monitor: Monitor::Clipboard,
                armed: true,
            });
        }
        info!(target: "splitpaste::clipboard", "Auto clipboard enabled for session {}", id);
        Ok(())
    }

    pub fn disable_auto_clipboard(&mut self, id: Uuid) -> Result<()> {
        let session = self.session_mut(id)?;
        session.auto_clipboard = false;
        let was_armed = session.clipboard_timer.is_armed();
        session.clipboard_timer.stop();
        if was_armed {
            self.emit(SessionEvent::MonitorChanged {
                session_id: id,
                monitor: Monitor::Clipboard,
                armed: false,
            });
        }
        info!(target: "splitpaste::clipboard", "Auto clipboard disabled for session {}", id);
        Ok(())
    }

    /// Earliest instant at which any armed timer wants to tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions
            .values()
            .flat_map(|s| [s.clipboard_timer.next_due(), s.folder_timer.next_due()])
            .flatten()
            .min()
    }

    /// Run every due tick to completion: the clipboard first, then folders.
    pub fn run_due(&mut self, now: Instant, clipboard: &mut dyn crate::ClipboardSource) {
        self.tick_clipboard(clipboard, now);
        self.tick_folders(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitpaste_types::ParseFailure;
    use tempfile::TempDir;

    pub(crate) fn create_test_manager() -> (SessionManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SessionManagerConfig {
            db_path: temp_dir.path().join("folders.db"),
            ..Default::default()
        };
        (SessionManager::new(config).unwrap(), temp_dir)
    }

    #[test]
    fn test_update_buffer_splits_and_selects_all() {
        let (mut manager, _dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();

        let block = manager
            .update_buffer(id, "// a.txt\nhello\n// b.txt\nworld\n", BufferSource::Manual)
            .unwrap();

        assert_eq!(block.len(), 2);
        let session = manager.session(id).unwrap();
        assert_eq!(session.selection().len(), 2);
        assert!(session.selection().contains("a.txt"));
    }

    #[test]
    fn test_set_delimiter_resplits() {
        let (mut manager, _dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager
            .update_buffer(id, "### x.py ###\nprint(1)\n", BufferSource::Manual)
            .unwrap();
        assert!(manager.session(id).unwrap().block().is_empty());

        manager
            .set_delimiter(id, DelimiterSpec::surround("###").unwrap())
            .unwrap();
        assert_eq!(manager.session(id).unwrap().block().body("x.py"), Some("print(1)"));
    }

    #[test]
    fn test_parse_input_errors() {
        let (mut manager, dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        let mut events = manager.subscribe();

        assert!(matches!(manager.parse(id), Err(SplitpasteError::EmptyBuffer)));

        manager
            .update_buffer(id, "// a.txt\nhello\n", BufferSource::Manual)
            .unwrap();
        assert!(matches!(manager.parse(id), Err(SplitpasteError::NoDestination)));

        manager.set_destination(id, dir.path().join("out")).unwrap();
        manager.clear_delimiter(id).unwrap();
        assert!(matches!(manager.parse(id), Err(SplitpasteError::NoDelimiter)));
        assert!(!dir.path().join("out").exists());

        manager.set_delimiter(id, DelimiterSpec::default()).unwrap();
        manager
            .update_buffer(id, "no markers here", BufferSource::Manual)
            .unwrap();
        let err = manager.parse(id).unwrap_err();
        assert!(matches!(err, SplitpasteError::NoSegmentsFound));
        assert!(!err.is_input_error());

        let mut reasons = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::ParseFailed { reason, .. } = event {
                reasons.push(reason);
            }
        }
        assert_eq!(
            reasons,
            vec![
                ParseFailure::EmptyBuffer,
                ParseFailure::NoDestination,
                ParseFailure::NoDelimiter,
                ParseFailure::NoSegmentsFound,
            ]
        );
    }

    #[test]
    fn test_parse_respects_selection() {
        let (mut manager, dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager.set_destination(id, dir.path().join("out")).unwrap();
        manager
            .update_buffer(id, "// a.txt\nhello\n// b.txt\nworld\n", BufferSource::Manual)
            .unwrap();
        assert!(manager.deselect(id, "a.txt").unwrap());

        let result = manager.parse(id).unwrap();

        assert_eq!(result.written, vec!["b.txt"]);
        assert!(!dir.path().join("out/a.txt").exists());
        assert_eq!(manager.store().list_folders().unwrap().len(), 1);
    }

    #[test]
    fn test_toggle_select_all() {
        let (mut manager, _dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager
            .update_buffer(id, "// a.txt\n1\n// b.txt\n2\n", BufferSource::Manual)
            .unwrap();

        assert!(!manager.toggle_select_all(id).unwrap());
        assert!(manager.session(id).unwrap().selection().is_empty());
        assert!(manager.toggle_select_all(id).unwrap());
        assert_eq!(manager.session(id).unwrap().selection().len(), 2);
        assert!(!manager.select(id, "missing.txt").unwrap());
    }

    #[test]
    fn test_activate_moves_clipboard_timer() {
        let (mut manager, _dir) = create_test_manager();
        let now = Instant::now();
        let first = manager.create_session(now).unwrap();
        manager.enable_auto_clipboard(first, now).unwrap();
        assert!(manager.session(first).unwrap().clipboard_timer().is_armed());

        let second = manager.create_session(now).unwrap();
        assert_eq!(manager.active_id(), Some(second));
        assert!(!manager.session(first).unwrap().clipboard_timer().is_armed());
        assert!(manager.session(first).unwrap().auto_clipboard());
        assert!(!manager.session(second).unwrap().clipboard_timer().is_armed());

        manager.activate(first, now).unwrap();
        assert!(manager.session(first).unwrap().clipboard_timer().is_armed());
    }

    #[test]
    fn test_auto_clipboard_on_inactive_session_waits() {
        let (mut manager, _dir) = create_test_manager();
        let now = Instant::now();
        let first = manager.create_session(now).unwrap();
        let _second = manager.create_session(now).unwrap();

        manager.enable_auto_clipboard(first, now).unwrap();
        assert!(!manager.session(first).unwrap().clipboard_timer().is_armed());

        manager.disable_auto_clipboard(first).unwrap();
        manager.activate(first, now).unwrap();
        assert!(!manager.session(first).unwrap().clipboard_timer().is_armed());
    }

    #[test]
    fn test_close_session_stops_timers_and_activates_neighbour() {
        let (mut manager, dir) = create_test_manager();
        let now = Instant::now();
        let first = manager.create_session(now).unwrap();
        let second = manager.create_session(now).unwrap();
        manager.enable_auto_clipboard(first, now).unwrap();
        manager.set_destination(second, dir.path()).unwrap();
        manager.enable_auto_clipboard(second, now).unwrap();
        manager
            .enable_auto_parse(second, &mut crate::NoPrompt, now)
            .unwrap();

        manager.close_session(second, now).unwrap();

        assert!(matches!(
            manager.session(second),
            Err(SplitpasteError::SessionNotFound(_))
        ));
        assert_eq!(manager.active_id(), Some(first));
        assert!(manager.session(first).unwrap().clipboard_timer().is_armed());
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn test_close_last_session_clears_active() {
        let (mut manager, _dir) = create_test_manager();
        let now = Instant::now();
        let id = manager.create_session(now).unwrap();
        manager.close_session(id, now).unwrap();
        assert_eq!(manager.active_id(), None);
        assert!(manager.next_deadline().is_none());
    }

    #[test]
    fn test_saved_markers_deduplicate() {
        let (mut manager, _dir) = create_test_manager();
        assert_eq!(manager.saved_markers().len(), 4);
        assert!(!manager.save_marker("//"));
        assert!(!manager.save_marker("   "));
        assert!(manager.save_marker("--"));
        assert_eq!(manager.saved_markers().last().map(String::as_str), Some("--"));
    }

    #[test]
    fn test_save_buffer() {
        let (mut manager, dir) = create_test_manager();
        let id = manager.create_session(Instant::now()).unwrap();
        manager
            .update_buffer(id, "// a.txt\nraw\n", BufferSource::Manual)
            .unwrap();
        let path = dir.path().join("saved").join("buffer.txt");

        manager.save_buffer(id, &path).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "// a.txt\nraw\n");
    }

    #[test]
    fn test_next_deadline_is_earliest_timer() {
        let (mut manager, dir) = create_test_manager();
        let now = Instant::now();
        let id = manager.create_session(now).unwrap();
        manager.set_destination(id, dir.path()).unwrap();
        manager
            .enable_auto_parse(id, &mut crate::NoPrompt, now)
            .unwrap();
        assert_eq!(manager.next_deadline(), Some(now + Duration::from_secs(10)));

        manager.enable_auto_clipboard(id, now).unwrap();
        assert_eq!(manager.next_deadline(), Some(now + Duration::from_secs(1)));
    }
}
