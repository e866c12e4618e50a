//! Destination-folder validity monitoring and the auto-parse switch.

use crate::{Result, SessionManager, SplitpasteError};
use splitpaste_types::{Monitor, SessionEvent};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{info, trace, warn};
use uuid::Uuid;

/// Asks the user for a destination folder.
pub trait FolderPrompt {
    /// `None` means the user declined to choose one.
    fn choose_folder(&mut self) -> Option<PathBuf>;
}

/// A prompt that never yields a folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl FolderPrompt for NoPrompt {
    fn choose_folder(&mut self) -> Option<PathBuf> {
        None
    }
}

impl SessionManager {
    /// Turn on auto parse and start the folder monitor.
    ///
    /// Without a destination the user is prompted first; if no folder is
    /// chosen auto parse stays off and `Ok(false)` is returned.
    pub fn enable_auto_parse(
        &mut self,
        id: Uuid,
        prompt: &mut dyn FolderPrompt,
        now: Instant,
    ) -> Result<bool> {
        if self.session(id)?.destination().is_none() {
            match prompt.choose_folder() {
                Some(folder) => self.set_destination(id, folder)?,
                None => {
                    info!(
                        target: "splitpaste::folder",
                        "No folder chosen, auto parse stays off for session {}",
                        id
                    );
                    return Ok(false);
                }
            }
        }

        let session = self.session_mut(id)?;
        session.auto_parse = true;
        session.folder_timer.start(now);
        self.emit(SessionEvent::MonitorChanged {
            session_id: id,
            monitor: Monitor::Folder,
            armed: true,
        });
        info!(target: "splitpaste::folder", "Auto parse enabled for session {}", id);
        Ok(true)
    }

    pub fn disable_auto_parse(&mut self, id: Uuid) -> Result<()> {
        let session = self.session_mut(id)?;
        session.auto_parse = false;
        session.folder_timer.stop();
        self.emit(SessionEvent::MonitorChanged {
            session_id: id,
            monitor: Monitor::Folder,
            armed: false,
        });
        info!(target: "splitpaste::folder", "Auto parse disabled for session {}", id);
        Ok(())
    }

    /// Check the session's destination. If it is gone or not a directory,
    /// auto parse is switched off and a `FolderInvalid` event is raised.
    /// Auto clipboard is left as it is.
    pub fn check_folder(&mut self, id: Uuid) -> Result<()> {
        let session = self.session(id)?;
        let destination = session.destination().map(|p| p.to_path_buf());
        if let Some(path) = destination.as_ref().filter(|p| p.is_dir()) {
            trace!(target: "splitpaste::folder", "Folder checked: {}", path.display());
            return Ok(());
        }

        let path = destination.unwrap_or_default();
        let session = self.session_mut(id)?;
        session.auto_parse = false;
        session.folder_timer.stop();
        warn!(
            target: "splitpaste::folder",
            "Destination {} is no longer a folder; auto parse disabled for session {}",
            path.display(),
            id
        );
        self.emit(SessionEvent::FolderInvalid {
            session_id: id,
            path: path.clone(),
        });
        self.emit(SessionEvent::MonitorChanged {
            session_id: id,
            monitor: Monitor::Folder,
            armed: false,
        });
        Err(SplitpasteError::FolderBecameInvalid(path))
    }

    /// Run the folder check for every session whose folder timer is due.
    pub fn tick_folders(&mut self, now: Instant) {
        let due: Vec<Uuid> = self
            .session_ids()
            .into_iter()
            .filter(|id| {
                self.session(*id)
                    .is_ok_and(|s| s.folder_timer().is_due(now))
            })
            .collect();

        for id in due {
            if let Ok(session) = self.session_mut(id) {
                session.folder_timer.advance(now);
            }
            // An invalid folder has already been reported through events.
            let _ = self.check_folder(id);
        }
    }
}
