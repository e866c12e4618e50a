//! Single-threaded event loop that drives every monitor tick.

use crate::{ClipboardSource, SessionManager};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// Owns the session manager and a clipboard, and runs due ticks one at a
/// time. Each tick, including any parse and store writes it triggers,
/// finishes before the next one starts.
pub struct Scheduler<C: ClipboardSource> {
    manager: SessionManager,
    clipboard: C,
    /// How long to sleep when no timer is armed.
    idle: Duration,
}

impl<C: ClipboardSource> Scheduler<C> {
    pub fn new(manager: SessionManager, clipboard: C) -> Self {
        Self {
            manager,
            clipboard,
            idle: Duration::from_millis(250),
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SessionManager {
        &mut self.manager
    }

    pub fn clipboard_mut(&mut self) -> &mut C {
        &mut self.clipboard
    }

    /// Run whatever is due at `now`.
    pub fn step(&mut self, now: Instant) {
        self.manager.run_due(now, &mut self.clipboard);
    }

    /// Loop until `shutdown` resolves.
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) {
        tokio::pin!(shutdown);
        info!(target: "splitpaste::scheduler", "Scheduler started");

        loop {
            let wake = self
                .manager
                .next_deadline()
                .unwrap_or_else(|| Instant::now() + self.idle);

            tokio::select! {
                _ = &mut shutdown => {
                    info!(target: "splitpaste::scheduler", "Scheduler stopping");
                    break;
                }
                _ = sleep_until(wake) => {
                    let now = Instant::now();
                    debug!(target: "splitpaste::scheduler", "Running due ticks");
                    self.step(now);
                }
            }
        }
    }
}
