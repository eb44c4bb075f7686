//! Event debouncing and delayed, restartable tasks

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Suppresses repeat events for the same path inside a time window
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Whether an event for `path` at `now` should be processed
    ///
    /// Accepted events restart the window for that path; ignored ones do not.
    pub fn should_process(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(&last) = self.last_accepted.get(path) {
            if now.saturating_duration_since(last) < self.window {
                debug!("Debounced event for {}", path.display());
                return false;
            }
        }

        self.last_accepted.insert(path.to_path_buf(), now);
        true
    }

    /// Forget a path so its next event is processed immediately
    pub fn forget(&mut self, path: &Path) {
        self.last_accepted.remove(path);
    }
}

/// A single pending task that is restarted each time it is scheduled
///
/// Scheduling again before the delay expires aborts the pending run, so a
/// burst of requests results in one run after the last of them. A run that
/// has already started is never interrupted.
#[derive(Debug, Default)]
pub struct DelayedTask {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless rescheduled or cancelled first
    pub fn schedule<F>(&self, delay: Duration, cancel: CancellationToken, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                // Detached so a later reschedule cannot abort a run in progress
                _ = tokio::time::sleep(delay) => {
                    tokio::spawn(task);
                }
            }
        });

        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the pending run, if any
    pub fn cancel(&self) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}
