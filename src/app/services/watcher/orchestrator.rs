//! Startup sequencing and filesystem event handling
//!
//! The orchestrator owns the notify watcher and the reconciliation store.
//! Filesystem callbacks are forwarded over a channel to an event loop task;
//! each accepted change is processed on its own task so that a slow parse
//! never blocks event delivery.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::debounce::{DelayedTask, Debouncer};
use super::events::WatchEvent;
use super::timeout::with_timeout;
use crate::app::models::Race;
use crate::app::services::converter::convert_races;
use crate::app::services::export_parser::ExportParser;
use crate::app::services::reconciliation::{ProcessingStats, ReconciliationStore, SourceKey};
use crate::app::services::roster::{RosterSnapshot, load_roster};
use crate::app::services::row_source::FileRowSource;
use crate::config::AppConfig;
use crate::constants::{
    CLEANUP_DELAY, DEBOUNCE_WINDOW, EVENT_CHANNEL_CAPACITY, EVT_FILE_NAME, ROSTER_FILE_NAME,
    ROSTER_LOAD_TIMEOUT, SEED_LOAD_TIMEOUT, SETTLE_DELAY,
};
use crate::{Error, Result};

/// Timing windows used by the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTiming {
    /// Repeat events for one path inside this window are ignored
    pub debounce_window: Duration,
    /// Wait after an accepted change before reading the file
    pub settle_delay: Duration,
    /// Quiet period after the last deletion before orphan cleanup
    pub cleanup_delay: Duration,
    pub seed_timeout: Duration,
    pub roster_timeout: Duration,
}

impl Default for WatchTiming {
    fn default() -> Self {
        Self {
            debounce_window: DEBOUNCE_WINDOW,
            settle_delay: SETTLE_DELAY,
            cleanup_delay: CLEANUP_DELAY,
            seed_timeout: SEED_LOAD_TIMEOUT,
            roster_timeout: ROSTER_LOAD_TIMEOUT,
        }
    }
}

/// Shared state of a running watcher
struct WatchContext {
    watch_dir: PathBuf,
    output_dir: PathBuf,
    pattern: glob::Pattern,
    parser: ExportParser,
    store: ReconciliationStore,
    events: broadcast::Sender<WatchEvent>,
    debouncer: Mutex<Debouncer>,
    cleanup: DelayedTask,
    cancel: CancellationToken,
    timing: WatchTiming,
}

/// Watches an export directory and keeps `Lynx.evt` reconciled with it
pub struct WatchOrchestrator {
    context: Arc<WatchContext>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl WatchOrchestrator {
    /// Create an orchestrator with the default timing windows
    pub fn new(watch_dir: &Path, output_dir: &Path, config: &AppConfig) -> Result<Self> {
        Self::with_timing(watch_dir, output_dir, config, WatchTiming::default())
    }

    pub fn with_timing(
        watch_dir: &Path,
        output_dir: &Path,
        config: &AppConfig,
        timing: WatchTiming,
    ) -> Result<Self> {
        config.validate()?;
        let pattern = config.export_pattern()?;

        // Notification paths are reported under the canonical directory
        let watch_dir = std::fs::canonicalize(watch_dir).unwrap_or_else(|_| watch_dir.to_path_buf());
        let output_dir = std::fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = ReconciliationStore::new(&output_dir, config, events.clone())
            .with_seed_timeout(timing.seed_timeout);

        Ok(Self {
            context: Arc::new(WatchContext {
                watch_dir,
                output_dir,
                pattern,
                parser: ExportParser::from_config(config),
                store,
                events,
                debouncer: Mutex::new(Debouncer::new(timing.debounce_window)),
                cleanup: DelayedTask::new(),
                cancel: CancellationToken::new(),
                timing,
            }),
            watcher: Mutex::new(None),
        })
    }

    /// Receive notifications from this watcher
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.context.events.subscribe()
    }

    /// Current merged race list
    pub async fn races(&self) -> Vec<Race> {
        self.context.store.all_races().await
    }

    pub fn store(&self) -> &ReconciliationStore {
        &self.context.store
    }

    pub fn watch_dir(&self) -> &Path {
        &self.context.watch_dir
    }

    pub fn is_running(&self) -> bool {
        lock(&self.watcher).is_some()
    }

    /// Run the startup sequence and arm the filesystem watcher
    ///
    /// Any startup failure is fatal: a `Fatal` event is sent, the watcher is
    /// left stopped and the error is returned.
    pub async fn start(&self) -> Result<()> {
        if self.is_running() {
            debug!("Watcher already running");
            return Ok(());
        }
        if self.context.cancel.is_cancelled() {
            return Err(Error::processing_interrupted("Watcher has been stopped"));
        }

        match self.startup().await {
            Ok(watcher) => {
                *lock(&self.watcher) = Some(watcher);
                info!(
                    "Started watching {} for pattern {}",
                    self.context.watch_dir.display(),
                    self.context.pattern
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to start watcher: {}", e);
                self.context.notify(WatchEvent::fatal(e.to_string()));
                self.stop();
                Err(e)
            }
        }
    }

    async fn startup(&self) -> Result<RecommendedWatcher> {
        let ctx = &self.context;

        ensure_directory(&ctx.watch_dir, "Watch directory")?;
        ensure_directory(&ctx.output_dir, "Output directory")?;
        ctx.ensure_race_list().await?;

        ctx.store.load_seed_once().await?;
        let roster = ctx.load_roster().await?;
        ctx.store.set_roster(roster).await;

        ctx.process_existing_files().await;

        self.arm_watcher()
    }

    fn arm_watcher(&self) -> Result<RecommendedWatcher> {
        let (sender, receiver) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |result| {
            if sender.send(result).is_err() {
                debug!("Watcher notification receiver dropped");
            }
        })
        .map_err(|e| Error::watcher("Failed to create file watcher", e))?;

        watcher
            .watch(&self.context.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::watcher(
                    format!("Failed to watch {}", self.context.watch_dir.display()),
                    e,
                )
            })?;

        tokio::spawn(Arc::clone(&self.context).run_event_loop(receiver));
        Ok(watcher)
    }

    /// Stop receiving events and cancel pending timers
    ///
    /// Reconciliations already in progress run to completion.
    pub fn stop(&self) {
        self.context.cancel.cancel();
        self.context.cleanup.cancel();
        if lock(&self.watcher).take().is_some() {
            info!("Stopped watching {}", self.context.watch_dir.display());
        }
    }
}

impl Drop for WatchOrchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl WatchContext {
    fn notify(&self, event: WatchEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for watcher events");
        }
    }

    fn is_export_file(&self, path: &Path) -> bool {
        let options = glob::MatchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.pattern.matches_with(name, options))
            .unwrap_or(false)
    }

    /// Export files currently in the watch directory, sorted
    fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.watch_dir).map_err(|e| {
            Error::io(
                format!("Failed to list {}", self.watch_dir.display()),
                e,
            )
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.is_export_file(path))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn ensure_race_list(&self) -> Result<()> {
        let path = self.output_dir.join(EVT_FILE_NAME);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("{} found", EVT_FILE_NAME);
            return Ok(());
        }

        tokio::fs::write(&path, b"")
            .await
            .map_err(|e| Error::io(format!("Error creating {}", path.display()), e))?;
        info!("{} not found. Created {}", EVT_FILE_NAME, path.display());
        Ok(())
    }

    async fn load_roster(&self) -> Result<RosterSnapshot> {
        let path = self.output_dir.join(ROSTER_FILE_NAME);
        let load = tokio::task::spawn_blocking(move || load_roster(&path));

        let loaded = with_timeout("Loading roster", self.timing.roster_timeout, async {
            load.await
                .map_err(|e| Error::processing_interrupted(format!("Roster load task failed: {}", e)))?
        })
        .await;

        match loaded {
            Ok(roster) => Ok(roster),
            Err(e @ Error::Timeout { .. }) => Err(e),
            Err(e) => {
                warn!("Error loading roster: {}", e);
                Ok(RosterSnapshot::default())
            }
        }
    }

    async fn process_existing_files(&self) {
        let files = match self.matching_files() {
            Ok(files) => files,
            Err(e) => {
                error!("Error processing existing files: {}", e);
                self.notify(WatchEvent::error(format!("Error processing existing files: {}", e)));
                return;
            }
        };

        if files.is_empty() {
            info!("No existing files found matching the pattern");
        } else {
            info!("Found {} existing files to process", files.len());
        }

        // Races already in the race list stay until a deletion triggers cleanup
        for path in &files {
            self.process_and_report(path).await;
        }
    }

    /// Parse, convert and reconcile one export file
    ///
    /// Returns `None` when the file disappeared before it could be read.
    async fn process_file(&self, path: &Path) -> Result<Option<ProcessingStats>> {
        let file_name = display_name(path);
        if !path.exists() {
            info!("File no longer exists: {}", path.display());
            return Ok(None);
        }
        info!("Processing file: \"{}\"", file_name);

        let parser = self.parser.clone();
        let source_path = path.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || {
            let export = parser.parse(&FileRowSource::new(source_path))?;
            Ok::<_, Error>(convert_races(&export))
        })
        .await
        .map_err(|e| Error::processing_interrupted(format!("Parse task failed: {}", e)))?;

        let races = match parsed {
            Ok(races) => races,
            Err(Error::FileNotFound { .. }) => {
                info!("File no longer exists: {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let stats = self.store.reconcile(&SourceKey::from(path), races).await?;

        let message = format!("Processed \"{}\": {}", file_name, stats.detailed());
        info!("{}", message);
        debug!(
            "File: {} - Added: {}, Updated: {}, Unchanged: {}, Removed: {}",
            file_name,
            stats.races_added(),
            stats.races_updated(),
            stats.races_unchanged(),
            stats.races_removed()
        );
        self.notify(WatchEvent::FileProcessed {
            path: path.to_path_buf(),
            message,
            stats: Some(stats.clone()),
        });
        Ok(Some(stats))
    }

    async fn process_and_report(&self, path: &Path) {
        if let Err(e) = self.process_file(path).await {
            let message = format!("Error processing file {}: {}", path.display(), e);
            error!("{}", message);
            self.notify(WatchEvent::error(message));
        }
    }

    async fn run_event_loop(self: Arc<Self>, mut receiver: mpsc::UnboundedReceiver<notify::Result<Event>>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                received = receiver.recv() => match received {
                    Some(result) => self.handle_notification(result),
                    None => break,
                },
            }
        }
        debug!("Watcher event loop finished");
    }

    fn handle_notification(self: &Arc<Self>, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                let message = format!("File watcher error: {}", e);
                warn!("{}", message);
                self.notify(WatchEvent::error(message));
                return;
            }
        };

        let removed = matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From))
        );
        let changed = !removed && matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
        if !removed && !changed {
            return;
        }

        for path in event.paths.into_iter().filter(|path| self.is_export_file(path)) {
            if removed {
                self.on_removed(path);
            } else {
                self.on_changed(path);
            }
        }
    }

    fn on_changed(self: &Arc<Self>, path: PathBuf) {
        if !lock(&self.debouncer).should_process(&path, Instant::now()) {
            return;
        }

        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return,
                _ = tokio::time::sleep(ctx.timing.settle_delay) => {}
            }
            ctx.process_and_report(&path).await;
        });
    }

    fn on_removed(self: &Arc<Self>, path: PathBuf) {
        lock(&self.debouncer).forget(&path);

        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            info!("Removing races from deleted file: {}", path.display());
            match ctx.store.remove(&SourceKey::from(path.as_path())).await {
                Ok(()) => ctx.notify(WatchEvent::FileProcessed {
                    message: format!("Removed races from deleted file \"{}\"", display_name(&path)),
                    path,
                    stats: None,
                }),
                Err(e) => {
                    let message = format!(
                        "Error removing races from deleted file {}: {}",
                        path.display(),
                        e
                    );
                    error!("{}", message);
                    ctx.notify(WatchEvent::error(message));
                }
            }

            let cleanup_ctx = Arc::clone(&ctx);
            ctx.cleanup.schedule(
                ctx.timing.cleanup_delay,
                ctx.cancel.clone(),
                async move { cleanup_ctx.cleanup_orphans().await },
            );
        });
    }

    async fn cleanup_orphans(&self) {
        let result = match self.matching_files() {
            Ok(files) => self.store.cleanup(&files).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(dropped) if !dropped.is_empty() => {
                info!("Removed orphaned races: {}", dropped.join(", "));
            }
            Ok(_) => {}
            Err(e) => {
                let message = format!("Error cleaning up orphaned races: {}", e);
                error!("{}", message);
                self.notify(WatchEvent::error(message));
            }
        }
    }
}

fn ensure_directory(path: &Path, what: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::file_not_found(format!(
            "{} does not exist: {}",
            what,
            path.display()
        )))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
