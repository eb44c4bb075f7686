//! Export directory watcher
//!
//! Drives the reconciliation store from filesystem events:
//!
//! 1. Startup: check directories, create an empty `Lynx.evt` if needed, load
//!    the persisted races and the roster (both time-bounded), process every
//!    export already present, then drop orphaned races
//! 2. Create/modify: debounce per path, let the writer settle, then parse,
//!    convert and reconcile
//! 3. Remove: drop the file's races, then run one orphan cleanup after a
//!    burst of deletions has gone quiet
//!
//! - [`orchestrator`] - Startup sequence and event handling
//! - [`events`] - Notifications broadcast to observers
//! - [`debounce`] - Per-path debouncing and restartable delayed tasks
//! - [`timeout`] - Time-bounded startup steps

pub mod debounce;
pub mod events;
pub mod orchestrator;
pub mod timeout;

#[cfg(test)]
pub mod tests;

pub use debounce::{DelayedTask, Debouncer};
pub use events::WatchEvent;
pub use orchestrator::{WatchOrchestrator, WatchTiming};
pub use timeout::with_timeout;
