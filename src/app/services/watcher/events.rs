//! Notifications sent to observers of the watcher

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::models::Race;
use crate::app::services::reconciliation::ProcessingStats;
use crate::app::services::roster::RosterSnapshot;

/// Event broadcast by the watcher and the reconciliation store
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// An export file was reconciled or removed
    FileProcessed {
        path: PathBuf,
        message: String,
        stats: Option<ProcessingStats>,
    },
    /// Processing one file failed; watching continues
    Error { message: String },
    /// The race list was rewritten
    RacesUpdated {
        races: Arc<Vec<Race>>,
        roster: RosterSnapshot,
    },
    /// Startup failed; the watcher is not running
    Fatal { message: String },
}

impl WatchEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }
}
