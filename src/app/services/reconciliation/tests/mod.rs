//! Test utilities for reconciliation testing

use crate::app::models::Race;
use crate::app::services::reconciliation::ReconciliationStore;
use crate::app::services::watcher::events::WatchEvent;
use crate::config::AppConfig;
use std::collections::HashMap;
use tempfile::TempDir;
use tokio::sync::broadcast;


pub fn race(number: &str, title: &str, racers: &[(i32, i32)]) -> Race {
    Race::new(number, title, 4.5, racers.iter().copied().collect::<HashMap<_, _>>()).unwrap()
}

pub fn numbers(races: &[Race]) -> Vec<&str> {
    races.iter().map(Race::race_number).collect()
}

/// Store writing into a fresh temporary output directory
pub fn test_store() -> (TempDir, ReconciliationStore, broadcast::Receiver<WatchEvent>) {
    let dir = TempDir::new().unwrap();
    let (sender, receiver) = broadcast::channel(64);
    let store = ReconciliationStore::new(dir.path(), &AppConfig::default(), sender);
    (dir, store, receiver)
}
