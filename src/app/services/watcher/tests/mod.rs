//! Test utilities for watcher testing

use crate::config::AppConfig;
use std::time::Duration;
use tokio::sync::broadcast;

use super::{WatchEvent, WatchTiming};


/// Configuration matching the GCPV export layout
pub fn test_config() -> AppConfig {
    AppConfig::from_json(
        r#"{
  "GcpvExportFilePattern": "*.csv",
  "KeyFields": {
    "track_params": { "key": "Event :", "offset": 1 },
    "race_group": { "key": "Event :", "offset": 2, "suffix_stop_words": ["male", "female", "Genders Mixed"] },
    "stage": { "key": "Stage :", "offset": 1 },
    "race_number": { "key": "Race", "offset": 1 },
    "lane": { "key": "Lane", "offset": 3 },
    "racer": { "key": "Skaters", "offset": 3 },
    "affiliation": { "key": "Club", "offset": 3 }
  }
}"#,
    )
    .unwrap()
}

/// Short windows so tests do not wait on production delays
pub fn fast_timing() -> WatchTiming {
    WatchTiming {
        debounce_window: Duration::from_millis(200),
        settle_delay: Duration::from_millis(50),
        cleanup_delay: Duration::from_millis(100),
        seed_timeout: Duration::from_secs(5),
        roster_timeout: Duration::from_secs(5),
    }
}

/// GCPV export text for one race with the given racers
pub fn export_text(race_number: &str, racers: &[(&str, &str)]) -> String {
    racers
        .iter()
        .map(|(lane, racer)| {
            format!(
                "Event :,500 111M,Open Women A female,Stage :,Final,Race,{},Lane,Skaters,Club,{},\"{}\",Club\n",
                race_number, lane, racer
            )
        })
        .collect()
}

/// Wait for the first event accepted by `matches`
pub async fn wait_for<F>(receiver: &mut broadcast::Receiver<WatchEvent>, mut matches: F) -> Option<WatchEvent>
where
    F: FnMut(&WatchEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match receiver.recv().await {
                Ok(event) if matches(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
