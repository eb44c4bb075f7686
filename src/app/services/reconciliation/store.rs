//! Authoritative race state across all sources
//!
//! Races are kept in buckets keyed by where they came from. The seed bucket
//! holds races read from the persisted race list at startup and is folded
//! with every reconciliation, so it always reflects the latest merged truth.
//! Each export file has its own bucket holding exactly the races of its last
//! successful parse.
//!
//! Every mutation and every write of the race list happens under one lock.
//! Changes are made on a copy of the state and committed only after the race
//! list has been written, so a failed write leaves the store unchanged.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use super::output::write_race_list;
use super::stats::ProcessingStats;
use crate::app::models::Race;
use crate::app::services::evt::EvtParser;
use crate::app::services::race_number::sort_races;
use crate::app::services::roster::RosterSnapshot;
use crate::app::services::row_source::FileRowSource;
use crate::app::services::watcher::events::WatchEvent;
use crate::app::services::watcher::timeout::with_timeout;
use crate::config::{AppConfig, OutputEncoding};
use crate::constants::{EVT_FILE_NAME, MIN_EVT_FILE_BYTES, SEED_LOAD_TIMEOUT};
use crate::{Error, Result};

/// Origin of a bucket of races
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    /// Races that were in the persisted race list before any file claimed them
    Seed,
    /// Races from one export file, by absolute path
    File(PathBuf),
}

impl SourceKey {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

impl From<&Path> for SourceKey {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    buckets: HashMap<SourceKey, Vec<Race>>,
    /// Reconcile counter per file bucket; later reconciles win in the merged view
    generations: HashMap<SourceKey, u64>,
    next_generation: u64,
    seed_loaded: bool,
    roster: RosterSnapshot,
}

impl StoreState {
    fn seed(&self) -> &[Race] {
        self.buckets
            .get(&SourceKey::Seed)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a file bucket other than `except` holds `race_number`
    fn claimed_by_other_file(&self, race_number: &str, except: &SourceKey) -> bool {
        self.buckets.iter().any(|(key, races)| {
            key != &SourceKey::Seed
                && key != except
                && races.iter().any(|race| race.race_number() == race_number)
        })
    }

    fn insert_bucket(&mut self, source: &SourceKey, races: Vec<Race>) {
        if *source != SourceKey::Seed {
            self.next_generation += 1;
            self.generations.insert(source.clone(), self.next_generation);
        }
        self.buckets.insert(source.clone(), races);
    }

    fn remove_bucket(&mut self, source: &SourceKey) -> bool {
        self.generations.remove(source);
        self.buckets.remove(source).is_some()
    }

    /// Seed overlaid by file buckets, most recently reconciled last
    ///
    /// When two files list the same race number, the file reconciled most
    /// recently supplies the race.
    fn merged(&self) -> Vec<Race> {
        let mut by_number: HashMap<&str, &Race> = self
            .seed()
            .iter()
            .map(|race| (race.race_number(), race))
            .collect();

        let files: BTreeMap<u64, &Vec<Race>> = self
            .buckets
            .iter()
            .filter(|(key, _)| **key != SourceKey::Seed)
            .map(|(key, races)| (self.generations.get(key).copied().unwrap_or_default(), races))
            .collect();
        for races in files.values() {
            for race in races.iter() {
                by_number.insert(race.race_number(), race);
            }
        }

        let mut races: Vec<Race> = by_number.into_values().cloned().collect();
        sort_races(&mut races);
        races
    }
}

/// Keep the last race for each race number, in first-seen position
fn dedupe_by_race_number(races: Vec<Race>, source: &SourceKey) -> Vec<Race> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Race> = Vec::with_capacity(races.len());
    let mut duplicates: Vec<String> = Vec::new();

    for race in races {
        match positions.get(race.race_number()) {
            Some(&index) => {
                warn!(
                    "Duplicate race number found: {} - keeping last occurrence",
                    race.race_number()
                );
                if !duplicates.iter().any(|n| n == race.race_number()) {
                    duplicates.push(race.race_number().to_string());
                }
                unique[index] = race;
            }
            None => {
                positions.insert(race.race_number().to_string(), unique.len());
                unique.push(race);
            }
        }
    }

    if !duplicates.is_empty() {
        warn!(
            "Found {} duplicate race numbers in {:?}: {}",
            duplicates.len(),
            source,
            duplicates.join(", ")
        );
    }
    unique
}

/// Compare a new batch with the source's previous batch
fn diff_races(previous: &[Race], incoming: &[Race]) -> ProcessingStats {
    let before: HashMap<&str, &Race> = previous
        .iter()
        .map(|race| (race.race_number(), race))
        .collect();
    let now: HashSet<&str> = incoming.iter().map(Race::race_number).collect();

    let mut stats = ProcessingStats::new();
    for race in incoming {
        let number = race.race_number().to_string();
        match before.get(race.race_number()) {
            None => stats.added.push(number),
            Some(old) if *old != race => stats.updated.push(number),
            Some(_) => stats.unchanged.push(number),
        }
    }
    stats.removed = previous
        .iter()
        .filter(|race| !now.contains(race.race_number()))
        .map(|race| race.race_number().to_string())
        .collect();
    stats
}

/// Single writer of the persisted race list
#[derive(Debug)]
pub struct ReconciliationStore {
    evt_path: PathBuf,
    backup_dir: PathBuf,
    encoding: OutputEncoding,
    seed_timeout: Duration,
    state: Mutex<StoreState>,
    events: broadcast::Sender<WatchEvent>,
}

impl ReconciliationStore {
    /// Create a store writing `Lynx.evt` in `output_dir`
    pub fn new(output_dir: &Path, config: &AppConfig, events: broadcast::Sender<WatchEvent>) -> Self {
        Self {
            evt_path: output_dir.join(EVT_FILE_NAME),
            backup_dir: config.backup_dir_for(output_dir),
            encoding: config.output_encoding,
            seed_timeout: SEED_LOAD_TIMEOUT,
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    /// Override the bound on parsing the persisted race list
    pub fn with_seed_timeout(mut self, timeout: Duration) -> Self {
        self.seed_timeout = timeout;
        self
    }

    pub fn evt_path(&self) -> &Path {
        &self.evt_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Read the persisted race list into the seed bucket, once
    ///
    /// A parse that exceeds the timeout is fatal and leaves the seed unloaded.
    /// Any other failure is logged and the seed starts empty.
    pub async fn load_seed_once(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.seed_loaded {
            return Ok(());
        }

        let races = match self.read_seed().await {
            Ok(races) => races,
            Err(e @ Error::Timeout { .. }) => return Err(e),
            Err(e) => {
                error!(
                    "Error loading existing races from {}: {}",
                    self.evt_path.display(),
                    e
                );
                Vec::new()
            }
        };

        info!("Loaded {} existing races from {}", races.len(), self.evt_path.display());
        state.buckets.insert(SourceKey::Seed, races);
        state.seed_loaded = true;
        Ok(())
    }

    async fn read_seed(&self) -> Result<Vec<Race>> {
        let size = match tokio::fs::metadata(&self.evt_path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => {
                info!("No existing race list found, starting with empty race list");
                return Ok(Vec::new());
            }
        };
        if size < MIN_EVT_FILE_BYTES {
            info!("Race list exists but appears to be empty, starting with empty race list");
            return Ok(Vec::new());
        }

        let path = self.evt_path.clone();
        let parse = tokio::task::spawn_blocking(move || EvtParser::new().parse(&FileRowSource::new(path)));

        with_timeout("Parsing existing race list", self.seed_timeout, async {
            parse
                .await
                .map_err(|e| Error::processing_interrupted(format!("Race list parse task failed: {}", e)))?
        })
        .await
    }

    /// Replace the races of `source` and rewrite the race list
    pub async fn reconcile(&self, source: &SourceKey, races: Vec<Race>) -> Result<ProcessingStats> {
        let incoming = dedupe_by_race_number(races, source);

        let mut state = self.state.lock().await;
        let previous = state.buckets.get(source).map(Vec::as_slice).unwrap_or_default();
        let stats = diff_races(previous, &incoming);

        let mut next = state.clone();
        if *source != SourceKey::Seed {
            let orphaned: HashSet<String> = stats
                .removed
                .iter()
                .filter(|number| !next.claimed_by_other_file(number, source))
                .cloned()
                .collect();

            let seed = next.buckets.entry(SourceKey::Seed).or_default();
            seed.retain(|race| !orphaned.contains(race.race_number()));
            for race in &incoming {
                match seed.iter_mut().find(|r| r.race_number() == race.race_number()) {
                    Some(existing) => *existing = race.clone(),
                    None => seed.push(race.clone()),
                }
            }
        }
        next.insert_bucket(source, incoming);

        self.persist(&next).await?;
        *state = next;
        debug!("Reconciled {:?}: {}", source, stats.detailed());
        Ok(stats)
    }

    /// Forget the races of `source` and rewrite the race list
    ///
    /// The races stay in the seed bucket until [`Self::cleanup`] runs.
    pub async fn remove(&self, source: &SourceKey) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let removed = next.remove_bucket(source);

        self.persist(&next).await?;
        *state = next;
        if removed {
            debug!("Removed bucket {:?}", source);
        }
        Ok(())
    }

    /// Drop races not claimed by any active source
    ///
    /// Returns the dropped race numbers, sorted. The race list is rewritten
    /// only when something changed.
    pub async fn cleanup(&self, active: &[PathBuf]) -> Result<Vec<String>> {
        let active: HashSet<SourceKey> = active.iter().map(|p| SourceKey::from(p.as_path())).collect();

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let bucket_count = next.buckets.len();
        next.buckets
            .retain(|key, _| *key == SourceKey::Seed || active.contains(key));
        next.generations.retain(|key, _| active.contains(key));
        let dropped_buckets = bucket_count - next.buckets.len();

        let claimed: HashSet<String> = next
            .buckets
            .iter()
            .filter(|(key, _)| **key != SourceKey::Seed)
            .flat_map(|(_, races)| races.iter().map(|race| race.race_number().to_string()))
            .collect();

        let mut dropped = Vec::new();
        if let Some(seed) = next.buckets.get_mut(&SourceKey::Seed) {
            seed.retain(|race| {
                let keep = claimed.contains(race.race_number());
                if !keep {
                    dropped.push(race.clone());
                }
                keep
            });
        }
        sort_races(&mut dropped);
        let dropped: Vec<String> = dropped.iter().map(|race| race.race_number().to_string()).collect();

        if dropped.is_empty() && dropped_buckets == 0 {
            debug!("Cleanup found no orphaned races");
            return Ok(dropped);
        }

        info!(
            "Cleanup removed {} orphaned races and {} inactive sources",
            dropped.len(),
            dropped_buckets
        );
        self.persist(&next).await?;
        *state = next;
        Ok(dropped)
    }

    /// Current merged race list, sorted by race number
    pub async fn all_races(&self) -> Vec<Race> {
        self.state.lock().await.merged()
    }

    /// Races currently attributed to `source`
    pub async fn races_for(&self, source: &SourceKey) -> Vec<Race> {
        self.state
            .lock()
            .await
            .buckets
            .get(source)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the roster sent with update notifications
    pub async fn set_roster(&self, roster: RosterSnapshot) {
        self.state.lock().await.roster = roster;
    }

    pub async fn roster(&self) -> RosterSnapshot {
        self.state.lock().await.roster.clone()
    }

    /// Whether the persisted race list has been read into the seed
    pub async fn is_seed_loaded(&self) -> bool {
        self.state.lock().await.seed_loaded
    }

    /// Write the merged list of `state` and notify; caller holds the lock
    async fn persist(&self, state: &StoreState) -> Result<()> {
        let races = state.merged();
        write_race_list(&self.evt_path, &self.backup_dir, self.encoding, &races).await?;

        let event = WatchEvent::RacesUpdated {
            races: Arc::new(races),
            roster: state.roster.clone(),
        };
        if self.events.send(event).is_err() {
            debug!("No subscribers for race list updates");
        }
        Ok(())
    }
}
