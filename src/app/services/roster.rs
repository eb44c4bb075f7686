//! Roster (`Lynx.ppl`) loading and racer display strings
//!
//! The roster only decorates what is shown to the operator. Nothing in the
//! race list depends on it, so unreadable rows are skipped rather than
//! failing the load.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::app::models::RosterEntry;
use crate::app::services::row_source::{FileRowSource, RowSource, filter_comment_lines};

/// Read-only view of the roster shared with observers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterSnapshot {
    entries: Arc<HashMap<i32, RosterEntry>>,
}

impl RosterSnapshot {
    pub fn new(entries: HashMap<i32, RosterEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get(&self, racer_id: i32) -> Option<&RosterEntry> {
        self.entries.get(&racer_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one `id,last,first,affiliation` row
///
/// Returns `None` for rows with a non-numeric id or a blank name or
/// affiliation.
pub fn parse_roster_row(row: &str) -> Option<RosterEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(row.as_bytes());

    let record = reader.records().next()?.ok()?;
    let field = |index: usize| record.get(index).map(str::trim).unwrap_or_default();

    let id = field(0).parse::<i32>().ok()?;
    let (last_name, first_name, affiliation) = (field(1), field(2), field(3));
    if last_name.is_empty() || first_name.is_empty() || affiliation.is_empty() {
        return None;
    }

    Some(RosterEntry {
        id,
        last_name: last_name.to_string(),
        first_name: first_name.to_string(),
        affiliation: affiliation.to_string(),
    })
}

/// Parse all roster rows from a source; later rows for the same id win
pub fn parse_roster(source: &dyn RowSource) -> Result<RosterSnapshot> {
    let rows = filter_comment_lines(source.read_rows()?);
    let mut entries = HashMap::new();

    for (index, row) in rows.iter().enumerate() {
        match parse_roster_row(row) {
            Some(entry) => {
                entries.insert(entry.id, entry);
            }
            None => warn!("Problem parsing roster row {}: {}", index + 1, row),
        }
    }

    debug!("Parsed {} roster entries from {}", entries.len(), source.describe());
    Ok(RosterSnapshot::new(entries))
}

/// Load the roster file, treating a missing file as an empty roster
pub fn load_roster(path: &Path) -> Result<RosterSnapshot> {
    if !path.exists() {
        info!("No roster found at {}", path.display());
        return Ok(RosterSnapshot::default());
    }

    let roster = parse_roster(&FileRowSource::new(path))?;
    info!("Loaded {} racers from {}", roster.len(), path.display());
    Ok(roster)
}

/// One-line summary of a race's racers, ordered by lane
///
/// `"Racer 689 (Lane 1), Racer 963 (Lane 2)"`, or `"No racers"`.
pub fn describe_racers(racers: &HashMap<i32, i32>) -> String {
    if racers.is_empty() {
        return "No racers".to_string();
    }

    sorted_by_lane(racers)
        .into_iter()
        .map(|(id, lane)| format!("Racer {} (Lane {})", id, lane))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lane listing with roster names where known, one racer per line
///
/// `"Lane  1,  689 - Frankie Dixon (Hamilton)"`
pub fn describe_lanes(racers: &HashMap<i32, i32>, roster: &RosterSnapshot) -> String {
    sorted_by_lane(racers)
        .into_iter()
        .map(|(id, lane)| match roster.get(id) {
            Some(entry) => format!(
                "Lane {:>2}, {:>4} - {} {} ({})",
                lane, id, entry.first_name, entry.last_name, entry.affiliation
            ),
            None => format!("Lane {:>2}, {:>4}", lane, id),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn sorted_by_lane(racers: &HashMap<i32, i32>) -> Vec<(i32, i32)> {
    let mut entries: Vec<(i32, i32)> = racers.iter().map(|(&id, &lane)| (id, lane)).collect();
    entries.sort_by_key(|&(id, lane)| (lane, id));
    entries
}
