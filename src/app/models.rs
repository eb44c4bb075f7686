//! Data models for race processing
//!
//! This module contains the normalized race record written to `Lynx.evt`,
//! the intermediate records produced by the GCPV export parser, and the
//! display-only roster entry.

use crate::app::services::race_number::RaceNumber;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Race
// =============================================================================

/// A race as stored in the persisted race list
///
/// Races are immutable once constructed. A source that re-supplies a race
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    race_number: String,
    title: String,
    laps: f64,
    /// Racer id to lane
    racers: HashMap<i32, i32>,
}

impl Race {
    /// Create a new race, validating the race number and lap count
    pub fn new(
        race_number: impl Into<String>,
        title: impl Into<String>,
        laps: f64,
        racers: HashMap<i32, i32>,
    ) -> Result<Self> {
        let race_number = race_number.into();
        RaceNumber::parse(&race_number)?;

        if !laps.is_finite() {
            return Err(Error::format(format!(
                "Invalid number of laps {} for race {}",
                laps, race_number
            )));
        }

        Ok(Self {
            race_number,
            title: title.into(),
            laps,
            racers,
        })
    }

    pub fn race_number(&self) -> &str {
        &self.race_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn laps(&self) -> f64 {
        self.laps
    }

    pub fn racers(&self) -> &HashMap<i32, i32> {
        &self.racers
    }

    /// Parsed race number; always valid for a constructed race
    pub fn number(&self) -> RaceNumber {
        RaceNumber::parse(&self.race_number)
            .unwrap_or_else(|_| unreachable!("race number validated on construction"))
    }

    /// `(racer_id, lane)` pairs ordered by lane, then racer id
    pub fn racers_by_lane(&self) -> Vec<(i32, i32)> {
        let mut entries: Vec<(i32, i32)> = self.racers.iter().map(|(&id, &lane)| (id, lane)).collect();
        entries.sort_by_key(|&(id, lane)| (lane, id));
        entries
    }
}

// =============================================================================
// GCPV Export Records
// =============================================================================

/// One lane assignment read from a GCPV export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLane {
    /// Raw lane text
    pub lane: String,
    /// Raw racer text, `"{id} {last_name},{first_name}"`
    pub racer: String,
    pub affiliation: String,
}

/// All lanes of one race, grouped from export rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRace {
    pub race_number: String,
    pub track_params: String,
    pub race_group: String,
    pub stage: String,
    /// Ascending by numeric lane value
    pub lanes: Vec<ExportLane>,
}

/// Flat per-row record before grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub race_number: String,
    pub track_params: String,
    pub race_group: String,
    pub stage: String,
    pub lane: String,
    pub racer: String,
    pub affiliation: String,
}

// =============================================================================
// Roster
// =============================================================================

/// Racer details from the roster file, used for display only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: i32,
    pub last_name: String,
    pub first_name: String,
    pub affiliation: String,
}
