//! Core GCPV export parser implementation
//!
//! Turns filtered export rows into per-race records. Any row that cannot be
//! read aborts the whole parse; no partial race list is returned.

use std::collections::HashMap;
use tracing::{debug, info};

use super::key_fields::{extract_field, parse_csv_row};
use crate::app::models::{ExportLane, ExportRace, ExportRow};
use crate::app::services::row_source::{RowSource, filter_blank_lines};
use crate::config::{AppConfig, KeyFieldConfig};
use crate::constants::key_fields;
use crate::{Error, Result};

/// Parser for GCPV export files
#[derive(Debug, Clone)]
pub struct ExportParser {
    key_fields: HashMap<String, KeyFieldConfig>,
}

impl ExportParser {
    /// Create a parser from a key-field table
    pub fn new(key_fields: HashMap<String, KeyFieldConfig>) -> Self {
        Self { key_fields }
    }

    /// Create a parser using the configured key fields
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.key_fields.clone())
    }

    /// Read, filter and parse all rows of a source
    pub fn parse(&self, source: &dyn RowSource) -> Result<Vec<ExportRace>> {
        let rows = filter_blank_lines(source.read_rows()?);
        debug!("Read {} export rows from {}", rows.len(), source.describe());

        let races = self.parse_rows(&rows)?;
        info!(
            "Parsed {} races from {}",
            races.len(),
            source.describe()
        );
        Ok(races)
    }

    /// Parse already-filtered rows and group them into races
    pub fn parse_rows(&self, rows: &[String]) -> Result<Vec<ExportRace>> {
        let parsed = rows
            .iter()
            .map(|row| self.parse_row(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(group_rows(parsed))
    }

    /// Extract every logical field from one row
    pub fn parse_row(&self, row: &str) -> Result<ExportRow> {
        let cells = parse_csv_row(row)?;

        Ok(ExportRow {
            race_number: self.field(&cells, key_fields::RACE_NUMBER)?,
            track_params: self.field(&cells, key_fields::TRACK_PARAMS)?,
            race_group: self.field(&cells, key_fields::RACE_GROUP)?,
            stage: self.field(&cells, key_fields::STAGE)?,
            lane: self.field(&cells, key_fields::LANE)?,
            racer: self.field(&cells, key_fields::RACER)?,
            affiliation: self.field(&cells, key_fields::AFFILIATION)?,
        })
    }

    fn field(&self, cells: &[String], name: &str) -> Result<String> {
        let config = self.key_fields.get(name).ok_or_else(|| {
            Error::configuration(format!("Key field '{}' not found in configuration", name))
        })?;
        extract_field(cells, name, config)
    }
}

/// Group rows by race number in first-encounter order
///
/// Race-level fields come from the first row of each group. Lanes are sorted
/// by numeric value (stable); lanes that are not integers sort last.
pub fn group_rows(rows: Vec<ExportRow>) -> Vec<ExportRace> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ExportRow>> = HashMap::new();

    for row in rows {
        if !groups.contains_key(&row.race_number) {
            order.push(row.race_number.clone());
        }
        groups.entry(row.race_number.clone()).or_default().push(row);
    }

    order
        .into_iter()
        .filter_map(|race_number| {
            let mut group = groups.remove(&race_number)?;
            group.sort_by_key(|row| lane_sort_key(&row.lane));

            let first = group.first()?;
            let (track_params, race_group, stage) = (
                first.track_params.clone(),
                first.race_group.clone(),
                first.stage.clone(),
            );

            let lanes = group
                .into_iter()
                .map(|row| ExportLane {
                    lane: row.lane,
                    racer: row.racer,
                    affiliation: row.affiliation,
                })
                .collect();

            Some(ExportRace {
                race_number,
                track_params,
                race_group,
                stage,
                lanes,
            })
        })
        .collect()
}

fn lane_sort_key(lane: &str) -> (bool, i64) {
    match lane.trim().parse::<i64>() {
        Ok(value) => (false, value),
        Err(_) => (true, 0),
    }
}
