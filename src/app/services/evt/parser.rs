//! Race list parser
//!
//! Comment lines are removed by the caller; blank lines are skipped. Every line that
//! follows a race-info line, up to the next race-info line, is a racer line
//! of that race.

use csv::StringRecord;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::app::models::Race;
use crate::app::services::race_number::{RaceNumber, sort_races};
use crate::app::services::row_source::{RowSource, filter_comment_lines};
use crate::constants::{RACE_INFO_FIELD_COUNT, race_info_fields, racer_fields};
use crate::{Error, Result};

/// Parser for `Lynx.evt` race lists
#[derive(Debug, Clone, Copy, Default)]
pub struct EvtParser;

impl EvtParser {
    pub fn new() -> Self {
        Self
    }

    /// Read, filter and parse a race list
    pub fn parse(&self, source: &dyn RowSource) -> Result<Vec<Race>> {
        let lines = filter_comment_lines(source.read_rows()?);
        let races = parse_lines(&lines)?;
        info!("Parsed {} races from {}", races.len(), source.describe());
        Ok(races)
    }
}

/// Races under construction while scanning lines
struct PendingRace {
    race_number: String,
    title: String,
    laps: f64,
    racers: HashMap<i32, i32>,
}

impl PendingRace {
    fn finish(self) -> Result<Race> {
        Race::new(self.race_number, self.title, self.laps, self.racers)
    }
}

/// Parse filtered lines into races sorted by race number
pub fn parse_lines(lines: &[String]) -> Result<Vec<Race>> {
    let mut races = Vec::new();
    let mut current: Option<PendingRace> = None;

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = read_record(line)?;

        if is_race_info_record(&record) {
            if let Some(pending) = current.take() {
                races.push(pending.finish()?);
            }
            current = Some(parse_race_info(&record, line)?);
        } else if record.len() >= RACE_INFO_FIELD_COUNT {
            return Err(Error::format(format!(
                "Invalid race info line format. Line: {}",
                line
            )));
        } else if let Some(pending) = current.as_mut() {
            let (racer_id, lane) = parse_racer(&record, line)?;
            pending.racers.insert(racer_id, lane);
        } else {
            debug!("Ignoring line {} before the first race: {}", index + 1, line);
        }
    }

    if let Some(pending) = current.take() {
        races.push(pending.finish()?);
    }

    sort_races(&mut races);
    Ok(races)
}

/// Whether a line starts a race (first field is a race number)
pub fn is_race_info_line(line: &str) -> bool {
    read_record(line)
        .map(|record| is_race_info_record(&record))
        .unwrap_or(false)
}

fn is_race_info_record(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|field| RaceNumber::is_valid(field.trim().trim_matches('"').trim()))
        .unwrap_or(false)
}

fn read_record(line: &str) -> Result<StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(e)) => Err(Error::format(format!(
            "Error parsing race list line: {}. Line: {}",
            e, line
        ))),
        None => Err(Error::format(format!("Empty race list line: {}", line))),
    }
}

fn parse_race_info(record: &StringRecord, line: &str) -> Result<PendingRace> {
    if record.len() < RACE_INFO_FIELD_COUNT {
        return Err(Error::format(format!(
            "Race info line has {} fields, expected {}. Line: {}",
            record.len(),
            RACE_INFO_FIELD_COUNT,
            line
        )));
    }

    let field = |index: usize| record.get(index).unwrap_or_default().trim();

    let race_number = field(race_info_fields::RACE_NUMBER).trim_matches('"').trim();
    RaceNumber::parse(race_number)?;

    let laps_text = field(race_info_fields::LAPS);
    let laps = laps_text
        .parse::<f64>()
        .ok()
        .filter(|laps| laps.is_finite())
        .ok_or_else(|| {
            Error::format(format!(
                "Invalid number of laps format: '{}'. Line: {}",
                laps_text, line
            ))
        })?;

    Ok(PendingRace {
        race_number: race_number.to_string(),
        title: field(race_info_fields::TITLE).to_string(),
        laps,
        racers: HashMap::new(),
    })
}

fn parse_racer(record: &StringRecord, line: &str) -> Result<(i32, i32)> {
    let parse_int = |index: usize, what: &str| -> Result<i32> {
        let text = record.get(index).unwrap_or_default().trim();
        text.parse::<i32>().map_err(|_| {
            Error::format(format!("Invalid {} format: '{}'. Line: {}", what, text, line))
        })
    };

    let racer_id = parse_int(racer_fields::RACER_ID, "racer ID")?;
    let lane = parse_int(racer_fields::LANE, "lane")?;
    Ok((racer_id, lane))
}
