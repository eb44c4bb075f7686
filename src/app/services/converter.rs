//! Conversion from GCPV export races to race list entries

use std::collections::HashMap;
use tracing::{debug, error, warn};

use crate::app::models::{ExportRace, Race};
use crate::app::services::lap_calculator::calculate_laps;
use crate::{Error, Result};

/// Title shown by the timing system, `"{race_group} ({track_params}) {stage}"`
pub fn race_title(race: &ExportRace) -> String {
    format!("{} ({}) {}", race.race_group, race.track_params, race.stage)
}

/// Racer id from `"{id} {last_name},{first_name}"`
///
/// The id is the text before the first space; a field without a space, or
/// one starting with a space, has no id.
pub fn parse_racer_id(racer: &str) -> Option<i32> {
    match racer.find(' ') {
        Some(index) if index > 0 => racer[..index].trim().parse().ok(),
        _ => None,
    }
}

/// Convert one export race
///
/// Lanes whose lane number or racer id cannot be read are skipped with a
/// warning. A racer id appearing twice keeps the last lane seen.
pub fn convert_race(race: &ExportRace) -> Result<Race> {
    let laps = calculate_laps(&race.track_params);
    if laps <= 0.0 {
        return Err(Error::conversion(format!(
            "Could not determine number of laps for race {} with track params: {}",
            race.race_number, race.track_params
        )));
    }

    let mut racers = HashMap::new();
    for entry in &race.lanes {
        let Ok(lane) = entry.lane.trim().parse::<i32>() else {
            warn!(
                "Could not parse lane number '{}' for racer '{}' in race {}",
                entry.lane, entry.racer, race.race_number
            );
            continue;
        };

        let Some(racer_id) = parse_racer_id(&entry.racer) else {
            warn!(
                "Could not parse racer ID from '{}' in race {}",
                entry.racer, race.race_number
            );
            continue;
        };

        if let Some(previous) = racers.insert(racer_id, lane) {
            debug!(
                "Racer {} listed twice in race {}; lane {} replaces lane {}",
                racer_id, race.race_number, lane, previous
            );
        }
    }

    Race::new(race.race_number.clone(), race_title(race), laps, racers)
}

/// Convert export races, skipping (and logging) the ones that fail
pub fn convert_races(races: &[ExportRace]) -> Vec<Race> {
    races
        .iter()
        .filter_map(|race| match convert_race(race) {
            Ok(converted) => Some(converted),
            Err(e) => {
                error!("Error converting race {}: {}", race.race_number, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::ExportLane;

    fn lane(lane: &str, racer: &str) -> ExportLane {
        ExportLane {
            lane: lane.to_string(),
            racer: racer.to_string(),
            affiliation: "Club".to_string(),
        }
    }

    fn export_race(number: &str, track_params: &str, lanes: Vec<ExportLane>) -> ExportRace {
        ExportRace {
            race_number: number.to_string(),
            track_params: track_params.to_string(),
            race_group: "Open Men B".to_string(),
            stage: "Heat, 2 +2".to_string(),
            lanes,
        }
    }

    #[test]
    fn test_convert_race() {
        let race = convert_race(&export_race(
            "25A",
            "1500 111M",
            vec![lane("1", "689 Dixon, Frankie"), lane("2", "963 White, Gale")],
        ))
        .unwrap();

        assert_eq!(race.race_number(), "25A");
        assert_eq!(race.title(), "Open Men B (1500 111M) Heat, 2 +2");
        assert_eq!(race.laps(), 13.5);
        assert_eq!(race.racers(), &HashMap::from([(689, 1), (963, 2)]));
    }

    #[test]
    fn test_zero_laps_is_conversion_error() {
        let err = convert_race(&export_race("1A", "Relay", vec![])).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_unparsable_lanes_are_skipped() {
        let race = convert_race(&export_race(
            "2A",
            "500 111M",
            vec![
                lane("1", "10 Good, Racer"),
                lane("x", "11 Bad, Lane"),
                lane("3", "NoId"),
                lane("4", " 12 Leading, Space"),
                lane("5", "abc Not, Number"),
                lane(" 6 ", "13 Padded, Lane"),
            ],
        ))
        .unwrap();

        assert_eq!(race.racers(), &HashMap::from([(10, 1), (13, 6)]));
    }

    #[test]
    fn test_duplicate_racer_id_last_lane_wins() {
        // Same racer in two lanes of one race keeps only the later lane
        let race = convert_race(&export_race(
            "3A",
            "500",
            vec![lane("1", "42 Twice, Listed"), lane("2", "42 Twice, Listed")],
        ))
        .unwrap();

        assert_eq!(race.racers(), &HashMap::from([(42, 2)]));
    }

    #[test]
    fn test_convert_races_skips_failures() {
        let races = convert_races(&[
            export_race("1A", "500 111M", vec![]),
            export_race("2A", "unknown", vec![]),
            export_race("bad", "500 111M", vec![]),
            export_race("3A", "1000", vec![]),
        ]);

        let numbers: Vec<&str> = races.iter().map(|r| r.race_number()).collect();
        assert_eq!(numbers, vec!["1A", "3A"]);
    }

    #[test]
    fn test_parse_racer_id() {
        assert_eq!(parse_racer_id("689 Dixon, Frankie"), Some(689));
        assert_eq!(parse_racer_id("689"), None);
        assert_eq!(parse_racer_id(" 689 Dixon"), None);
        assert_eq!(parse_racer_id(""), None);
    }
}
