//! Race list writer
//!
//! Races are written sorted by race number, racers ordered by lane, with a
//! trailing line break after the last record.

use crate::app::models::Race;
use crate::app::services::race_number::sort_races;
use crate::constants::{RACE_INFO_FIELD_COUNT, race_info_fields};
use crate::{Error, Result};

/// Format a lap count the way it is stored (`4.5`, `13.5`, `15`)
pub fn format_laps(laps: f64) -> String {
    format!("{}", laps)
}

/// Render races as `Lynx.evt` text
pub fn render_evt(races: &[Race]) -> Result<String> {
    let mut sorted = races.to_vec();
    sort_races(&mut sorted);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for race in &sorted {
        let mut info = vec![String::new(); RACE_INFO_FIELD_COUNT];
        info[race_info_fields::RACE_NUMBER] = race.race_number().to_string();
        info[race_info_fields::TITLE] = race.title().to_string();
        info[race_info_fields::LAPS] = format_laps(race.laps());
        writer
            .write_record(&info)
            .map_err(|e| Error::csv(format!("Failed to write race {}", race.race_number()), e))?;

        for (racer_id, lane) in race.racers_by_lane() {
            writer
                .write_record([String::new(), racer_id.to_string(), lane.to_string()])
                .map_err(|e| {
                    Error::csv(
                        format!("Failed to write racer {} of race {}", racer_id, race.race_number()),
                        e,
                    )
                })?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::io("Failed to flush race list", e.into_error()))?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| Error::format(format!("Race list is not valid UTF-8: {}", e)))?;
    text.push('\n');
    Ok(text)
}
