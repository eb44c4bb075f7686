//! Test utilities for GCPV export parser testing
//!
//! Builds rows in the layout GCPV produces: label cells followed by their
//! values, with the lane block after the header labels.

use crate::config::KeyFieldConfig;
use crate::constants::key_fields;
use std::collections::HashMap;

// Test modules
mod key_field_tests;

/// Key-field table matching [`export_row`]
pub fn test_key_fields() -> HashMap<String, KeyFieldConfig> {
    HashMap::from([
        (key_fields::TRACK_PARAMS.to_string(), KeyFieldConfig::new("Event :", 1)),
        (
            key_fields::RACE_GROUP.to_string(),
            KeyFieldConfig::new("Event :", 2).with_stop_words(["male", "female", "Genders Mixed"]),
        ),
        (key_fields::STAGE.to_string(), KeyFieldConfig::new("Stage :", 1)),
        (key_fields::RACE_NUMBER.to_string(), KeyFieldConfig::new("Race", 1)),
        (key_fields::LANE.to_string(), KeyFieldConfig::new("Lane", 3)),
        (key_fields::RACER.to_string(), KeyFieldConfig::new("Skaters", 3)),
        (key_fields::AFFILIATION.to_string(), KeyFieldConfig::new("Club", 3)),
    ])
}

/// One export row for a racer in a 1500m race on the 111m track
pub fn export_row(race_number: &str, lane: &str, racer: &str, club: &str) -> String {
    format!(
        "Event :,1500 111M,Open Men B  male,Stage :,\"Heat, 2 +2\",Race,{},Lane,Skaters,Club,{},\"{}\",{}",
        race_number, lane, racer, club
    )
}
