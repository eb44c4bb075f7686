//! Lap counts from free-text track parameters
//!
//! Track parameters look like `"1500 111M"`. The first known distance that
//! appears in the text is divided by the track length and rounded to one
//! decimal place.

use crate::constants::{
    DEFAULT_TRACK_LENGTH, RACE_DISTANCES, SHORT_TRACK_LENGTH, SHORT_TRACK_MARKER,
};
use crate::{Error, Result};

/// Track length implied by the parameters
pub fn track_length_for(track_params: &str) -> i64 {
    if track_params
        .to_ascii_lowercase()
        .contains(&SHORT_TRACK_MARKER.to_ascii_lowercase())
    {
        SHORT_TRACK_LENGTH
    } else {
        DEFAULT_TRACK_LENGTH
    }
}

/// First known distance mentioned in the parameters
pub fn distance_for(track_params: &str) -> Option<i64> {
    RACE_DISTANCES
        .iter()
        .copied()
        .find(|distance| track_params.contains(&distance.to_string()))
}

/// Laps for a race described by `track_params`, or 0 when no distance is found
pub fn calculate_laps(track_params: &str) -> f64 {
    if track_params.trim().is_empty() {
        return 0.0;
    }

    let track_length = track_length_for(track_params);
    match distance_for(track_params) {
        // Known distances and track lengths are positive, so this cannot fail
        Some(distance) => laps_for_distance(distance, track_length).unwrap_or(0.0),
        None => 0.0,
    }
}

/// `distance / track_length` rounded to one decimal, ties to even
pub fn laps_for_distance(distance: i64, track_length: i64) -> Result<f64> {
    if track_length == 0 {
        return Err(Error::format("Track length cannot be zero"));
    }
    if distance < 0 {
        return Err(Error::format(format!(
            "Distance cannot be negative: {}",
            distance
        )));
    }
    if track_length < 0 {
        return Err(Error::format(format!(
            "Track length cannot be negative: {}",
            track_length
        )));
    }

    let laps = distance as f64 / track_length as f64;
    Ok((laps * 10.0).round_ties_even() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_track_distances() {
        assert_eq!(calculate_laps("1500 111M"), 13.5);
        assert_eq!(calculate_laps("500 111m"), 4.5);
        assert_eq!(calculate_laps("777 111M"), 7.0);
        assert_eq!(calculate_laps("333m 111M"), 3.0);
    }

    #[test]
    fn test_default_track_length() {
        assert_eq!(calculate_laps("1000m"), 10.0);
        assert_eq!(calculate_laps("50 m relay"), 0.5);
        assert_eq!(track_length_for("1500"), 100);
        assert_eq!(track_length_for("1500 111M"), 111);
    }

    #[test]
    fn test_longer_distances_checked_first() {
        // "1500" also contains "500"
        assert_eq!(distance_for("1500 111M"), Some(1500));
        assert_eq!(distance_for("5000"), Some(5000));
    }

    #[test]
    fn test_blank_or_unknown_parameters_give_zero() {
        assert_eq!(calculate_laps(""), 0.0);
        assert_eq!(calculate_laps("   "), 0.0);
        assert_eq!(calculate_laps("Relay 111M"), 0.0);
    }

    #[test]
    fn test_laps_for_distance_rejects_invalid_input() {
        assert!(laps_for_distance(500, 0).is_err());
        assert!(laps_for_distance(-1, 100).is_err());
        assert!(laps_for_distance(500, -100).is_err());
        assert_eq!(laps_for_distance(0, 100).unwrap(), 0.0);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        assert_eq!(laps_for_distance(5000, 111).unwrap(), 45.0);
        assert_eq!(laps_for_distance(200, 111).unwrap(), 1.8);
        assert_eq!(laps_for_distance(25, 100).unwrap(), 0.2);
    }
}
