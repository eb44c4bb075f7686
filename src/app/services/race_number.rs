//! Race number parsing and ordering
//!
//! Race numbers are digits followed by one uppercase letter (`"21A"`). They
//! order numerically first, so `"9A"` sorts before `"10A"`, then by letter.
//! Spellings of the same number (`"01A"`, `"1A"`) are distinct race numbers
//! and fall back to plain string order.

use crate::app::models::Race;
use crate::constants::RACE_NUMBER_PATTERN;
use crate::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

fn race_number_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(RACE_NUMBER_PATTERN).expect("race number pattern is valid"))
}

/// Parsed race number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaceNumber {
    pub number: u32,
    pub letter: char,
}

impl RaceNumber {
    /// Parse `"<digits><A-Z>"`
    pub fn parse(value: &str) -> Result<Self> {
        let captures = race_number_regex()
            .captures(value)
            .ok_or_else(|| Error::format(format!("Invalid race number format: '{}'", value)))?;

        let number = captures[1].parse::<u32>().map_err(|_| {
            Error::format(format!("Race number '{}' is out of range", value))
        })?;
        let letter = captures[2]
            .chars()
            .next()
            .ok_or_else(|| Error::format(format!("Invalid race number format: '{}'", value)))?;

        Ok(Self { number, letter })
    }

    /// Whether `value` is a well-formed race number
    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_ok()
    }
}

impl fmt::Display for RaceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter)
    }
}

/// Compare two race number strings
pub fn compare_race_numbers(a: &str, b: &str) -> Result<Ordering> {
    Ok(RaceNumber::parse(a)?
        .cmp(&RaceNumber::parse(b)?)
        .then_with(|| a.cmp(b)))
}

/// Compare with absent values sorting before any race number
pub fn compare_optional(a: Option<&str>, b: Option<&str>) -> Result<Ordering> {
    match (a, b) {
        (None, None) => Ok(Ordering::Equal),
        (None, Some(_)) => Ok(Ordering::Less),
        (Some(_), None) => Ok(Ordering::Greater),
        (Some(a), Some(b)) => compare_race_numbers(a, b),
    }
}

/// Order two races by race number
pub fn compare_races(a: &Race, b: &Race) -> Ordering {
    a.number()
        .cmp(&b.number())
        .then_with(|| a.race_number().cmp(b.race_number()))
}

/// Sort races in place by race number
pub fn sort_races(races: &mut [Race]) {
    races.sort_by(compare_races);
}
