//! Test utilities for race list parsing and writing

use crate::app::models::Race;
use std::collections::HashMap;

// Test modules
mod parser_tests;
mod writer_tests;

/// Build a race from `(racer_id, lane)` pairs
pub fn race(number: &str, title: &str, laps: f64, racers: &[(i32, i32)]) -> Race {
    Race::new(number, title, laps, racers.iter().copied().collect::<HashMap<_, _>>()).unwrap()
}

/// Split text into owned lines
pub fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
