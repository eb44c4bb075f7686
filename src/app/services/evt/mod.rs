//! FinishLynx race list (`Lynx.evt`) format
//!
//! The race list is a line-oriented, two-level CSV format: a 13-field
//! race-info record followed by zero or more 3-field racer records, repeated
//! for each race.
//!
//! ```text
//! 21A,,,Open Men B (1500 111M) Heat,,,,,,,,,13.5
//! ,689,1
//! ,963,2
//! ```
//!
//! - [`parser`] - Reads race lists, failing the whole parse on malformed lines
//! - [`writer`] - Renders sorted race lists

pub mod parser;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use parser::{EvtParser, is_race_info_line, parse_lines};
pub use writer::{format_laps, render_evt};
