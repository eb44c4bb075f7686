//! GCPV export parser
//!
//! GCPV writes one flat CSV row per racer-in-race. Columns are not at fixed
//! positions: each logical field is found by searching the row for a label
//! cell and reading a configured number of columns to its right.
//!
//! ## Architecture
//!
//! - [`key_fields`] - CSV row splitting, label+offset lookup, stop-word stripping
//! - [`parser`] - Row parsing orchestration and grouping into races
//!
//! ## Usage
//!
//! ```rust
//! use gcpv_watcher::app::services::export_parser::ExportParser;
//! use gcpv_watcher::app::services::row_source::StaticRowSource;
//! use gcpv_watcher::config::KeyFieldConfig;
//! use std::collections::HashMap;
//!
//! # fn example(key_fields: HashMap<String, KeyFieldConfig>) -> gcpv_watcher::Result<()> {
//! let parser = ExportParser::new(key_fields);
//! let races = parser.parse(&StaticRowSource::new(["Race,21A,..."]))?;
//! println!("Parsed {} races", races.len());
//! # Ok(())
//! # }
//! ```

pub mod key_fields;
pub mod parser;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use key_fields::{extract_field, parse_csv_row, strip_suffix_stop_word};
pub use parser::{ExportParser, group_rows};
