//! Label+offset field extraction for GCPV export rows
//!
//! A field is addressed by the text of a label cell and a column offset,
//! so the same configuration keeps working when GCPV inserts or removes
//! columns between exports.

use crate::config::KeyFieldConfig;
use crate::{Error, Result};

/// Split one CSV row into trimmed cells
///
/// Standard quoting rules apply. A row that yields no record is a format
/// error.
pub fn parse_csv_row(row: &str) -> Result<Vec<String>> {
    if row.trim().is_empty() {
        return Err(Error::format("Row cannot be empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(row.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(|cell| cell.trim().to_string()).collect()),
        Some(Err(e)) => Err(Error::format(format!(
            "Error parsing GCPV export row: {}. Row: {}",
            e, row
        ))),
        None => Err(Error::format(format!("No data found in row: {}", row))),
    }
}

/// Read one logical field from a row's cells
pub fn extract_field(cells: &[String], field_name: &str, field: &KeyFieldConfig) -> Result<String> {
    let key_index = cells
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case(field.key.trim()))
        .ok_or_else(|| {
            Error::format(format!(
                "Key '{}' not found in row for field '{}'",
                field.key, field_name
            ))
        })?;

    let target = key_index as i64 + field.offset;
    if target < 0 || target >= cells.len() as i64 {
        return Err(Error::format(format!(
            "Target column index {} is out of bounds for field '{}'. Row has {} columns",
            target,
            field_name,
            cells.len()
        )));
    }

    let value = cells[target as usize].trim();

    Ok(match &field.suffix_stop_words {
        Some(words) if !words.is_empty() => strip_suffix_stop_word(value, words),
        _ => value.to_string(),
    })
}

/// Strip the longest stop word that is an exact, case-sensitive suffix
///
/// At most one stop word is removed; the remainder is trimmed.
pub fn strip_suffix_stop_word(value: &str, stop_words: &[String]) -> String {
    if value.trim().is_empty() {
        return value.to_string();
    }

    let longest = stop_words
        .iter()
        .filter(|word| !word.trim().is_empty())
        .filter(|word| value.ends_with(word.as_str()))
        .max_by_key(|word| word.len());

    match longest {
        Some(word) => value[..value.len() - word.len()].trim().to_string(),
        None => value.to_string(),
    }
}
