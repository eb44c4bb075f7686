//! Tests for label+offset field extraction

use super::*;
use crate::Error;
use crate::app::services::export_parser::{extract_field, parse_csv_row, strip_suffix_stop_word};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_csv_row_trims_and_unquotes() {
    let cells = parse_csv_row(r#"  a ,"b, c",  d  "#).unwrap();
    assert_eq!(cells, vec!["a", "b, c", "d"]);
}

#[test]
fn test_parse_csv_row_rejects_blank() {
    assert!(matches!(parse_csv_row("   ").unwrap_err(), Error::Format { .. }));
}

#[test]
fn test_extract_field_label_is_case_insensitive() {
    let cells = parse_csv_row("x,RACE,21A").unwrap();
    let value = extract_field(&cells, "race_number", &KeyFieldConfig::new("race", 1)).unwrap();
    assert_eq!(value, "21A");
}

#[test]
fn test_extract_field_uses_first_matching_label() {
    let cells = parse_csv_row("Race,1A,Race,2A").unwrap();
    let value = extract_field(&cells, "race_number", &KeyFieldConfig::new("Race", 1)).unwrap();
    assert_eq!(value, "1A");
}

#[test]
fn test_extract_field_missing_label() {
    let cells = parse_csv_row("a,b,c").unwrap();
    let err = extract_field(&cells, "lane", &KeyFieldConfig::new("Lane", 1)).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
    assert!(err.to_string().contains("Lane"));
}

#[test]
fn test_extract_field_offset_out_of_bounds() {
    let cells = parse_csv_row("Lane,1").unwrap();
    let err = extract_field(&cells, "lane", &KeyFieldConfig::new("Lane", 2)).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));

    let err = extract_field(&cells, "lane", &KeyFieldConfig::new("Lane", -1)).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

#[test]
fn test_stop_word_stripped_from_race_group() {
    let stops = words(&["male", "female", "Genders Mixed"]);
    assert_eq!(strip_suffix_stop_word("Open Men B male", &stops), "Open Men B");
    assert_eq!(strip_suffix_stop_word("Open Men B  male", &stops), "Open Men B");
}

#[test]
fn test_longest_stop_word_wins() {
    let stops = words(&["male", "female"]);
    assert_eq!(strip_suffix_stop_word("Open Women female", &stops), "Open Women");
}

#[test]
fn test_only_one_stop_word_removed() {
    let stops = words(&["male"]);
    assert_eq!(strip_suffix_stop_word("Group male male", &stops), "Group male");
}

#[test]
fn test_stop_words_are_case_sensitive() {
    let stops = words(&["male", "Genders Mixed"]);
    assert_eq!(strip_suffix_stop_word("Open MALE", &stops), "Open MALE");
    assert_eq!(strip_suffix_stop_word("Juvenile genders mixed", &stops), "Juvenile genders mixed");
    assert_eq!(strip_suffix_stop_word("Juvenile Genders Mixed", &stops), "Juvenile");
}

#[test]
fn test_no_stop_word_match_leaves_value() {
    let stops = words(&["male", ""]);
    assert_eq!(strip_suffix_stop_word("Masters", &stops), "Masters");
}

#[test]
fn test_extract_field_applies_stop_words() {
    let cells = parse_csv_row("Event :,500 111M,Open Men B male").unwrap();
    let config = KeyFieldConfig::new("Event :", 2).with_stop_words(["male", "female", "Genders Mixed"]);
    assert_eq!(extract_field(&cells, "race_group", &config).unwrap(), "Open Men B");
}
