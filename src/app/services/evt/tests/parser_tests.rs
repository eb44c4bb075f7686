//! Tests for the race list parser

use super::*;
use crate::Error;
use crate::app::services::evt::{EvtParser, is_race_info_line, parse_lines};
use crate::app::services::row_source::StaticRowSource;

#[test]
fn test_parse_race_with_racers() {
    let races = parse_lines(&lines("21A,,,\"Title A\",,,,,,,,,4.5\n,100,1\n,200,2")).unwrap();

    assert_eq!(races.len(), 1);
    assert_eq!(races[0].race_number(), "21A");
    assert_eq!(races[0].title(), "Title A");
    assert_eq!(races[0].laps(), 4.5);
    assert_eq!(races[0].racers(), &HashMap::from([(100, 1), (200, 2)]));
}

#[test]
fn test_races_are_sorted_by_race_number() {
    let text = "10A,,,Ten,,,,,,,,,5\n,1,1\n9B,,,Nine B,,,,,,,,,4\n9A,,,Nine A,,,,,,,,,4\n";
    let races = parse_lines(&lines(text)).unwrap();

    let order: Vec<&str> = races.iter().map(|r| r.race_number()).collect();
    assert_eq!(order, vec!["9A", "9B", "10A"]);
    assert_eq!(races[2].racers().len(), 1);
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    let source = StaticRowSource::from_text(
        "; FinishLynx race list\n\n1A,,,Race,,,,,,,,,9\n  # lane one\n,7,1\n\n",
    );
    let races = EvtParser::new().parse(&source).unwrap();

    assert_eq!(races.len(), 1);
    assert_eq!(races[0].racers(), &HashMap::from([(7, 1)]));
}

#[test]
fn test_empty_input_yields_no_races() {
    assert!(parse_lines(&[]).unwrap().is_empty());
    let source = StaticRowSource::from_text("; only a comment\n");
    assert!(EvtParser::new().parse(&source).unwrap().is_empty());
}

#[test]
fn test_lines_before_first_race_are_ignored() {
    let races = parse_lines(&lines(",5,5\n2A,,,Two,,,,,,,,,3\n")).unwrap();
    assert_eq!(races.len(), 1);
    assert!(races[0].racers().is_empty());
}

#[test]
fn test_malformed_race_info_line_is_format_error() {
    let err = parse_lines(&lines("2a,,,Two,,,,,,,,,3\n")).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

#[test]
fn test_short_race_info_line_is_format_error() {
    let err = parse_lines(&lines("2A,,,Two\n")).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
}

#[test]
fn test_invalid_laps_is_format_error() {
    for laps in ["four", "", "NaN", "inf"] {
        let text = format!("2A,,,Two,,,,,,,,,{}\n", laps);
        let err = parse_lines(&lines(&text)).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "laps '{laps}' should fail");
    }
}

#[test]
fn test_invalid_racer_line_is_format_error() {
    for racer in [",abc,1", ",1,x", ",1"] {
        let text = format!("2A,,,Two,,,,,,,,,3\n{}\n", racer);
        let err = parse_lines(&lines(&text)).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "'{racer}' should fail");
    }
}

#[test]
fn test_quoted_title_with_comma() {
    let races = parse_lines(&lines("3A,,,\"Open (500 111M) Heat, 1\",,,,,,,,,4.5\n")).unwrap();
    assert_eq!(races[0].title(), "Open (500 111M) Heat, 1");
}

#[test]
fn test_is_race_info_line() {
    assert!(is_race_info_line("21A,,,Title,,,,,,,,,4"));
    assert!(is_race_info_line("\"21A\",,,Title,,,,,,,,,4"));
    assert!(is_race_info_line("  21A ,x"));
    assert!(!is_race_info_line(",100,1"));
    assert!(!is_race_info_line("21AB,,,Title"));
}

#[test]
fn test_duplicate_racer_lines_last_wins() {
    let races = parse_lines(&lines("1A,,,T,,,,,,,,,2\n,5,1\n,5,3\n")).unwrap();
    assert_eq!(races[0].racers(), &HashMap::from([(5, 3)]));
}
