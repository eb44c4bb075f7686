//! Tests for race list rendering

use super::*;
use crate::app::services::evt::{format_laps, parse_lines, render_evt};

#[test]
fn test_render_single_race() {
    let text = render_evt(&[race("21A", "Title A", 4.5, &[(200, 2), (100, 1)])]).unwrap();
    assert_eq!(text, "21A,,,Title A,,,,,,,,,4.5\n,100,1\n,200,2\n\n");
}

#[test]
fn test_render_empty_list_is_single_line_break() {
    assert_eq!(render_evt(&[]).unwrap(), "\n");
}

#[test]
fn test_render_sorts_races_and_orders_racers_by_lane() {
    let races = vec![
        race("10A", "Ten", 5.0, &[(3, 1)]),
        race("2B", "Two B", 4.5, &[(9, 2), (8, 2), (1, 1)]),
        race("2A", "Two A", 4.5, &[]),
    ];

    let text = render_evt(&races).unwrap();
    assert_eq!(
        text,
        "2A,,,Two A,,,,,,,,,4.5\n\
         2B,,,Two B,,,,,,,,,4.5\n,1,1\n,8,2\n,9,2\n\
         10A,,,Ten,,,,,,,,,5\n,3,1\n\n"
    );
}

#[test]
fn test_title_quoted_only_when_needed() {
    let text = render_evt(&[race("1A", "Open (500 111M) Heat, 1", 4.5, &[])]).unwrap();
    assert_eq!(text, "1A,,,\"Open (500 111M) Heat, 1\",,,,,,,,,4.5\n\n");
}

#[test]
fn test_format_laps() {
    assert_eq!(format_laps(4.5), "4.5");
    assert_eq!(format_laps(13.5), "13.5");
    assert_eq!(format_laps(15.0), "15");
}

#[test]
fn test_rendered_races_parse_back_unchanged() {
    let races = vec![
        race("25A", "Open Men B (1500 111M) Heat, 2 +2", 13.5, &[(689, 1), (963, 2)]),
        race("3C", "Juvenile (\"A\") Final", 0.5, &[(4, 4)]),
        race("100Z", "", 50.0, &[]),
    ];

    let text = render_evt(&races).unwrap();
    let mut parsed = parse_lines(&lines(&text)).unwrap();
    let mut expected = races.clone();
    crate::app::services::race_number::sort_races(&mut expected);
    crate::app::services::race_number::sort_races(&mut parsed);

    assert_eq!(parsed, expected);
}
