use std::fs;
use std::path::PathBuf;

use stride_terminal::strava_fetch::{parse_activities_json, parse_token_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_activities_fixture_and_filters_runs() {
    let raw = read_fixture("strava_activities.json");
    let runs = parse_activities_json(&raw).expect("fixture should parse");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].name, "Morning Run");
    assert_eq!(runs[0].activity_type, "Run");
    assert!((runs[0].distance - 10012.4).abs() < 1e-9);
    assert_eq!(runs[0].moving_time, 3541);
    assert_eq!(runs[1].name, "Long Run");
    // The long run fixture carries no heartrate or elevation fields.
    assert!(runs[1].average_heartrate.is_none());
    assert!(runs[1].total_elevation_gain.is_none());
}

#[test]
fn activities_null_is_empty() {
    assert!(parse_activities_json("null").expect("null should parse").is_empty());
    assert!(parse_activities_json("  ").expect("blank should parse").is_empty());
    assert!(parse_activities_json("[]").expect("empty should parse").is_empty());
}

#[test]
fn activities_garbage_is_an_error() {
    assert!(parse_activities_json("{\"oops\": true}").is_err());
}

#[test]
fn parses_token_fixture() {
    let raw = read_fixture("strava_token.json");
    let token = parse_token_json(&raw).expect("fixture should parse");
    assert_eq!(token, "a9b8c7d6e5f4a9b8c7d6e5f4");
}

#[test]
fn token_without_access_token_is_an_error() {
    assert!(parse_token_json("{\"token_type\": \"Bearer\"}").is_err());
    assert!(parse_token_json("{\"access_token\": \"\"}").is_err());
}
