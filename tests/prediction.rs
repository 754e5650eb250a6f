use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use stride_terminal::predictor::{FALLBACK_TIME, parse_prediction_content, time_to_minutes};
use stride_terminal::state::{Activity, ConfidenceLevel};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn run(distance: f64, speed: f64) -> Activity {
    Activity {
        name: "Run".to_string(),
        activity_type: "Run".to_string(),
        distance,
        moving_time: 3600,
        elapsed_time: 3650,
        average_speed: speed,
        average_heartrate: None,
        total_elevation_gain: None,
    }
}

fn race_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 14).expect("valid date")
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 4)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

#[test]
fn well_formed_fixture_parses_verbatim() {
    let content = read_fixture("prediction_content.json");
    let runs = vec![run(10_000.0, 2.78), run(21_097.0, 2.8)];
    let prediction = parse_prediction_content(&content, &runs, race_date(), now());

    assert_eq!(prediction.predicted_time, "3:58");
    assert_eq!(prediction.confidence, 76);
    assert_eq!(prediction.level, ConfidenceLevel::High);
    assert_eq!(prediction.days_until_race, 9);
    assert!((prediction.training_volume_km - 31.097).abs() < 1e-9);
    assert!((prediction.longest_run_km - 21.097).abs() < 1e-9);
}

#[test]
fn malformed_content_yields_fallback_without_error() {
    let runs = vec![run(10_000.0, 2.78)];
    for content in ["", "not json", "{\"confidence\": 80}", "[1, 2, 3]"] {
        let prediction = parse_prediction_content(content, &runs, race_date(), now());
        assert_eq!(prediction.predicted_time, FALLBACK_TIME);
        assert_eq!(prediction.confidence, 0);
        assert_eq!(prediction.level, ConfidenceLevel::Low);
    }
}

#[test]
fn confidence_levels_bucket_on_exact_thresholds() {
    assert_eq!(ConfidenceLevel::from_confidence(80), ConfidenceLevel::High);
    assert_eq!(ConfidenceLevel::from_confidence(76), ConfidenceLevel::High);
    assert_eq!(ConfidenceLevel::from_confidence(75), ConfidenceLevel::Medium);
    assert_eq!(ConfidenceLevel::from_confidence(60), ConfidenceLevel::Medium);
    assert_eq!(ConfidenceLevel::from_confidence(51), ConfidenceLevel::Medium);
    assert_eq!(ConfidenceLevel::from_confidence(50), ConfidenceLevel::Low);
    assert_eq!(ConfidenceLevel::from_confidence(30), ConfidenceLevel::Low);
}

#[test]
fn average_pace_matches_speed_formula() {
    let runs = vec![run(10_000.0, 2.78)];
    let prediction = parse_prediction_content("broken", &runs, race_date(), now());
    assert_eq!(prediction.average_pace, "6.00 min/km");
}

#[test]
fn predicted_time_converts_to_minutes() {
    assert_eq!(time_to_minutes("3:58"), Some(238));
    assert_eq!(time_to_minutes("4:05"), Some(245));
    assert_eq!(time_to_minutes("nope"), None);
}
