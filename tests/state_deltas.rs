use chrono::NaiveDate;

use stride_terminal::state::{
    Activity, AppState, ConfidenceLevel, Delta, Prediction, apply_delta, countdown_text,
    days_until_race,
};

fn run(distance: f64, speed: f64) -> Activity {
    Activity {
        name: "Run".to_string(),
        activity_type: "Run".to_string(),
        distance,
        moving_time: 3000,
        elapsed_time: 3100,
        average_speed: speed,
        average_heartrate: Some(148.0),
        total_elevation_gain: Some(60.0),
    }
}

fn prediction() -> Prediction {
    Prediction {
        predicted_time: "3:58".to_string(),
        confidence: 76,
        level: ConfidenceLevel::High,
        days_until_race: 9,
        training_volume_km: 31.1,
        average_pace: "6.00 min/km".to_string(),
        longest_run_km: 21.1,
    }
}

#[test]
fn set_runs_recomputes_scores_and_clears_loading() {
    let mut state = AppState::new();
    assert!(state.runs_loading);
    assert_eq!(state.scores.speed, 30);

    apply_delta(&mut state, Delta::SetRuns(vec![run(42_200.0, 3.2)]));
    assert!(!state.runs_loading);
    assert_eq!(state.runs.len(), 1);
    assert_eq!(state.scores.endurance, 100);
}

#[test]
fn set_runs_clamps_table_scroll() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetRuns(vec![run(5_000.0, 3.0), run(8_000.0, 3.0), run(6_000.0, 3.0)]),
    );
    state.runs_scroll = 2;
    apply_delta(&mut state, Delta::SetRuns(vec![run(5_000.0, 3.0)]));
    assert_eq!(state.runs_scroll, 0);
}

#[test]
fn runs_failure_surfaces_error_and_log() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::RunsFailed("timeout".to_string()));
    assert!(!state.runs_loading);
    assert_eq!(state.runs_error.as_deref(), Some("timeout"));
    assert!(state.logs.iter().any(|line| line.contains("timeout")));
}

#[test]
fn prediction_cycle_toggles_busy_flag() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::PredictionStarted);
    assert!(state.predicting);
    apply_delta(&mut state, Delta::SetPrediction(prediction()));
    assert!(!state.predicting);
    assert_eq!(
        state.prediction.as_ref().map(|p| p.predicted_time.as_str()),
        Some("3:58")
    );
}

#[test]
fn prediction_failure_logs_and_clears_busy() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::PredictionStarted);
    apply_delta(&mut state, Delta::PredictionFailed("http 500".to_string()));
    assert!(!state.predicting);
    assert!(state.prediction.is_none());
    assert!(state.logs.iter().any(|line| line.contains("http 500")));
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for idx in 0..300 {
        apply_delta(&mut state, Delta::Log(format!("line {idx}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 100"));
}

#[test]
fn countdown_formats_remaining_time() {
    let race = NaiveDate::from_ymd_opt(2025, 9, 14).expect("valid date");
    let now = NaiveDate::from_ymd_opt(2025, 9, 12)
        .expect("valid date")
        .and_hms_opt(22, 30, 0)
        .expect("valid time");
    assert_eq!(countdown_text(race, now), "1d 1h 30m");
    assert_eq!(days_until_race(race, now), 1);
}

#[test]
fn past_race_date_is_race_day_not_negative() {
    let race = NaiveDate::from_ymd_opt(2025, 9, 14).expect("valid date");
    let after = NaiveDate::from_ymd_opt(2025, 9, 20)
        .expect("valid date")
        .and_hms_opt(8, 0, 0)
        .expect("valid time");
    assert_eq!(countdown_text(race, after), "Race day!");
    assert_eq!(days_until_race(race, after), 0);
}
