use crate::state::{Activity, StatScores};

// Normalization anchors for the six 0-100 training scores: 3:00/km pace is
// full speed marks, 8:00/km is zero; 42.2km saturates endurance; the
// remaining caps saturate stamina, recovery and strength.
const PACE_FLOOR_MIN_KM: f64 = 3.0;
const PACE_CEIL_MIN_KM: f64 = 8.0;
const MARATHON_KM: f64 = 42.2;
const VOLUME_CAP_KM: f64 = 100.0;
const RUNS_PER_WEEK_CAP: f64 = 7.0;
const ELEVATION_CAP_M: f64 = 2000.0;
const PACE_VARIANCE_WEIGHT: f64 = 20.0;

// Every axis sits at this baseline until there is data to score.
const BASELINE_SCORE: u8 = 30;

pub fn calculate_scores(runs: &[Activity]) -> StatScores {
    if runs.is_empty() {
        return StatScores {
            speed: BASELINE_SCORE,
            endurance: BASELINE_SCORE,
            stamina: BASELINE_SCORE,
            recovery: BASELINE_SCORE,
            strength: BASELINE_SCORE,
            technique: BASELINE_SCORE,
        };
    }

    let paces: Vec<f64> = runs
        .iter()
        .filter_map(|run| pace_min_km(run.average_speed))
        .collect();

    let speed = match paces.iter().copied().reduce(f64::min) {
        Some(best) => {
            let span = PACE_CEIL_MIN_KM - PACE_FLOOR_MIN_KM;
            clamp_score((PACE_CEIL_MIN_KM - best) / span * 100.0)
        }
        None => 0,
    };

    let endurance = clamp_score(longest_run_km(runs) / MARATHON_KM * 100.0);
    let stamina = clamp_score(total_distance_km(runs) / VOLUME_CAP_KM * 100.0);
    let recovery = clamp_score(runs.len() as f64 / RUNS_PER_WEEK_CAP * 100.0);

    let total_elevation: f64 = runs
        .iter()
        .map(|run| run.total_elevation_gain.unwrap_or(0.0))
        .sum();
    let strength = clamp_score(total_elevation / ELEVATION_CAP_M * 100.0);

    let technique = if paces.is_empty() {
        0
    } else {
        let avg = paces.iter().sum::<f64>() / paces.len() as f64;
        let deviation =
            paces.iter().map(|pace| (pace - avg).abs()).sum::<f64>() / paces.len() as f64;
        clamp_score(100.0 - deviation * PACE_VARIANCE_WEIGHT)
    };

    StatScores {
        speed,
        endurance,
        stamina,
        recovery,
        strength,
        technique,
    }
}

pub fn total_distance_km(runs: &[Activity]) -> f64 {
    runs.iter().map(|run| run.distance).sum::<f64>() / 1000.0
}

pub fn longest_run_km(runs: &[Activity]) -> f64 {
    runs.iter()
        .map(|run| run.distance)
        .fold(0.0, f64::max)
        / 1000.0
}

// Minutes per km from a speed in m/s. Non-positive speeds carry no pace.
pub fn pace_min_km(average_speed: f64) -> Option<f64> {
    if average_speed > 0.0 {
        Some(1000.0 / average_speed / 60.0)
    } else {
        None
    }
}

pub fn average_pace_min_km(runs: &[Activity]) -> Option<f64> {
    let speeds: Vec<f64> = runs
        .iter()
        .map(|run| run.average_speed)
        .filter(|speed| *speed > 0.0)
        .collect();
    if speeds.is_empty() {
        return None;
    }
    let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
    pace_min_km(mean)
}

pub fn format_pace(pace: Option<f64>) -> String {
    match pace {
        Some(pace) => format!("{pace:.2} min/km"),
        None => "-".to_string(),
    }
}

pub fn format_duration(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    format!("{hours}h {minutes:02}m")
}

fn clamp_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(distance: f64, speed: f64, elevation: Option<f64>) -> Activity {
        Activity {
            name: "Morning Run".to_string(),
            activity_type: "Run".to_string(),
            distance,
            moving_time: 3600,
            elapsed_time: 3700,
            average_speed: speed,
            average_heartrate: Some(150.0),
            total_elevation_gain: elevation,
        }
    }

    #[test]
    fn empty_list_scores_baseline() {
        let scores = calculate_scores(&[]);
        for (_, value) in scores.rows() {
            assert_eq!(value, 30);
        }
    }

    #[test]
    fn pace_matches_speed_formula() {
        let pace = pace_min_km(2.78).expect("positive speed has a pace");
        assert!((pace - 1000.0 / 2.78 / 60.0).abs() < 1e-9);
        assert!((pace - 6.0).abs() < 0.01);
    }

    #[test]
    fn zero_speed_has_no_pace() {
        assert!(pace_min_km(0.0).is_none());
        assert!(pace_min_km(-1.0).is_none());
    }

    #[test]
    fn aggregates_sum_and_max() {
        let runs = vec![
            run(10_000.0, 2.78, Some(120.0)),
            run(21_100.0, 3.0, Some(200.0)),
            run(5_000.0, 3.2, None),
        ];
        assert!((total_distance_km(&runs) - 36.1).abs() < 1e-9);
        assert!((longest_run_km(&runs) - 21.1).abs() < 1e-9);
    }

    #[test]
    fn endurance_caps_at_marathon_distance() {
        let runs = vec![run(50_000.0, 3.0, None)];
        assert_eq!(calculate_scores(&runs).endurance, 100);
    }

    #[test]
    fn identical_paces_score_full_technique() {
        let runs = vec![run(10_000.0, 3.0, None), run(8_000.0, 3.0, None)];
        assert_eq!(calculate_scores(&runs).technique, 100);
    }

    #[test]
    fn strength_ignores_missing_elevation() {
        let runs = vec![run(10_000.0, 3.0, None)];
        assert_eq!(calculate_scores(&runs).strength, 0);
        let climbing = vec![run(10_000.0, 3.0, Some(1000.0))];
        assert_eq!(calculate_scores(&climbing).strength, 50);
    }

    #[test]
    fn format_duration_pads_minutes() {
        assert_eq!(format_duration(3_720), "1h 02m");
        assert_eq!(format_duration(540), "0h 09m");
    }
}
