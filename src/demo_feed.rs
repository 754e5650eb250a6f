use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rand::Rng;

use crate::predictor;
use crate::state::{self, Activity, ConfidenceLevel, Delta, Prediction, ProviderCommand};
use crate::stats;

// Offline provider used when no Strava credentials are configured: it
// synthesizes a plausible training block so every widget has data.

const RUN_NAMES: [&str; 6] = [
    "Morning Run",
    "Easy Run",
    "Tempo Intervals",
    "Long Run",
    "Recovery Jog",
    "Hill Repeats",
];

pub fn spawn_demo_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let race_date = state::race_date_from_env();

        let _ = tx.send(Delta::Log(
            "[INFO] No Strava credentials; using demo data".to_string(),
        ));
        let mut runs = seed_runs(&mut rng);
        let _ = tx.send(Delta::SetRuns(runs.clone()));

        loop {
            thread::sleep(Duration::from_millis(200));

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::FetchRuns => {
                        runs = seed_runs(&mut rng);
                        let _ = tx.send(Delta::Log(format!(
                            "[INFO] Demo refresh: {} runs",
                            runs.len()
                        )));
                        let _ = tx.send(Delta::SetRuns(runs.clone()));
                    }
                    ProviderCommand::GeneratePrediction => {
                        let _ = tx.send(Delta::PredictionStarted);
                        // Mimic the completion round-trip latency.
                        thread::sleep(Duration::from_millis(600));
                        let prediction = demo_prediction(&runs, race_date, &mut rng);
                        let _ = tx.send(Delta::SetPrediction(prediction));
                    }
                }
            }
        }
    });
}

fn seed_runs(rng: &mut impl Rng) -> Vec<Activity> {
    let count = rng.gen_range(5..=9);
    (0..count)
        .map(|idx| {
            let distance = rng.gen_range(5_000.0..22_000.0_f64);
            let average_speed = rng.gen_range(2.5..3.6_f64);
            let moving_time = (distance / average_speed) as u32;
            Activity {
                name: RUN_NAMES[idx % RUN_NAMES.len()].to_string(),
                activity_type: "Run".to_string(),
                distance,
                moving_time,
                elapsed_time: moving_time + rng.gen_range(0..180),
                average_speed,
                average_heartrate: Some(rng.gen_range(138.0..176.0)),
                total_elevation_gain: Some(rng.gen_range(20.0..320.0)),
            }
        })
        .collect()
}

fn demo_prediction(runs: &[Activity], race_date: NaiveDate, rng: &mut impl Rng) -> Prediction {
    let now = Utc::now().naive_utc();
    if runs.is_empty() {
        return predictor::fallback_prediction(runs, race_date, now);
    }

    // Scale a finish estimate from the observed average pace plus late-race fade.
    let pace = stats::average_pace_min_km(runs).unwrap_or(6.0);
    let minutes = (pace * 42.2 * rng.gen_range(1.04..1.12)) as u32;
    let confidence = rng.gen_range(55..=90_u8);

    Prediction {
        predicted_time: format!("{}:{:02}", minutes / 60, minutes % 60),
        confidence,
        level: ConfidenceLevel::from_confidence(confidence),
        days_until_race: state::days_until_race(race_date, now),
        training_volume_km: stats::total_distance_km(runs),
        average_pace: stats::format_pace(Some(pace)),
        longest_run_km: stats::longest_run_km(runs),
    }
}
