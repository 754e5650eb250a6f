use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::predictor;
use crate::state::{self, Delta, ProviderCommand};
use crate::strava_fetch;

pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let poll_interval = Duration::from_secs(
            env::var("RUNS_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(300)
                .max(60),
        );
        let mut last_fetch = Instant::now() - poll_interval;
        let race_date = state::race_date_from_env();

        loop {
            if last_fetch.elapsed() >= poll_interval {
                fetch_runs(&tx);
                last_fetch = Instant::now();
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::FetchRuns => {
                        // At most one manual refresh per 10s.
                        if last_fetch.elapsed() < Duration::from_secs(10) {
                            let _ = tx.send(Delta::Log("[INFO] Refresh throttled".to_string()));
                            continue;
                        }
                        fetch_runs(&tx);
                        last_fetch = Instant::now();
                    }
                    ProviderCommand::GeneratePrediction => {
                        let _ = tx.send(Delta::PredictionStarted);
                        generate_prediction(&tx, race_date);
                        last_fetch = Instant::now();
                    }
                }
            }

            thread::sleep(Duration::from_millis(200));
        }
    });
}

fn fetch_runs(tx: &Sender<Delta>) {
    let _ = tx.send(Delta::RunsLoading);
    match strava_fetch::fetch_recent_runs() {
        Ok(runs) => {
            let _ = tx.send(Delta::Log(format!("[INFO] Loaded {} runs", runs.len())));
            let _ = tx.send(Delta::SetRuns(runs));
        }
        Err(err) => {
            let _ = tx.send(Delta::RunsFailed(err.to_string()));
        }
    }
}

// A prediction always re-fetches first so it scores the freshest window.
fn generate_prediction(tx: &Sender<Delta>, race_date: NaiveDate) {
    let runs = match strava_fetch::fetch_recent_runs() {
        Ok(runs) => {
            let _ = tx.send(Delta::SetRuns(runs.clone()));
            runs
        }
        Err(err) => {
            let _ = tx.send(Delta::PredictionFailed(err.to_string()));
            return;
        }
    };

    if runs.is_empty() {
        let _ = tx.send(Delta::Log(
            "[INFO] No runs in window; prediction uses baseline".to_string(),
        ));
    }

    match predictor::request_prediction(&runs, race_date) {
        Ok(prediction) => {
            if prediction.predicted_time == predictor::FALLBACK_TIME && !runs.is_empty() {
                let _ = tx.send(Delta::Log(
                    "[WARN] Prediction response unreadable; showing baseline".to_string(),
                ));
            }
            let _ = tx.send(Delta::SetPrediction(prediction));
        }
        Err(err) => {
            let _ = tx.send(Delta::PredictionFailed(err.to_string()));
        }
    }
}
