use std::collections::VecDeque;
use std::env;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats;

pub const DEFAULT_RACE_DATE: &str = "2025-09-14";
pub const DEFAULT_GOAL_MINUTES: u32 = 240;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub activity_type: String,
    pub distance: f64,
    pub moving_time: u32,
    pub elapsed_time: u32,
    pub average_speed: f64,
    #[serde(default)]
    pub average_heartrate: Option<f32>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatScores {
    pub speed: u8,
    pub endurance: u8,
    pub stamina: u8,
    pub recovery: u8,
    pub strength: u8,
    pub technique: u8,
}

impl StatScores {
    pub fn rows(&self) -> [(&'static str, u8); 6] {
        [
            ("Speed", self.speed),
            ("Endurance", self.endurance),
            ("Stamina", self.stamina),
            ("Recovery", self.recovery),
            ("Strength", self.strength),
            ("Technique", self.technique),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    // Thresholds mirror the widget coloring: green above 75, yellow above 50.
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence > 75 {
            Self::High
        } else if confidence > 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub predicted_time: String,
    pub confidence: u8,
    pub level: ConfidenceLevel,
    pub days_until_race: i64,
    pub training_volume_km: f64,
    pub average_pace: String,
    pub longest_run_km: f64,
}

#[derive(Debug, Clone)]
pub enum Delta {
    RunsLoading,
    SetRuns(Vec<Activity>),
    RunsFailed(String),
    PredictionStarted,
    SetPrediction(Prediction),
    PredictionFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchRuns,
    GeneratePrediction,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub runs: Vec<Activity>,
    pub runs_loading: bool,
    pub runs_error: Option<String>,
    pub scores: StatScores,
    pub prediction: Option<Prediction>,
    pub predicting: bool,
    pub runs_scroll: u16,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub race_date: NaiveDate,
    pub goal_minutes: u32,
    pub frame: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let race_date = race_date_from_env();
        let goal_minutes = env::var("GOAL_TIME_MINUTES")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_GOAL_MINUTES)
            .max(1);
        Self {
            runs: Vec::new(),
            runs_loading: true,
            runs_error: None,
            scores: stats::calculate_scores(&[]),
            prediction: None,
            predicting: false,
            runs_scroll: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            race_date,
            goal_minutes,
            frame: 0,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn scroll_runs_down(&mut self) {
        let total = self.runs.len() as u16;
        if self.runs_scroll + 1 < total {
            self.runs_scroll += 1;
        }
    }

    pub fn scroll_runs_up(&mut self) {
        self.runs_scroll = self.runs_scroll.saturating_sub(1);
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::RunsLoading => {
            state.runs_loading = true;
            state.runs_error = None;
        }
        Delta::SetRuns(runs) => {
            state.runs_loading = false;
            state.runs_error = None;
            state.scores = stats::calculate_scores(&runs);
            state.runs = runs;
            let max_scroll = state.runs.len().saturating_sub(1) as u16;
            state.runs_scroll = state.runs_scroll.min(max_scroll);
        }
        Delta::RunsFailed(err) => {
            state.runs_loading = false;
            state.runs_error = Some(err.clone());
            state.push_log(format!("[WARN] Runs fetch error: {err}"));
        }
        Delta::PredictionStarted => {
            state.predicting = true;
        }
        Delta::SetPrediction(prediction) => {
            state.predicting = false;
            state.prediction = Some(prediction);
        }
        Delta::PredictionFailed(err) => {
            state.predicting = false;
            state.push_log(format!("[WARN] Prediction error: {err}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn race_date_from_env() -> NaiveDate {
    env::var("RACE_DATE")
        .ok()
        .and_then(|val| NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| {
            NaiveDate::parse_from_str(DEFAULT_RACE_DATE, "%Y-%m-%d").unwrap_or_default()
        })
}

pub fn countdown_text(race_date: NaiveDate, now: NaiveDateTime) -> String {
    let target = race_date.and_time(NaiveTime::MIN);
    let diff = target - now;
    if diff.num_seconds() <= 0 {
        return "Race day!".to_string();
    }
    let days = diff.num_days();
    let hours = diff.num_hours() % 24;
    let minutes = diff.num_minutes() % 60;
    format!("{days}d {hours}h {minutes}m")
}

pub fn days_until_race(race_date: NaiveDate, now: NaiveDateTime) -> i64 {
    let target = race_date.and_time(NaiveTime::MIN);
    (target - now).num_days().max(0)
}

pub fn countdown_now(race_date: NaiveDate) -> String {
    countdown_text(race_date, Utc::now().naive_utc())
}
