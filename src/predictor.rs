use std::env;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http_client::llm_client;
use crate::state::{self, Activity, ConfidenceLevel, Prediction};
use crate::stats;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const FALLBACK_TIME: &str = "--:--";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(alias = "predictedTime")]
    predicted_time: String,
    confidence: f64,
}

pub fn build_prompt(runs: &[Activity]) -> String {
    let mut lines = Vec::with_capacity(runs.len() + 3);
    lines.push("Based on the following training data, predict marathon finish time:".to_string());
    for run in runs {
        let pace = stats::format_pace(stats::pace_min_km(run.average_speed));
        let hr = run
            .average_heartrate
            .map(|hr| format!("{hr:.0}"))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "Distance: {:.1}km, Pace: {pace}, HR: {hr}",
            run.distance / 1000.0
        ));
    }
    lines.push("- Consider consistency, longest run, and pace.".to_string());
    lines.push(
        "Respond with a JSON object: {\"predicted_time\": \"HH:MM\", \"confidence\": 1-100}"
            .to_string(),
    );
    lines.join("\n")
}

pub fn request_prediction(runs: &[Activity], race_date: NaiveDate) -> Result<Prediction> {
    let now = Utc::now().naive_utc();
    if runs.is_empty() {
        // An empty window goes straight to the baseline, no completion call.
        return Ok(fallback_prediction(runs, race_date, now));
    }

    let api_key = env::var("OPENAI_API_KEY")
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing required env var: OPENAI_API_KEY"))?;
    let model = env::var("OPENAI_MODEL")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let base_url = env::var("OPENAI_BASE_URL")
        .ok()
        .map(|val| val.trim().trim_end_matches('/').to_string())
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: build_prompt(runs),
        }],
        response_format: ResponseFormat {
            format_type: "json_object",
        },
    };

    let client = llm_client()?;
    let resp = client
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .context("completion request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading completion body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("completion http {}: {}", status, body));
    }

    let response: ChatResponse =
        serde_json::from_str(&body).context("invalid completion envelope")?;
    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .unwrap_or_default();

    Ok(parse_prediction_content(&content, runs, race_date, now))
}

// A content payload that does not parse into the expected shape degrades to
// the zeroed low-confidence result instead of failing the whole request.
pub fn parse_prediction_content(
    content: &str,
    runs: &[Activity],
    race_date: NaiveDate,
    now: NaiveDateTime,
) -> Prediction {
    let Ok(raw) = serde_json::from_str::<RawPrediction>(content.trim()) else {
        return fallback_prediction(runs, race_date, now);
    };

    let confidence = raw.confidence.round();
    if !(1.0..=100.0).contains(&confidence) || !valid_time(&raw.predicted_time) {
        return fallback_prediction(runs, race_date, now);
    }
    let confidence = confidence as u8;

    Prediction {
        predicted_time: raw.predicted_time,
        confidence,
        level: ConfidenceLevel::from_confidence(confidence),
        days_until_race: state::days_until_race(race_date, now),
        training_volume_km: stats::total_distance_km(runs),
        average_pace: stats::format_pace(stats::average_pace_min_km(runs)),
        longest_run_km: stats::longest_run_km(runs),
    }
}

pub fn fallback_prediction(runs: &[Activity], race_date: NaiveDate, now: NaiveDateTime) -> Prediction {
    Prediction {
        predicted_time: FALLBACK_TIME.to_string(),
        confidence: 0,
        level: ConfidenceLevel::Low,
        days_until_race: state::days_until_race(race_date, now),
        training_volume_km: stats::total_distance_km(runs),
        average_pace: stats::format_pace(stats::average_pace_min_km(runs)),
        longest_run_km: stats::longest_run_km(runs),
    }
}

pub fn time_to_minutes(hhmm: &str) -> Option<u32> {
    let (hours, minutes) = hhmm.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn valid_time(hhmm: &str) -> bool {
    time_to_minutes(hhmm).is_some()
}
