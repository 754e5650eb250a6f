use std::env;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::http_client::http_client;
use crate::state::Activity;

const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const ACTIVITIES_PER_PAGE: u32 = 200;
const DEFAULT_AFTER_DATE: &str = "2025-04-07";

const REQUIRED_ENV: [&str; 3] = [
    "STRAVA_CLIENT_ID",
    "STRAVA_CLIENT_SECRET",
    "STRAVA_REFRESH_TOKEN",
];

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    // The payload also carries a rotated refresh_token and expires_at;
    // neither is persisted, the configured refresh token stays in use.
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StravaActivity {
    name: String,
    #[serde(rename = "type")]
    activity_type: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    moving_time: u32,
    #[serde(default)]
    elapsed_time: u32,
    #[serde(default)]
    average_speed: f64,
    #[serde(default)]
    average_heartrate: Option<f32>,
    #[serde(default)]
    total_elevation_gain: Option<f64>,
}

impl From<StravaActivity> for Activity {
    fn from(raw: StravaActivity) -> Self {
        Self {
            name: raw.name,
            activity_type: raw.activity_type,
            distance: raw.distance,
            moving_time: raw.moving_time,
            elapsed_time: raw.elapsed_time,
            average_speed: raw.average_speed,
            average_heartrate: raw.average_heartrate,
            total_elevation_gain: raw.total_elevation_gain,
        }
    }
}

pub fn has_credentials() -> bool {
    if non_empty_env("STRAVA_ACCESS_TOKEN").is_some() {
        return true;
    }
    REQUIRED_ENV
        .iter()
        .all(|key| non_empty_env(key).is_some())
}

pub fn fetch_recent_runs() -> Result<Vec<Activity>> {
    let token = fetch_access_token()?;
    let client = http_client()?;

    let url = format!("{STRAVA_API_BASE}/athlete/activities");
    let query = [
        ("after", after_timestamp().to_string()),
        ("page", "1".to_string()),
        ("per_page", ACTIVITIES_PER_PAGE.to_string()),
    ];

    let resp = client
        .get(&url)
        .bearer_auth(&token)
        .query(&query)
        .send()
        .context("activities request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading activities body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("strava http {}: {}", status, body));
    }

    parse_activities_json(&body)
}

fn fetch_access_token() -> Result<String> {
    // A static access token bypasses the refresh exchange entirely.
    if let Some(token) = non_empty_env("STRAVA_ACCESS_TOKEN") {
        return Ok(token);
    }

    let client_id = require_env("STRAVA_CLIENT_ID")?;
    let client_secret = require_env("STRAVA_CLIENT_SECRET")?;
    let refresh_token = require_env("STRAVA_REFRESH_TOKEN")?;

    let client = http_client()?;
    let request = TokenRequest {
        client_id: &client_id,
        client_secret: &client_secret,
        refresh_token: &refresh_token,
        grant_type: "refresh_token",
    };

    let resp = client
        .post(STRAVA_TOKEN_URL)
        .json(&request)
        .send()
        .context("token request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading token body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("strava token http {}: {}", status, body));
    }

    parse_token_json(&body)
}

pub fn parse_token_json(raw: &str) -> Result<String> {
    let token: TokenResponse = serde_json::from_str(raw.trim()).context("invalid token json")?;
    if token.access_token.is_empty() {
        return Err(anyhow::anyhow!("token response missing access_token"));
    }
    Ok(token.access_token)
}

pub fn parse_activities_json(raw: &str) -> Result<Vec<Activity>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let activities: Vec<StravaActivity> =
        serde_json::from_str(trimmed).context("invalid activities json")?;
    Ok(activities
        .into_iter()
        .filter(|activity| activity.activity_type == "Run")
        .map(Activity::from)
        .collect())
}

fn after_timestamp() -> i64 {
    let date = env::var("RUNS_AFTER_DATE")
        .ok()
        .and_then(|val| NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| {
            NaiveDate::parse_from_str(DEFAULT_AFTER_DATE, "%Y-%m-%d").unwrap_or_default()
        });
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn require_env(key: &str) -> Result<String> {
    non_empty_env(key).ok_or_else(|| anyhow::anyhow!("missing required env var: {key}"))
}

fn non_empty_env(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
