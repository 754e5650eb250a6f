use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const PREDICT_TIMEOUT_SECS: u64 = 60;

static CLIENT: OnceCell<Client> = OnceCell::new();
static LLM_CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

// Completion calls routinely outlive the 10s API timeout, so they get their own client.
pub fn llm_client() -> Result<&'static Client> {
    LLM_CLIENT.get_or_try_init(|| {
        let timeout = env::var("PREDICT_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(PREDICT_TIMEOUT_SECS)
            .max(5);
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("failed to build llm http client")
    })
}
