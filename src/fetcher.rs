//! Retrying HTTP fetch shared by all source adapters.
//!
//! Two operations, [`Fetcher::fetch_text`] and [`Fetcher::fetch_json`], share
//! one retry loop: transient failures (I/O, timeout, 5xx, 429) are retried
//! with exponential backoff and jitter, well-formed 4xx responses are not,
//! and the final failure degrades to an empty/null sentinel rather than an
//! error, because a dead upstream must never take down the crawl.

use std::time::Duration;

use once_cell::sync::Lazy;
use rand::Rng;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::utils::truncate_for_log;

/// Browser-like UA; some upstreams reflexively block default library agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// First backoff step; doubles per attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("default reqwest client")
});

/// Per-source fetch settings with the retry machinery.
#[derive(Debug, Clone)]
pub struct Fetcher {
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Jitter factor applied to backoff as `(1 ± jitter)`.
    pub retry_jitter: f64,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_jitter: 0.5,
        }
    }
}

enum FetchFailure {
    Transient(String),
    Permanent(String),
}

impl Fetcher {
    pub fn new(timeout: Duration, max_retries: u32, retry_jitter: f64) -> Self {
        Self { timeout, max_retries, retry_jitter }
    }

    /// Fetch a URL body as text. Returns an empty string on any failure.
    pub async fn fetch_text(&self, url: &str) -> String {
        match self.get_with_retry(url).await {
            Some(response) => response.text().await.unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Fetch and parse a JSON URL. Returns `Value::Null` on any failure,
    /// including a body that is not valid JSON.
    pub async fn fetch_json(&self, url: &str) -> serde_json::Value {
        let Some(response) = self.get_with_retry(url).await else {
            return serde_json::Value::Null;
        };
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    %url,
                    error = %e,
                    body_preview = %truncate_for_log(&body, 200),
                    "response body was not valid JSON"
                );
                serde_json::Value::Null
            }
        }
    }

    async fn get_with_retry(&self, url: &str) -> Option<reqwest::Response> {
        let mut attempt = 0u32;
        loop {
            match self.get_once(url).await {
                Ok(response) => return Some(response),
                Err(FetchFailure::Permanent(reason)) => {
                    warn!(%url, %reason, "permanent fetch failure");
                    return None;
                }
                Err(FetchFailure::Transient(reason)) => {
                    if attempt >= self.max_retries {
                        warn!(%url, %reason, attempts = attempt + 1, "fetch exhausted retries");
                        return None;
                    }
                    let delay = self.backoff_delay(attempt);
                    debug!(%url, %reason, attempt, ?delay, "transient fetch failure; backing off");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<reqwest::Response, FetchFailure> {
        let response = CLIENT
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                // Malformed URLs fail in the builder and are not worth
                // retrying; timeouts, connect errors, and other I/O are.
                if e.is_builder() {
                    FetchFailure::Permanent(e.to_string())
                } else {
                    FetchFailure::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(FetchFailure::Transient(format!("status {status}")))
        } else {
            Err(FetchFailure::Permanent(format!("status {status}")))
        }
    }

    /// `base · 2^attempt · (1 ± jitter)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = BASE_BACKOFF.as_secs_f64() * 2f64.powi(attempt as i32);
        let jitter = if self.retry_jitter > 0.0 {
            rand::rng().random_range(-self.retry_jitter..=self.retry_jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64((base * (1.0 + jitter)).max(0.0))
    }
}
