//! Shared HTTP plumbing for the model clients: POST with bounded retries

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
pub const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Longest we honor a server's retry-after before giving up on it
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Check if an HTTP status code is retryable
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Exponential backoff before retry `attempt` (1-based)
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt.saturating_sub(1)))
}

/// POST a JSON body, retrying transient failures with exponential backoff
///
/// Returns the first successful response. Non-retryable statuses fail
/// immediately; retryable ones fail once [`MAX_RETRIES`] is spent.
pub async fn post_json(
    http: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<Response, LlmError> {
    debug!(%url, "post_json: called");
    let mut last_error = None;
    let mut wait = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = wait.take().unwrap_or_else(|| backoff_delay(attempt));
            warn!(attempt, delay_ms = delay.as_millis() as u64, "post_json: retrying after transient error");
            tokio::time::sleep(delay).await;
        }

        let mut request = http.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(attempt, timeout = e.is_timeout(), error = %e, "post_json: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            debug!(status, "post_json: success");
            return Ok(response);
        }

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| backoff_delay(attempt + 1));
            debug!(attempt, ?retry_after, "post_json: rate limited (429)");

            let err = LlmError::RateLimited { retry_after };
            if retry_after > MAX_RETRY_AFTER {
                return Err(err);
            }
            wait = err.retry_after();
            last_error = Some(err);
            continue;
        }

        let message = response.text().await.unwrap_or_default();
        let err = LlmError::ApiError { status, message };
        if !err.is_retryable() {
            debug!(status, "post_json: API error");
            return Err(err);
        }

        debug!(attempt, status, "post_json: retryable error");
        last_error = Some(err);
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}
