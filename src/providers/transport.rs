//! HTTP transport with per-attempt timeout, retry and call statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::extract::extract_text;
use super::profile::{ProviderProfile, join_url};
use super::request::CallEnvelope;
use super::retry::{RetryConfig, with_retry};
use super::stats::CallStats;
use crate::telemetry;
use crate::{HuginnError, Result};

/// Longest slice of an error body carried into `HuginnError::Api`.
const ERROR_BODY_LIMIT: usize = 512;

/// Sends [`CallEnvelope`]s to one provider, retrying transient failures.
///
/// Owns a clone of the (cheaply cloneable, pooled) `reqwest::Client` and
/// shares its [`CallStats`] with the client that created it. Every call
/// updates the stats exactly once, at its terminal outcome.
#[derive(Clone, Debug)]
pub struct RetryingTransport {
    http: Client,
    profile: Arc<ProviderProfile>,
    retry: RetryConfig,
    stats: Arc<CallStats>,
}

impl RetryingTransport {
    pub fn new(
        http: Client,
        profile: Arc<ProviderProfile>,
        retry: RetryConfig,
        stats: Arc<CallStats>,
    ) -> Self {
        Self {
            http,
            profile,
            retry,
            stats,
        }
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn stats(&self) -> &Arc<CallStats> {
        &self.stats
    }

    /// Perform the call described by `envelope` and return the model text.
    ///
    /// Each attempt gets a fresh `timeout` window. At most `max_retries`
    /// attempts are made (at least one); backoff between them follows the
    /// transport's [`RetryConfig`], whose optional `deadline` bounds the
    /// whole sequence.
    ///
    /// # Errors
    ///
    /// - `RetriesExhausted` wrapping the last transient failure (timeout,
    ///   connection error, 429, 5xx).
    /// - `Api` immediately for non-rate-limit 4xx responses.
    /// - `Extraction` / `Json` immediately for malformed 2xx payloads.
    /// - `DeadlineExceeded` when the outer deadline elapses first.
    pub async fn send(
        &self,
        envelope: &CallEnvelope,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<String> {
        let start = Instant::now();
        let config = RetryConfig {
            max_attempts: max_retries,
            ..self.retry.clone()
        };
        let url = join_url(self.profile.base_url(), &envelope.endpoint);
        let provider = self.profile.name();

        let attempts = with_retry(&config, provider, |attempt| {
            debug!(provider, attempt = attempt + 1, %url, "sending request");
            self.attempt(&url, envelope, timeout)
        });
        let result = match config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, attempts)
                .await
                .unwrap_or(Err(HuginnError::DeadlineExceeded(deadline))),
            None => attempts.await,
        };

        self.record(start, &result);
        result
    }

    /// One attempt: POST, check status, decode, extract.
    async fn attempt(
        &self,
        url: &str,
        envelope: &CallEnvelope,
        timeout: Duration,
    ) -> Result<String> {
        let mut request = self.http.post(url).timeout(timeout);
        for (name, value) in &envelope.headers {
            request = request.header(name, value);
        }
        let response = request
            .json(&envelope.body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        let payload: Value = serde_json::from_str(&body)?;
        extract_text(&payload, self.profile.response_path())
    }

    fn record(&self, start: Instant, result: &Result<String>) {
        let elapsed = start.elapsed();
        let provider = self.profile.name().to_owned();
        let status = match result {
            Ok(_) => {
                self.stats.record_success(elapsed);
                "ok"
            }
            Err(e) => {
                self.stats.record_failure();
                debug!(provider = %provider, error = %e, "call failed");
                "error"
            }
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider,
        )
        .record(elapsed.as_secs_f64());
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> HuginnError {
    if err.is_timeout() {
        HuginnError::Timeout(timeout)
    } else if err.is_builder() {
        HuginnError::Configuration(err.to_string())
    } else {
        HuginnError::Http(err.to_string())
    }
}

/// Map a non-2xx response to an error. 429 becomes `RateLimited` (honouring
/// a numeric `retry-after`); everything else becomes `Api` with a truncated
/// body as the message.
async fn status_error(response: reqwest::Response) -> HuginnError {
    let status = response.status();
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return HuginnError::RateLimited { retry_after };
    }

    let body = read_error_body(response).await;
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        truncate(body.trim(), ERROR_BODY_LIMIT)
    };
    HuginnError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Read at most about `ERROR_BODY_LIMIT` bytes of an error body. The rest is
/// left unread and dropped with the response.
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut buf = Vec::new();
    while buf.len() <= ERROR_BODY_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
