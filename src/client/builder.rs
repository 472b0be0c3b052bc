//! Builder for configuring client instances

use std::sync::Arc;
use std::time::Duration;

use super::LlmClient;
use crate::providers::{CallStats, ProviderProfile, RetryConfig, RetryingTransport};
use crate::{HuginnError, Result};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`LlmClient`].
pub struct LlmClientBuilder {
    profile: ProviderProfile,
    timeout: Duration,
    retry: RetryConfig,
    http: Option<reqwest::Client>,
    stats: Option<Arc<CallStats>>,
}

impl LlmClientBuilder {
    pub fn new(profile: ProviderProfile) -> Self {
        Self {
            profile,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            http: None,
            stats: None,
        }
    }

    /// Per-attempt timeout (default 30s). Each retry gets a fresh window.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry policy (default: 3 attempts, 1s base backoff, 30s cap).
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Shorthand for adjusting only the attempt count.
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    /// Override the profile's default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.profile = self.profile.with_default_model(model);
        self
    }

    /// Override the profile's base URL (self-hosted deployments, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.profile = self.profile.with_base_url(url);
        self
    }

    /// Reuse an existing `reqwest::Client` (and its connection pool).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Record into an existing stats instance instead of a fresh one.
    pub fn stats(mut self, stats: Arc<CallStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the profile needs an API key and has none, or the
    ///   HTTP client cannot be constructed.
    /// - `InvalidInput` for a zero timeout.
    pub fn build(self) -> Result<LlmClient> {
        if self.profile.auth().requires_key() && self.profile.api_key().is_none() {
            return Err(HuginnError::Configuration(format!(
                "provider '{}' requires an API key but none is configured",
                self.profile.name()
            )));
        }
        if self.timeout.is_zero() {
            return Err(HuginnError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let http = match self.http {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| HuginnError::Configuration(format!("HTTP client: {e}")))?,
        };
        let stats = self.stats.unwrap_or_default();

        tracing::debug!(
            provider = self.profile.name(),
            url = %self.profile.url(),
            model = self.profile.default_model(),
            timeout_ms = self.timeout.as_millis() as u64,
            max_attempts = self.retry.max_attempts,
            "building LLM client"
        );

        let transport = RetryingTransport::new(http, Arc::new(self.profile), self.retry, stats);
        Ok(LlmClient::from_parts(transport, self.timeout))
    }
}
