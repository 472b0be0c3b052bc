//! The LLM client: one provider, one connection pool, one set of stats.

mod builder;

pub use builder::LlmClientBuilder;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::instrument;

use crate::providers::{
    CallStats, CallStatsSnapshot, ProviderProfile, RequestBuilder, RetryConfig, RetryingTransport,
};
use crate::traits::CompletionProvider;
use crate::{CallOptions, Result};

/// Client for one configured provider.
///
/// Owns its HTTP connection pool and [`CallStats`]; there is no global
/// state, so several clients (even for the same provider) are independent.
/// Cloning is cheap and clones share the pool and the stats.
#[derive(Clone, Debug)]
pub struct LlmClient {
    transport: RetryingTransport,
    timeout: Duration,
}

impl LlmClient {
    /// Start configuring a client for `profile`.
    pub fn builder(profile: ProviderProfile) -> LlmClientBuilder {
        LlmClientBuilder::new(profile)
    }

    pub(crate) fn from_parts(transport: RetryingTransport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn profile(&self) -> &ProviderProfile {
        self.transport.profile()
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_config(&self) -> &RetryConfig {
        self.transport.retry_config()
    }

    /// Point-in-time copy of this client's call statistics.
    pub fn stats(&self) -> CallStatsSnapshot {
        self.transport.stats().snapshot()
    }

    /// Shared handle to the live statistics.
    pub fn stats_handle(&self) -> Arc<CallStats> {
        self.transport.stats().clone()
    }

    pub fn reset_stats(&self) {
        self.transport.stats().reset();
    }

    /// Complete several prompts with at most `concurrency` calls in flight.
    ///
    /// Results come back in input order, one per prompt; a failed call does
    /// not affect the others.
    pub async fn complete_many<S>(
        &self,
        prompts: &[S],
        options: &CallOptions,
        concurrency: usize,
    ) -> Vec<Result<String>>
    where
        S: AsRef<str> + Sync,
    {
        stream::iter(prompts)
            .map(|prompt| self.complete(prompt.as_ref(), options))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    fn name(&self) -> &str {
        self.profile().name()
    }

    #[instrument(skip_all, fields(provider = %self.profile().name()))]
    async fn complete(&self, prompt: &str, options: &CallOptions) -> Result<String> {
        let envelope = RequestBuilder::new(self.profile()).build(prompt, options)?;
        self.transport
            .send(
                &envelope,
                self.timeout,
                self.transport.retry_config().max_attempts,
            )
            .await
    }
}
