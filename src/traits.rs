//! Core CompletionProvider trait

use async_trait::async_trait;

use crate::contract::{ResponseContract, ValidatedRecord};
use crate::{CallOptions, Result};

/// "Send a prompt, get raw text back."
///
/// The seam between the transport and everything that consumes it. Dashboard
/// and orchestration code depend on this trait rather than on a concrete
/// client, so tests can substitute canned responses.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &str;

    /// Run one completion and return the model's raw text.
    async fn complete(&self, prompt: &str, options: &CallOptions) -> Result<String>;

    /// Complete, then apply `contract` to the returned text.
    ///
    /// Transport failures always propagate. Parse and validation failures
    /// become a fallback record when the contract allows defaults.
    async fn classify(
        &self,
        prompt: &str,
        options: &CallOptions,
        contract: &ResponseContract,
    ) -> Result<ValidatedRecord> {
        let raw = self.complete(prompt, options).await?;
        contract.apply(&raw)
    }
}
