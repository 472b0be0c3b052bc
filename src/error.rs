//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Transport errors
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Every attempt failed with a transient error. `last` is the final cause.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<HuginnError>,
    },

    #[error("call exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    // Payload errors
    #[error("malformed provider response: {0}")]
    Extraction(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Response contract errors
    #[error("no JSON object recoverable from model output: {0}")]
    Parse(String),

    #[error("field '{field}' failed validation: {rule}")]
    SchemaValidation { field: String, rule: String },

    #[error("batch item {index} failed: {source}")]
    BatchItem {
        index: usize,
        #[source]
        source: Box<HuginnError>,
    },
}

impl HuginnError {
    /// Whether a fresh attempt of the same request could succeed.
    ///
    /// Timeouts, connection failures, rate limits and 5xx responses are
    /// transient. Everything else (auth, 4xx, malformed payloads, contract
    /// violations) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Timeout(_) | HuginnError::Http(_) | HuginnError::RateLimited { .. } => {
                true
            }
            HuginnError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider supplied wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginnError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status behind this error, looking through `RetriesExhausted`.
    pub fn status(&self) -> Option<u16> {
        match self {
            HuginnError::Api { status, .. } => Some(*status),
            HuginnError::RateLimited { .. } => Some(429),
            HuginnError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// The innermost failure, unwrapping aggregate variants.
    pub fn last_cause(&self) -> &HuginnError {
        match self {
            HuginnError::RetriesExhausted { last, .. } => last.last_cause(),
            HuginnError::BatchItem { source, .. } => source.last_cause(),
            other => other,
        }
    }

    pub(crate) fn schema(field: &str, rule: impl Into<String>) -> Self {
        HuginnError::SchemaValidation {
            field: field.to_string(),
            rule: rule.into(),
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
