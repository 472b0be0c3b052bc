//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider profile name (e.g. "openai", "ollama")
//! - `status`: outcome: "ok" or "error"
//! - `outcome`: validation outcome: "valid" or "default"

/// Terminal outcomes of transport calls (one per call, not per attempt).
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Call duration in seconds, including retries and backoff.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Records produced by the response contract.
///
/// Labels: `outcome` ("valid" | "default").
pub const VALIDATION_TOTAL: &str = "huginn_validation_total";

/// Fallback records substituted for unparseable or invalid output.
///
/// Labels: `reason` ("empty" | "parse" | "schema").
pub const VALIDATION_DEFAULTS_TOTAL: &str = "huginn_validation_defaults_total";
