//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::time::Duration;

use huginn::{
    CallOptions, CompletionProvider, LlmClient, ProviderProfile, ResponseContract, RetryConfig,
    telemetry,
};
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for `name` whose `label` equals `value`.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(n) => *n,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn client_for(server: &MockServer) -> LlmClient {
    LlmClient::builder(ProviderProfile::custom("mock", server.uri(), "m").with_api_key("k"))
        .retry(RetryConfig::new().initial_delay(Duration::from_millis(1)))
        .build()
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_request_records_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current()
                .block_on(async { client.complete("hello", &CallOptions::default()).await })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    let count = counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "ok");
    assert_eq!(count, 1, "expected 1 successful request counter");
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 0);

    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retried_request_records_retry_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current()
                .block_on(async { client.complete("hello", &CallOptions::default()).await })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();

    // 3 attempts → 2 retries, 1 terminal outcome
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "error"),
        1
    );
}

#[test]
fn validation_records_outcomes_and_default_reasons() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let contract = ResponseContract::post_triage();
        let _ = contract.process(&["", "prose only", "{\"sentiment\": \"meh\"}"]);
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::VALIDATION_TOTAL, "outcome", "default"),
        3
    );
    for reason in ["empty", "parse", "schema"] {
        assert_eq!(
            counter_with_label(
                &snapshot,
                telemetry::VALIDATION_DEFAULTS_TOTAL,
                "reason",
                reason
            ),
            1,
            "reason {reason}"
        );
    }
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let records = ResponseContract::post_triage().process(&[""]).unwrap();
    assert_eq!(records.len(), 1);
}
