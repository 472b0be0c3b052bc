//! Per-client call statistics.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

/// Point-in-time copy of [`CallStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStatsSnapshot {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    /// Summed wall-clock time of successful calls, retries included.
    pub total_duration: Duration,
    /// `total_duration / successful_calls`, zero before the first success.
    pub average_duration: Duration,
}

/// Call statistics shared by every call issued through one client.
///
/// Updated once per call at its terminal outcome. All fields sit behind one
/// lock so the counters and the running average never disagree, even under
/// concurrent calls.
#[derive(Debug, Default)]
pub struct CallStats {
    inner: Mutex<CallStatsSnapshot>,
}

impl CallStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, elapsed: Duration) {
        let mut s = self.lock();
        s.total_calls += 1;
        s.successful_calls += 1;
        s.total_duration += elapsed;
        s.average_duration = average(s.total_duration, s.successful_calls);
    }

    pub fn record_failure(&self) {
        let mut s = self.lock();
        s.total_calls += 1;
        s.failed_calls += 1;
    }

    pub fn snapshot(&self) -> CallStatsSnapshot {
        *self.lock()
    }

    /// Zero every counter.
    pub fn reset(&self) {
        *self.lock() = CallStatsSnapshot::default();
    }

    // A panic while holding the lock cannot leave the counters torn (every
    // update is plain arithmetic), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CallStatsSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn average(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}
