use crate::application::tooling::FailureKind;
use serde::Serialize;
use std::time::Duration;

/// Per-`{family}_{operation}` attempt counters.
///
/// `avg_duration_ms` is a running average over successful attempts only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallStats {
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub avg_duration_ms: f64,
    pub timeout_failures: u64,
    pub connection_failures: u64,
}

impl CallStats {
    pub fn record_success(&mut self, duration: Duration) {
        self.total += 1;
        self.success += 1;
        let sample = duration.as_secs_f64() * 1000.0;
        self.avg_duration_ms += (sample - self.avg_duration_ms) / self.success as f64;
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        self.total += 1;
        self.fail += 1;
        match kind {
            FailureKind::Timeout => self.timeout_failures += 1,
            FailureKind::Connection => self.connection_failures += 1,
            FailureKind::Transient | FailureKind::Terminal => {}
        }
    }
}
