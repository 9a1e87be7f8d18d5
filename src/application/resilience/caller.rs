use super::stats::CallStats;
use super::timeout::{NO_RETRY_TIMEOUT_SECS, TimeoutPolicy};
use crate::application::tooling::{FailureKind, ToolInvokeError};
use crate::config::DEFAULT_MAX_RETRIES;
use rand::Rng;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Per-call knobs; fields left unset inherit the caller's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    pub max_retries: Option<u32>,
    pub timeout_override: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum CallerError {
    #[error(
        "tool '{tool}' operation '{operation}' failed after {attempts} attempt(s) in {elapsed_ms}ms: {source}"
    )]
    Exhausted {
        tool: String,
        operation: String,
        attempts: u32,
        elapsed_ms: u64,
        #[source]
        source: ToolInvokeError,
    },
}

impl CallerError {
    /// The last underlying tool-server error.
    pub fn cause(&self) -> &ToolInvokeError {
        match self {
            CallerError::Exhausted { source, .. } => source,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            CallerError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Executes tool invocations under a bounded timeout/retry policy and
/// accumulates per-`(family, operation)` statistics.
///
/// Retry eligibility comes from [`FailureKind`]: connection-class and
/// transient failures are retried with exponential backoff and jitter;
/// terminal failures abort immediately; timeouts are retried only when
/// the resolved timeout is short enough that a rerun is plausible.
pub struct ResilientCaller {
    policy: TimeoutPolicy,
    max_retries: u32,
    stats: Mutex<HashMap<String, CallStats>>,
}

impl Default for ResilientCaller {
    fn default() -> Self {
        Self::new(TimeoutPolicy::new(), DEFAULT_MAX_RETRIES)
    }
}

impl ResilientCaller {
    pub fn new(policy: TimeoutPolicy, max_retries: u32) -> Self {
        Self {
            policy,
            max_retries,
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Invoke `attempt` under the resolved timeout, retrying per policy.
    ///
    /// `attempt` must be re-invokable; each retry calls it afresh.
    pub async fn call<T, F, Fut>(
        &self,
        family: &str,
        operation: &str,
        options: CallOptions,
        mut attempt: F,
    ) -> Result<T, CallerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ToolInvokeError>>,
    {
        let timeout = options
            .timeout_override
            .unwrap_or_else(|| self.policy.resolve(family, operation));
        let max_retries = options.max_retries.unwrap_or(self.max_retries).max(1);
        let key = stat_key(family, operation);
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_error: Option<ToolInvokeError> = None;

        while attempts < max_retries {
            if attempts > 0 {
                let delay = backoff_delay(attempts);
                debug!(
                    family,
                    operation,
                    attempt = attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            let attempt_started = Instant::now();
            match tokio::time::timeout(timeout, attempt()).await {
                Ok(Ok(value)) => {
                    let duration = attempt_started.elapsed();
                    self.record_success(&key, duration);
                    debug!(
                        family,
                        operation,
                        attempt = attempts,
                        duration_ms = duration.as_millis() as u64,
                        "tool call succeeded"
                    );
                    return Ok(value);
                }
                Ok(Err(err)) => {
                    let kind = err.kind();
                    self.record_failure(&key, kind);
                    warn!(
                        family,
                        operation,
                        attempt = attempts,
                        kind = ?kind,
                        %err,
                        "tool call attempt failed"
                    );
                    last_error = Some(err);
                    match kind {
                        FailureKind::Connection | FailureKind::Transient => continue,
                        FailureKind::Timeout if timeout.as_secs() < NO_RETRY_TIMEOUT_SECS => {
                            continue;
                        }
                        FailureKind::Timeout | FailureKind::Terminal => break,
                    }
                }
                Err(_elapsed) => {
                    let err = ToolInvokeError::Timeout {
                        server: family.to_string(),
                        elapsed_secs: timeout.as_secs(),
                    };
                    self.record_failure(&key, FailureKind::Timeout);
                    warn!(
                        family,
                        operation,
                        attempt = attempts,
                        timeout_secs = timeout.as_secs(),
                        "tool call attempt timed out"
                    );
                    last_error = Some(err);
                    if timeout.as_secs() >= NO_RETRY_TIMEOUT_SECS {
                        debug!(
                            family,
                            operation, "resolved timeout too long to justify a rerun"
                        );
                        break;
                    }
                }
            }
        }

        let source = last_error.unwrap_or_else(|| ToolInvokeError::Cancelled {
            server: family.to_string(),
        });
        let exhausted = CallerError::Exhausted {
            tool: family.to_string(),
            operation: operation.to_string(),
            attempts,
            elapsed_ms: started.elapsed().as_millis() as u64,
            source,
        };
        error!(family, operation, attempts, %exhausted, "tool call exhausted");
        Err(exhausted)
    }

    /// Like [`call`](Self::call), but on exhaustion invoke `fallback`.
    /// When the fallback also fails, the primary error is surfaced.
    pub async fn call_with_fallback<T, F, Fut, G, GFut>(
        &self,
        family: &str,
        operation: &str,
        options: CallOptions,
        primary: F,
        fallback: G,
    ) -> Result<T, CallerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ToolInvokeError>>,
        G: FnOnce() -> GFut,
        GFut: Future<Output = Result<T, ToolInvokeError>>,
    {
        match self.call(family, operation, options, primary).await {
            Ok(value) => Ok(value),
            Err(primary_error) => {
                warn!(
                    family,
                    operation,
                    %primary_error,
                    "primary call exhausted; invoking fallback"
                );
                match fallback().await {
                    Ok(value) => {
                        info!(family, operation, "fallback call succeeded");
                        Ok(value)
                    }
                    Err(fallback_error) => {
                        warn!(
                            family,
                            operation,
                            %fallback_error,
                            "fallback also failed; surfacing primary error"
                        );
                        Err(primary_error)
                    }
                }
            }
        }
    }

    /// Copy of the accumulated statistics, keyed `{family}_{operation}`.
    pub fn stats_snapshot(&self) -> HashMap<String, CallStats> {
        self.stats.lock().expect("stats lock").clone()
    }

    fn record_success(&self, key: &str, duration: Duration) {
        let mut stats = self.stats.lock().expect("stats lock");
        stats.entry(key.to_string()).or_default().record_success(duration);
    }

    fn record_failure(&self, key: &str, kind: FailureKind) {
        let mut stats = self.stats.lock().expect("stats lock");
        stats.entry(key.to_string()).or_default().record_failure(kind);
    }
}

fn stat_key(family: &str, operation: &str) -> String {
    format!("{family}_{operation}")
}

/// `2^attempt + uniform(0, 1)` seconds, where `attempt` counts the
/// retries already made.
fn backoff_delay(attempt: u32) -> Duration {
    let jitter: f64 = rand::rng().random_range(0.0..1.0);
    Duration::from_secs_f64(2f64.powi(attempt.min(16) as i32) + jitter)
}
