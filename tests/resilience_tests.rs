// Resilient caller behaviour: timeout resolution, retry/abort policy,
// fallback semantics, and statistics accumulation.
//
// Tests run under a paused tokio clock so backoff sleeps and timeouts
// elapse instantly.

use crucible::resilience::{
    CallOptions, CallerError, GLOBAL_DEFAULT_TIMEOUT_SECS, ResilientCaller, TimeoutPolicy,
};
use crucible::tooling::ToolInvokeError;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn connection_error(server: &str) -> ToolInvokeError {
    ToolInvokeError::Terminated {
        server: server.to_string(),
    }
}

#[test]
fn timeout_resolution_follows_table_then_family_then_global() {
    let policy = TimeoutPolicy::new();
    // Exact operation entries.
    assert_eq!(
        policy.resolve("structure", "generate"),
        Duration::from_secs(180)
    );
    assert_eq!(
        policy.resolve("validity", "screen"),
        Duration::from_secs(15)
    );
    // Unknown operation falls back to the family default.
    assert_eq!(
        policy.resolve("structure", "enumerate"),
        Duration::from_secs(240)
    );
    // Unknown family falls back to the global default.
    assert_eq!(
        policy.resolve("spectroscopy", "simulate"),
        Duration::from_secs(GLOBAL_DEFAULT_TIMEOUT_SECS)
    );
}

#[test]
fn config_overrides_beat_the_static_table() {
    let mut overrides = HashMap::new();
    overrides.insert("validity_screen".to_string(), 4);
    let policy = TimeoutPolicy::with_overrides(overrides);
    assert_eq!(policy.resolve("validity", "screen"), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn connection_failures_retry_to_exhaustion() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let result: Result<Value, CallerError> = caller
        .call("validity", "screen", CallOptions::default(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(connection_error("validity"))
            }
        })
        .await;

    let error = result.expect_err("call must exhaust");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(error.attempts(), 3);
    assert!(matches!(
        error.cause(),
        ToolInvokeError::Terminated { server } if server == "validity"
    ));

    let stats = caller.stats_snapshot();
    let bucket = stats.get("validity_screen").expect("stats bucket");
    assert_eq!(bucket.total, 3);
    assert_eq!(bucket.fail, 3);
    assert_eq!(bucket.connection_failures, 3);
}

#[tokio::test(start_paused = true)]
async fn explicit_max_retries_is_honoured() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let options = CallOptions {
        max_retries: Some(5),
        timeout_override: None,
    };
    let result: Result<Value, CallerError> = caller
        .call("validity", "screen", options, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(connection_error("validity"))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn long_timeout_calls_get_exactly_one_attempt() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    // structure_generate resolves to 180s, past the no-retry bound.
    let counter = attempts.clone();
    let result: Result<Value, CallerError> = caller
        .call("structure", "generate", CallOptions::default(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<Value, ToolInvokeError>>().await
            }
        })
        .await;

    let error = result.expect_err("call must time out");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(error.attempts(), 1);
    assert!(matches!(error.cause(), ToolInvokeError::Timeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn short_timeout_calls_are_retried_after_timing_out() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    // validity_screen resolves to 15s, below the no-retry bound.
    let counter = attempts.clone();
    let result: Result<Value, CallerError> = caller
        .call("validity", "screen", CallOptions::default(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<Value, ToolInvokeError>>().await
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    let stats = caller.stats_snapshot();
    let bucket = stats.get("validity_screen").expect("stats bucket");
    assert_eq!(bucket.timeout_failures, 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_override_applies_the_no_retry_rule() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let options = CallOptions {
        max_retries: None,
        timeout_override: Some(Duration::from_secs(120)),
    };
    let result: Result<Value, CallerError> = caller
        .call("validity", "screen", options, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<Value, ToolInvokeError>>().await
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn terminal_failures_abort_immediately() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let result: Result<Value, CallerError> = caller
        .call("energy", "evaluate", CallOptions::default(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ToolInvokeError::Rpc {
                    server: "forcefield".to_string(),
                    code: -32602,
                    message: "invalid params".to_string(),
                })
            }
        })
        .await;

    let error = result.expect_err("terminal failure must abort");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(matches!(
        error.cause(),
        ToolInvokeError::Rpc { code: -32602, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn transient_rpc_failures_are_retried() {
    let caller = ResilientCaller::default();
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let result: Result<Value, CallerError> = caller
        .call("energy", "evaluate", CallOptions::default(), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ToolInvokeError::Rpc {
                        server: "forcefield".to_string(),
                        code: -32001,
                        message: "engine warming up".to_string(),
                    })
                } else {
                    Ok(json!({"energy_per_atom": -7.92}))
                }
            }
        })
        .await;

    let value = result.expect("third attempt succeeds");
    assert_eq!(value["energy_per_atom"], -7.92);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    let stats = caller.stats_snapshot();
    let bucket = stats.get("energy_evaluate").expect("stats bucket");
    assert_eq!(bucket.total, 3);
    assert_eq!(bucket.success, 1);
    assert_eq!(bucket.fail, 2);
}

#[tokio::test(start_paused = true)]
async fn fallback_result_is_returned_when_primary_exhausts() {
    let caller = ResilientCaller::default();

    let result = caller
        .call_with_fallback(
            "energy",
            "evaluate",
            CallOptions::default(),
            || async { Err(connection_error("forcefield")) },
            || async { Ok(json!({"energy_per_atom": -3.1, "source": "cached"})) },
        )
        .await
        .expect("fallback succeeds");

    assert_eq!(result["source"], "cached");
}

#[tokio::test(start_paused = true)]
async fn primary_error_surfaces_when_fallback_also_fails() {
    let caller = ResilientCaller::default();

    let result: Result<Value, CallerError> = caller
        .call_with_fallback(
            "energy",
            "evaluate",
            CallOptions::default(),
            || async { Err(connection_error("forcefield")) },
            || async {
                Err(ToolInvokeError::Rpc {
                    server: "forcefield".to_string(),
                    code: -32602,
                    message: "fallback rejected".to_string(),
                })
            },
        )
        .await;

    let error = result.expect_err("both paths fail");
    // The original (primary) error is surfaced, not the fallback's.
    assert!(matches!(error.cause(), ToolInvokeError::Terminated { .. }));
}
