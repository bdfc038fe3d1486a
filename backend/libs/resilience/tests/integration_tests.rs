/// Integration tests for resilience library
use resilience::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState},
    presets,
    retry::{with_retry, with_retry_if, RetryConfig, RetryError},
    timeout::{with_timeout, with_timeout_result, TimeoutError},
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ==================== Circuit Breaker Tests ====================

#[tokio::test]
async fn test_circuit_breaker_full_lifecycle() {
    let config = CircuitBreakerConfig {
        failure_threshold: 3,
        recovery_timeout: Duration::from_millis(100),
    };
    let cb = CircuitBreaker::new(config);

    // Phase 1: Closed -> Open (3 failures)
    for _ in 0..3 {
        let _ = cb.call(|| async { Err::<(), _>("error") }).await;
    }
    assert_eq!(cb.state(), CircuitState::Open);

    // Phase 2: rejected while the recovery window is still running
    let result = cb.call(|| async { Ok::<_, String>(()) }).await;
    assert!(matches!(result, Err(CircuitBreakerError::Open)));

    // Phase 3: Open -> HalfOpen -> Closed via the single probe
    tokio::time::sleep(Duration::from_millis(150)).await;
    let result = cb.call(|| async { Ok::<_, String>(()) }).await;
    assert!(result.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.failure_count(), 0);
}

#[tokio::test]
async fn test_circuit_breaker_halfopen_fails_back_to_open() {
    let config = CircuitBreakerConfig {
        failure_threshold: 2,
        recovery_timeout: Duration::from_millis(50),
    };
    let cb = CircuitBreaker::new(config);

    for _ in 0..2 {
        let _ = cb.call(|| async { Err::<(), _>("error") }).await;
    }

    // The probe fails, reopening the circuit
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = cb.call(|| async { Err::<(), _>("error") }).await;
    assert_eq!(cb.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_circuit_breaker_preserves_typed_errors() {
    #[derive(Debug, PartialEq)]
    enum ApiError {
        RateLimited,
    }

    impl std::fmt::Display for ApiError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "rate limited")
        }
    }

    let cb = CircuitBreaker::new(Default::default());
    let result = cb
        .call(|| async { Err::<(), _>(ApiError::RateLimited) })
        .await;

    match result {
        Err(CircuitBreakerError::Inner(e)) => assert_eq!(e, ApiError::RateLimited),
        other => panic!("unexpected result: {:?}", other),
    }
}

// ==================== Timeout Tests ====================

#[tokio::test]
async fn test_timeout_success() {
    let result = with_timeout(Duration::from_secs(1), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn test_timeout_elapsed() {
    let result = with_timeout(Duration::from_millis(50), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_timeout_result_operation_failed() {
    let result = with_timeout_result(Duration::from_secs(1), async {
        Err::<i32, _>("operation failed")
    })
    .await;

    assert!(matches!(result, Err(TimeoutError::Inner(_))));
}

// ==================== Retry Tests ====================

#[tokio::test]
async fn test_retry_success_after_transient_failures() {
    let config = RetryConfig {
        max_attempts: 4,
        initial_delay: Duration::from_millis(10),
        jitter: false,
        ..Default::default()
    };

    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result = with_retry(config, move || {
        let count = counter_clone.fetch_add(1, Ordering::SeqCst);
        async move {
            if count < 2 {
                Err("transient error")
            } else {
                Ok(42)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhaustion_consumes_exact_attempt_count() {
    let config = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        jitter: false,
        ..Default::default()
    };

    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result = with_retry(config, move || {
        counter_clone.fetch_add(1, Ordering::SeqCst);
        async { Err::<i32, _>("persistent error") }
    })
    .await;

    assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_skips_non_retryable_failures() {
    let config = RetryConfig {
        max_attempts: 5,
        initial_delay: Duration::from_millis(10),
        jitter: false,
        ..Default::default()
    };

    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result = with_retry_if(
        config,
        |e: &&str| *e == "transient",
        move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>("permanent") }
        },
    )
    .await;

    assert!(matches!(result, Err(RetryError::Aborted("permanent"))));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_exponential_backoff_timing() {
    let config = RetryConfig {
        max_attempts: 4,
        initial_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
        ..Default::default()
    };

    let start = std::time::Instant::now();

    let _ = with_retry(config, || async { Err::<i32, _>("error") }).await;

    let elapsed = start.elapsed();

    // Expected: 50ms + 100ms + 200ms = 350ms minimum
    assert!(elapsed >= Duration::from_millis(350));
}

// ==================== Preset Configuration Tests ====================

#[test]
fn test_redis_preset_values() {
    let config = presets::redis_config();
    assert_eq!(config.timeout.duration, Duration::from_secs(5));
    assert_eq!(config.circuit_breaker.failure_threshold, 3);
    assert!(config.retry.is_some());
}

#[test]
fn test_telegram_preset_has_no_retry() {
    let config = presets::telegram_api_config();
    assert!(config.retry.is_none());
}

// ==================== Combined Scenario Tests ====================

#[tokio::test]
async fn test_circuit_breaker_with_timeout() {
    let config = CircuitBreakerConfig {
        failure_threshold: 2,
        ..Default::default()
    };
    let cb = CircuitBreaker::new(config);

    // Two timed-out calls in a row open the circuit
    for _ in 0..2 {
        let _ = cb
            .call(|| async {
                with_timeout_result(Duration::from_millis(10), async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok::<(), String>(())
                })
                .await
            })
            .await;
    }

    assert_eq!(cb.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_retry_inside_circuit_breaker() {
    let cb = CircuitBreaker::new(Default::default());
    let retry_config = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        jitter: false,
        ..Default::default()
    };

    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    // The retry executor absorbs transient failures; the breaker only sees
    // the final outcome
    let result = cb
        .call(|| {
            with_retry(retry_config, move || {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 1 {
                        Err("transient")
                    } else {
                        Ok(7)
                    }
                }
            })
        })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.failure_count(), 0);
}
