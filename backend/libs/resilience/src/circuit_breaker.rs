/// Circuit Breaker implementation with consecutive-failure tracking
///
/// State transitions:
/// - Closed → Open: when consecutive tracked failures reach the threshold
/// - Open → HalfOpen: first call attempted after the recovery timeout
/// - HalfOpen → Closed: the single probe call succeeds (failure count resets)
/// - HalfOpen → Open: the single probe call fails
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::metrics::CircuitBreakerMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed,
    /// Circuit is open, requests fail fast
    Open,
    /// A single probe call is in flight to test recovery
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive tracked failure count to trigger circuit open
    pub failure_threshold: u32,
    /// Duration to wait before admitting a probe call after opening
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Arc<RwLock<BreakerState>>,
}

struct BreakerState {
    current: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open - failing fast")]
    Open,
    #[error("call failed: {0}")]
    Inner(E),
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(BreakerState {
                current: CircuitState::Closed,
                failure_count: 0,
                last_failure_at: None,
            })),
        }
    }

    /// Execute a future with circuit breaker protection, counting every
    /// failure toward the threshold.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.call_tracked(|_| true, f).await
    }

    /// Execute a future with circuit breaker protection.
    ///
    /// Only failures for which `tracked` returns true count toward the
    /// threshold; untracked failures pass through without touching breaker
    /// state.
    pub async fn call_tracked<C, F, Fut, T, E>(
        &self,
        tracked: C,
        f: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        C: Fn(&E) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        // Fast path: reject while the circuit is open
        if self.should_reject_call() {
            CircuitBreakerMetrics::record_call("rejected");
            return Err(CircuitBreakerError::Open);
        }

        match f().await {
            Ok(result) => {
                CircuitBreakerMetrics::record_call("success");
                self.record_success();
                Ok(result)
            }
            Err(e) => {
                CircuitBreakerMetrics::record_call("failure");
                if tracked(&e) {
                    self.record_failure();
                }
                Err(CircuitBreakerError::Inner(e))
            }
        }
    }

    fn should_reject_call(&self) -> bool {
        let mut state = self.state.write();

        match state.current {
            CircuitState::Open => {
                let recovered = state
                    .last_failure_at
                    .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout);
                if recovered {
                    info!("Circuit breaker: Open → HalfOpen (probe admitted)");
                    CircuitBreakerMetrics::record_state_transition("open", "half_open");
                    state.current = CircuitState::HalfOpen;
                    false
                } else {
                    true
                }
            }
            // The probe is still unresolved; exactly one call per probe window
            CircuitState::HalfOpen => true,
            CircuitState::Closed => false,
        }
    }

    fn record_success(&self) {
        let mut state = self.state.write();

        if state.current == CircuitState::HalfOpen {
            info!("Circuit breaker: HalfOpen → Closed (probe succeeded)");
            CircuitBreakerMetrics::record_state_transition("half_open", "closed");
            state.current = CircuitState::Closed;
            state.failure_count = 0;
            state.last_failure_at = None;
        }
        // A success while Closed leaves the failure count untouched; only a
        // successful probe performs a full reset.
    }

    fn record_failure(&self) {
        let mut state = self.state.write();
        state.last_failure_at = Some(Instant::now());

        match state.current {
            CircuitState::Closed => {
                state.failure_count += 1;

                if state.failure_count >= self.config.failure_threshold {
                    warn!(
                        "Circuit breaker: Closed → Open (failures: {}/{})",
                        state.failure_count, self.config.failure_threshold
                    );
                    CircuitBreakerMetrics::record_state_transition("closed", "open");
                    state.current = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker: HalfOpen → Open (probe failed)");
                CircuitBreakerMetrics::record_state_transition("half_open", "open");
                state.current = CircuitState::Open;
            }
            CircuitState::Open => {
                // Already open, nothing to do
            }
        }
    }

    /// Get current circuit state (for monitoring)
    pub fn state(&self) -> CircuitState {
        self.state.read().current
    }

    /// Get current consecutive tracked failure count (for monitoring)
    pub fn failure_count(&self) -> u32 {
        self.state.read().failure_count
    }
}
