/// Resilience patterns for the price-monitoring backend
///
/// This library provides production-ready resilience patterns including:
/// - **Circuit Breaker**: Fails fast after repeated failures, with a single
///   half-open probe call after a recovery window
/// - **Retry**: Exponential backoff with jitter for transient failures,
///   with a classifier for non-retryable failure kinds
/// - **Timeout**: Enforces wall-clock limits on external calls
/// - **Tower Layer**: Composable middleware for Tower-based services
/// - **Preset Configurations**: Pre-tuned settings for Redis, RabbitMQ,
///   marketplace APIs and the Telegram API
///
/// # Example: marketplace call with a circuit breaker
///
/// ```rust,no_run
/// use resilience::{presets, CircuitBreaker};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::marketplace_api_config();
///     let circuit_breaker = CircuitBreaker::new(config.circuit_breaker);
///
///     let result = circuit_breaker.call(|| async {
///         // Your HTTP call here
///         Ok::<_, String>(())
///     }).await;
///     let _ = result;
/// }
/// ```
///
/// # Example: Redis read with a timeout
///
/// ```rust,no_run
/// use resilience::{presets, timeout::with_timeout_result};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::redis_config();
///
///     let result = with_timeout_result(
///         config.timeout.duration,
///         async {
///             // Your Redis read
///             Ok::<_, String>(())
///         }
///     ).await;
///     let _ = result;
/// }
/// ```

pub mod circuit_breaker;
pub mod layer;
pub mod metrics;
pub mod presets;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use presets::{
    marketplace_api_config, rabbitmq_config, redis_config, telegram_api_config, ServiceConfig,
};
pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
pub use timeout::{with_timeout, with_timeout_result, Elapsed, TimeoutConfig, TimeoutError};
