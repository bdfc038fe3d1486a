/// Timeout wrapper for async operations
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::metrics::TimeoutMetrics;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
        }
    }
}

/// The wrapped operation did not complete within the ceiling. The operation
/// itself is cancelled by being dropped; partial side effects are not rolled
/// back.
#[derive(Debug, thiserror::Error)]
#[error("operation timed out after {0:?}")]
pub struct Elapsed(pub Duration);

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error(transparent)]
    Elapsed(#[from] Elapsed),
    /// The operation completed in time with its own failure, passed through
    #[error("operation failed: {0}")]
    Inner(E),
}

/// Execute a future with a wall-clock ceiling.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(value) => {
            TimeoutMetrics::record_operation("completed");
            Ok(value)
        }
        Err(_) => {
            TimeoutMetrics::record_operation("elapsed");
            Err(Elapsed(duration))
        }
    }
}

/// Execute a fallible future with a wall-clock ceiling.
pub async fn with_timeout_result<F, T, E>(
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => {
            TimeoutMetrics::record_operation("completed");
            Ok(result)
        }
        Ok(Err(e)) => {
            TimeoutMetrics::record_operation("failed");
            Err(TimeoutError::Inner(e))
        }
        Err(_) => {
            TimeoutMetrics::record_operation("elapsed");
            Err(TimeoutError::Elapsed(Elapsed(duration)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_completion_just_under_the_ceiling() {
        let result = with_timeout(Duration::from_millis(200), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            42
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_elapsed() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(matches!(result, Err(Elapsed(_))));
    }

    #[tokio::test]
    async fn test_timeout_result_success() {
        let result =
            with_timeout_result(Duration::from_secs(1), async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_result_passes_inner_failure_through() {
        let result = with_timeout_result(Duration::from_secs(1), async {
            Err::<i32, _>("operation failed")
        })
        .await;

        assert!(matches!(result, Err(TimeoutError::Inner("operation failed"))));
    }

    #[tokio::test]
    async fn test_timeout_result_elapsed() {
        let result = with_timeout_result(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<i32, String>(42)
        })
        .await;

        assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
    }
}
