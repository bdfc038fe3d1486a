/// Tower Layer integration for composable resilience patterns
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Circuit Breaker Layer for Tower services
#[derive(Clone)]
pub struct CircuitBreakerLayer {
    circuit_breaker: CircuitBreaker,
}

impl CircuitBreakerLayer {
    pub fn new(circuit_breaker: CircuitBreaker) -> Self {
        Self { circuit_breaker }
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreakerService {
            inner: service,
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    circuit_breaker: CircuitBreaker,
}

impl<S, Request> Service<Request> for CircuitBreakerService<S>
where
    S: Service<Request> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let circuit_breaker = self.circuit_breaker.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move { circuit_breaker.call(|| inner.call(req)).await })
    }
}
