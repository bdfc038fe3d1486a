/// Prometheus metrics for resource lifecycle events
#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, IntCounter};

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;

#[cfg(feature = "metrics")]
static CONNECT_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "resource_manager_connect_attempts_total",
        "Total number of resource connect attempts"
    )
    .expect("Failed to register connect attempts metric")
});

#[cfg(feature = "metrics")]
static RECONNECTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "resource_manager_reconnects_total",
        "Total number of reconnect sequences triggered"
    )
    .expect("Failed to register reconnects metric")
});

/// Metrics collector for the resource manager
#[cfg(feature = "metrics")]
pub struct ManagerMetrics;

#[cfg(feature = "metrics")]
impl ManagerMetrics {
    pub fn record_connect_attempt() {
        CONNECT_ATTEMPTS.inc();
    }

    pub fn record_reconnect() {
        RECONNECTS.inc();
    }
}

// No-op implementation when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub struct ManagerMetrics;

#[cfg(not(feature = "metrics"))]
impl ManagerMetrics {
    pub fn record_connect_attempt() {}
    pub fn record_reconnect() {}
}
