/// Generic async resource manager with automatic reconnection
///
/// Lifecycle: `connect` → connected → (reconnecting, any number of times,
/// driven by the background checker) → `close` (terminal). The reconnect
/// critical section is lock-guarded so at most one connection attempt
/// sequence runs per manager at any time.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::factory::ResourceFactory;
use crate::metrics::ManagerMetrics;

/// Reconnection and health-check tuning for a [`ResourceManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum connect attempts per sequence (0 = retry forever)
    pub max_reconnect_attempts: u32,
    /// Initial delay between attempts
    pub reconnect_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
    /// Jitter fraction (0..1) applied to each delay to decorrelate retry
    /// storms across instances
    pub jitter: f64,
    /// Interval between background validity checks (zero disables them)
    pub connection_check_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: 0.1,
            connection_check_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManagerError<E> {
    /// `connect()` was called on a manager that has been closed
    #[error("resource manager is closed")]
    Closed,
    /// Every connect attempt failed; carries the final failure
    #[error("failed to connect after {attempts} attempts: {last_error}")]
    ConnectFailed { attempts: u32, last_error: E },
}

/// Connection status for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerStatus {
    Connected,
    Reconnecting,
    Disconnected,
    Closed,
}

impl ManagerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerStatus::Connected => "connected",
            ManagerStatus::Reconnecting => "reconnecting",
            ManagerStatus::Disconnected => "disconnected",
            ManagerStatus::Closed => "closed",
        }
    }
}

/// Shared-state manager for a single external resource handle.
///
/// Cheap to clone; all clones observe the same connection.
pub struct ResourceManager<F: ResourceFactory> {
    inner: Arc<ManagerInner<F>>,
}

impl<F: ResourceFactory> Clone for ResourceManager<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct ManagerInner<F: ResourceFactory> {
    factory: F,
    config: ManagerConfig,
    slot: RwLock<Option<Arc<F::Handle>>>,
    reconnecting: AtomicBool,
    closed: AtomicBool,
    reconnect_lock: tokio::sync::Mutex<()>,
    checker: Mutex<Option<CheckerTask>>,
}

struct CheckerTask {
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl<F: ResourceFactory> ResourceManager<F> {
    pub fn new(factory: F, config: ManagerConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                factory,
                config,
                slot: RwLock::new(None),
                reconnecting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                reconnect_lock: tokio::sync::Mutex::new(()),
                checker: Mutex::new(None),
            }),
        }
    }

    pub fn with_defaults(factory: F) -> Self {
        Self::new(factory, ManagerConfig::default())
    }

    /// Connect with automatic retries. A no-op when a handle already exists;
    /// fails with [`ManagerError::Closed`] after `close()`.
    pub async fn connect(&self) -> Result<(), ManagerError<F::Error>> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(ManagerError::Closed);
        }

        if self.inner.slot.read().is_some() {
            return Ok(());
        }

        {
            let _guard = self.inner.reconnect_lock.lock().await;
            // A concurrent caller may have connected while we waited
            if self.inner.slot.read().is_none() {
                self.inner.connect_with_retries().await?;
            }
        }

        if !self.inner.config.connection_check_interval.is_zero() {
            self.spawn_checker();
        }

        Ok(())
    }

    /// The current resource handle, if any.
    pub fn resource(&self) -> Option<Arc<F::Handle>> {
        self.inner.slot.read().clone()
    }

    /// True when a handle is present and no reconnect sequence is in flight.
    pub fn is_connected(&self) -> bool {
        self.inner.slot.read().is_some() && !self.inner.reconnecting.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Connection status for health endpoints.
    pub fn status(&self) -> ManagerStatus {
        if self.inner.closed.load(Ordering::SeqCst) {
            ManagerStatus::Closed
        } else if self.inner.reconnecting.load(Ordering::SeqCst) {
            ManagerStatus::Reconnecting
        } else if self.inner.slot.read().is_some() {
            ManagerStatus::Connected
        } else {
            ManagerStatus::Disconnected
        }
    }

    /// Close the manager and release the resource.
    ///
    /// Idempotent; subsequent calls are no-ops. The manager cannot be
    /// reused afterwards.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Stop the background checker before tearing the handle down; the
        // cancellation itself is not an error
        let checker = self.inner.checker.lock().take();
        if let Some(task) = checker {
            let _ = task.shutdown_tx.send(());
            task.handle.abort();
            let _ = task.handle.await;
        }

        let handle = self.inner.slot.write().take();
        if let Some(handle) = handle {
            if let Err(e) = self.inner.factory.disconnect(&handle).await {
                error!("Error while closing resource: {}", e);
            } else {
                info!("Resource closed");
            }
        }
    }

    /// Scoped acquisition: connect, run `body`, then close unconditionally.
    ///
    /// The manager is closed whether `body` succeeds or fails; a connect
    /// failure returns before `body` runs.
    pub async fn with_scope<T, E, Fut, B>(&self, body: B) -> Result<T, E>
    where
        B: FnOnce(Self) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<ManagerError<F::Error>>,
    {
        self.connect().await?;
        let result = body(self.clone()).await;
        self.close().await;
        result
    }

    fn spawn_checker(&self) {
        let mut guard = self.inner.checker.lock();
        let running = guard.as_ref().is_some_and(|t| !t.handle.is_finished());
        if running || self.inner.closed.load(Ordering::SeqCst) {
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.config.connection_check_interval;
        let handle = tokio::spawn(connection_checker(weak, interval, shutdown_rx));
        *guard = Some(CheckerTask {
            shutdown_tx,
            handle,
        });
    }
}

impl<F: ResourceFactory> ManagerInner<F> {
    /// Validity probe driven by the background checker. A probe error counts
    /// as an invalid connection.
    async fn check_connection(&self) -> Result<(), ManagerError<F::Error>> {
        if self.closed.load(Ordering::SeqCst) || self.reconnecting.load(Ordering::SeqCst) {
            return Ok(());
        }

        let Some(handle) = self.slot.read().clone() else {
            return Ok(());
        };

        let valid = match self.factory.is_valid(&handle).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Connection validity check failed: {}", e);
                false
            }
        };

        if !valid {
            warn!("Connection is no longer valid, reconnecting");
            self.reconnect().await?;
        }

        Ok(())
    }

    async fn reconnect(&self) -> Result<(), ManagerError<F::Error>> {
        // Fast path, re-checked under the lock
        if self.reconnecting.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _guard = self.reconnect_lock.lock().await;
        if self.reconnecting.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("Reconnecting to resource");
        ManagerMetrics::record_reconnect();

        let stale = self.slot.write().take();
        if let Some(stale) = stale {
            if let Err(e) = self.factory.disconnect(&stale).await {
                warn!("Error while closing stale connection: {}", e);
            }
        }

        self.connect_with_retries().await
    }

    async fn connect_with_retries(&self) -> Result<(), ManagerError<F::Error>> {
        self.reconnecting.store(true, Ordering::SeqCst);

        let mut attempts: u32 = 0;
        let mut delay = self.config.reconnect_delay;

        loop {
            if self.closed.load(Ordering::SeqCst) {
                self.reconnecting.store(false, Ordering::SeqCst);
                return Err(ManagerError::Closed);
            }

            info!("Attempting to connect to resource");
            ManagerMetrics::record_connect_attempt();

            match self.factory.connect().await {
                Ok(handle) => {
                    if self.closed.load(Ordering::SeqCst) {
                        // close() won the race; a closed manager never holds
                        // a resource
                        if let Err(e) = self.factory.disconnect(&handle).await {
                            warn!("Error while closing connection opened during shutdown: {}", e);
                        }
                        self.reconnecting.store(false, Ordering::SeqCst);
                        return Err(ManagerError::Closed);
                    }

                    *self.slot.write() = Some(Arc::new(handle));
                    self.reconnecting.store(false, Ordering::SeqCst);
                    info!("Connected to resource");
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;

                    if self.config.max_reconnect_attempts > 0
                        && attempts >= self.config.max_reconnect_attempts
                    {
                        error!("Failed to connect after {} attempts: {}", attempts, e);
                        self.reconnecting.store(false, Ordering::SeqCst);
                        return Err(ManagerError::ConnectFailed {
                            attempts,
                            last_error: e,
                        });
                    }

                    let actual_delay = jittered(delay, self.config.jitter);
                    warn!(
                        "Connect attempt {} failed: {}. Retrying in {:?}",
                        attempts, e, actual_delay
                    );

                    sleep(actual_delay).await;
                    delay = delay.mul_f64(self.config.backoff_multiplier);
                }
            }
        }
    }
}

impl<F: ResourceFactory> Drop for ManagerInner<F> {
    fn drop(&mut self) {
        if let Some(task) = self.checker.get_mut().take() {
            let _ = task.shutdown_tx.send(());
            task.handle.abort();
        }

        if !self.closed.load(Ordering::SeqCst) && self.slot.get_mut().is_some() {
            warn!(
                "Resource manager dropped while still connected; call close() to release the resource cleanly"
            );
        }
    }
}

/// Periodic validity check, running until shutdown or until the manager is
/// dropped. A reconnect that exhausts its attempts ends the task.
async fn connection_checker<F: ResourceFactory>(
    inner: Weak<ManagerInner<F>>,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Connection checker shutting down");
                break;
            }
            _ = sleep(interval) => {
                let Some(inner) = inner.upgrade() else { break };

                if inner.closed.load(Ordering::SeqCst) {
                    break;
                }

                if let Err(e) = inner.check_connection().await {
                    error!("Giving up on reconnection: {}", e);
                    break;
                }
            }
        }
    }
}

/// Multiply `delay` by a random factor in `[1 - jitter, 1 + jitter]`.
fn jittered(delay: Duration, jitter: f64) -> Duration {
    let jitter = jitter.clamp(0.0, 1.0);
    if jitter == 0.0 {
        return delay;
    }
    let factor = rand::thread_rng().gen_range(1.0 - jitter..1.0 + jitter);
    delay.mul_f64(factor)
}
