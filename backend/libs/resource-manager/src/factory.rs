/// Capability contract a managed resource type must supply
use async_trait::async_trait;

/// Connect, disconnect and liveness operations for a managed resource.
///
/// Implementors provide the resource-specific behavior;
/// [`ResourceManager`](crate::ResourceManager) owns the lifecycle around it:
/// retries, reconnection, background validity checks and teardown.
#[async_trait]
pub trait ResourceFactory: Send + Sync + 'static {
    /// The live handle produced by a successful connect.
    type Handle: Send + Sync + 'static;
    /// Connection-level error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establish a fresh connection.
    async fn connect(&self) -> Result<Self::Handle, Self::Error>;

    /// Tear down a handle. Best-effort: the manager logs failures here and
    /// continues its own cleanup regardless.
    async fn disconnect(&self, handle: &Self::Handle) -> Result<(), Self::Error>;

    /// Liveness probe for an existing handle. `Err(_)` is treated the same
    /// as `Ok(false)`.
    async fn is_valid(&self, handle: &Self::Handle) -> Result<bool, Self::Error>;
}
