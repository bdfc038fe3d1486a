//! Generic async resource management with automatic reconnection
//!
//! A [`ResourceManager`] owns a single external connection handle (a Redis
//! client, a message-broker channel, any remote resource) and keeps it alive:
//! connect attempts retry with exponential backoff and jitter, a background
//! task probes validity on an interval, and an invalid connection is replaced
//! transparently. Concurrent reconnect triggers are serialized so at most one
//! attempt sequence runs per manager.
//!
//! The resource-specific behavior comes from a [`ResourceFactory`]
//! implementation supplying connect, disconnect and liveness operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use resource_manager::{ManagerConfig, ResourceFactory, ResourceManager};
//!
//! struct EchoFactory {
//!     addr: String,
//! }
//!
//! #[async_trait]
//! impl ResourceFactory for EchoFactory {
//!     type Handle = tokio::net::TcpStream;
//!     type Error = std::io::Error;
//!
//!     async fn connect(&self) -> Result<Self::Handle, Self::Error> {
//!         tokio::net::TcpStream::connect(&self.addr).await
//!     }
//!
//!     async fn disconnect(&self, _handle: &Self::Handle) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     async fn is_valid(&self, handle: &Self::Handle) -> Result<bool, Self::Error> {
//!         Ok(handle.peer_addr().is_ok())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = EchoFactory { addr: "127.0.0.1:7000".into() };
//!     let manager = ResourceManager::new(factory, ManagerConfig::default());
//!
//!     manager.connect().await?;
//!     let stream = manager.resource().expect("connected");
//!     // ... use the stream ...
//!     drop(stream);
//!     manager.close().await;
//!     Ok(())
//! }
//! ```

pub mod factory;
pub mod manager;
pub mod metrics;

pub use factory::ResourceFactory;
pub use manager::{ManagerConfig, ManagerError, ManagerStatus, ResourceManager};
