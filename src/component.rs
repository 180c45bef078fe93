//! Dependent components supplied by the embedding application.
//!
//! The orchestrator only ever sees this three-method contract. It asks for
//! readiness during sweeps and releases each component exactly once during
//! teardown, before any listener is stopped.

use async_trait::async_trait;

use crate::error::BoxError;

/// A unit of application state whose lifecycle is tied to the service.
#[async_trait]
pub trait DependentComponent: Send + Sync + 'static {
    /// Unique name, used as the registry key and in health output.
    fn name(&self) -> &str;

    /// Whether the component can currently serve traffic.
    async fn is_ready(&self) -> bool;

    /// Release owned resources. Called once, during teardown.
    async fn release(&self) -> Result<(), BoxError>;
}
