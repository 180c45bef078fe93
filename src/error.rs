//! Error types shared across the orchestrator.
//!
//! # Taxonomy
//! - `ServiceError`: construction and lifecycle failures surfaced to the caller
//! - `ListenerError`: terminal listener failures, reported through the error queue
//! - `DataStoreError`: pool creation and ping failures
//!
//! Readiness and liveness failures are not errors; probes return booleans.

use std::time::Duration;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::lifecycle::signals::SignalError;
use crate::net::listener::Protocol;

/// Boxed error returned by embedding-application collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced synchronously by [`crate::Service`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No listener of the requested protocol is registered at the address.
    #[error("listener not found: {0}")]
    ListenerNotFound(String),

    /// A listener of the same protocol is already registered at the address.
    #[error("duplicate {protocol} listener on {address}")]
    DuplicateListener { protocol: Protocol, address: String },

    /// A dependent component with the same name is already registered.
    #[error("component already registered: {0}")]
    DuplicateComponent(String),

    /// A data store handle is already attached.
    #[error("data store already attached")]
    DataStoreAlreadyAttached,

    /// A configuration option rejected its input.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data store could not be created.
    #[error(transparent)]
    DataStore(#[from] DataStoreError),

    /// `start()` was invoked more than once.
    #[error("service already started")]
    AlreadyStarted,

    /// Listeners can only be extended before `start()`.
    #[error("listener {0} is already serving")]
    ListenerStarted(String),

    /// Waiting for the termination trigger failed.
    #[error("failed to wait for termination signal: {0}")]
    Signal(#[from] SignalError),
}

/// Terminal listener failures.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The address could not be parsed or bound.
    #[error("failed to listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener stopped serving for a reason other than a requested stop.
    #[error("failed to serve on {address}: {source}")]
    Serve {
        address: String,
        #[source]
        source: BoxError,
    },

    /// The serving handle was launched twice.
    #[error("listener {0} already served")]
    AlreadyServed(String),

    /// Connections did not drain before the shutdown deadline.
    #[error("listener {address} did not drain within {deadline:?}")]
    ShutdownTimeout { address: String, deadline: Duration },
}

impl ListenerError {
    /// The bind address of the listener that failed.
    pub fn address(&self) -> &str {
        match self {
            ListenerError::Bind { address, .. }
            | ListenerError::Serve { address, .. }
            | ListenerError::ShutdownTimeout { address, .. } => address,
            ListenerError::AlreadyServed(address) => address,
        }
    }
}

/// Data store failures.
#[derive(Debug, Error)]
pub enum DataStoreError {
    /// The pool could not be configured.
    #[error("invalid data store configuration: {0}")]
    Config(String),

    /// The liveness query failed.
    #[error("data store ping failed: {0}")]
    Ping(#[source] BoxError),

    /// The liveness query did not answer in time.
    #[error("data store ping timed out after {0:?}")]
    Timeout(Duration),

    /// The ping was abandoned because the service was cancelled.
    #[error("data store ping cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_error_exposes_address() {
        let err = ListenerError::Bind {
            address: "127.0.0.1:1".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert_eq!(err.address(), "127.0.0.1:1");
        assert!(err.to_string().starts_with("failed to listen on 127.0.0.1:1"));
    }

    #[test]
    fn listener_not_found_message() {
        let err = ServiceError::ListenerNotFound("0.0.0.0:9000".into());
        assert_eq!(err.to_string(), "listener not found: 0.0.0.0:9000");
    }
}
