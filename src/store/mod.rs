//! Pooled data store handle.
//!
//! # Responsibilities
//! - Answer a lightweight liveness query for probes
//! - Release the pool once during teardown
//!
//! # Design Decisions
//! - The orchestrator holds at most one data store
//! - Pings observe the service cancellation token
//! - The pool adapter is pluggable; `postgres.rs` provides the sqlx one

pub mod postgres;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DataStoreError;

pub use postgres::PgDataStore;

/// A pooled connection resource owned by the service.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// Issue a lightweight query. Any error means "not alive".
    async fn ping(&self, cancel: &CancellationToken) -> Result<(), DataStoreError>;

    /// Close the pool. Called once, after every listener has stopped.
    async fn close(&self);
}
