//! Postgres pool backed by sqlx.

use async_trait::async_trait;
use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{DatabaseConfig, StatementLogLevel};
use crate::error::DataStoreError;
use crate::store::DataStore;

impl From<StatementLogLevel> for LevelFilter {
    fn from(level: StatementLogLevel) -> Self {
        match level {
            StatementLogLevel::Off => LevelFilter::Off,
            StatementLogLevel::Error => LevelFilter::Error,
            StatementLogLevel::Warn => LevelFilter::Warn,
            StatementLogLevel::Info => LevelFilter::Info,
            StatementLogLevel::Debug => LevelFilter::Debug,
            StatementLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Lazily-connected Postgres pool.
///
/// No connection is opened at construction; the first ping or query does it.
#[derive(Clone, Debug)]
pub struct PgDataStore {
    pool: PgPool,
    ping_timeout: Duration,
}

impl PgDataStore {
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DataStoreError> {
        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| DataStoreError::Config(e.to_string()))?
            .log_statements(config.log_statements.into())
            .log_slow_statements(
                config.log_slow_statements.into(),
                config.slow_statement_threshold(),
            );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .test_before_acquire(true)
            .connect_lazy_with(options);

        Ok(Self::from_pool(pool, config.acquire_timeout()))
    }

    /// Wrap an existing pool. A ping gives up after `ping_timeout`.
    pub fn from_pool(pool: PgPool, ping_timeout: Duration) -> Self {
        Self { pool, ping_timeout }
    }

    /// The underlying pool, for the embedding application's queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn ping(&self, cancel: &CancellationToken) -> Result<(), DataStoreError> {
        let query = sqlx::query("SELECT 1").execute(&self.pool);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DataStoreError::Cancelled),
            result = tokio::time::timeout(self.ping_timeout, query) => match result {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(DataStoreError::Ping(Box::new(e))),
                Err(_) => Err(DataStoreError::Timeout(self.ping_timeout)),
            },
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
