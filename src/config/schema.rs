//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for an orchestrated service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Service identity.
    pub service: ServiceConfig,

    /// Listeners to register, in declaration order.
    pub listeners: Vec<ListenerConfig>,

    /// Optional pooled data store.
    pub database: Option<DatabaseConfig>,

    /// Reachability probe settings.
    pub probe: ProbeConfig,

    /// Readiness sweep settings.
    pub readiness: ReadinessConfig,

    /// Teardown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name used in logs and health output.
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Which kind of listener to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// HTTP listener serving the probe and metrics endpoints.
    TechHttp,
    /// gRPC listener; services are attached by the embedding application.
    Grpc,
}

/// Listener declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Listener kind.
    pub kind: ListenerKind,

    /// Bind address (e.g., "0.0.0.0:8081").
    pub address: String,
}

/// Postgres pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection URL (postgres://...).
    pub url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Budget for a ping, connection acquisition included, in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Level at which executed statements are logged.
    #[serde(default = "default_log_statements")]
    pub log_statements: StatementLogLevel,

    /// Level at which statements slower than the threshold are logged.
    #[serde(default = "default_log_slow_statements")]
    pub log_slow_statements: StatementLogLevel,

    #[serde(default = "default_slow_statement_threshold_ms")]
    pub slow_statement_threshold_ms: u64,
}

/// Log level for database statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementLogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn default_log_statements() -> StatementLogLevel {
    StatementLogLevel::Debug
}

fn default_log_slow_statements() -> StatementLogLevel {
    StatementLogLevel::Warn
}

fn default_slow_statement_threshold_ms() -> u64 {
    1000
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    2000
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            log_statements: default_log_statements(),
            log_slow_statements: default_log_slow_statements(),
            slow_statement_threshold_ms: default_slow_statement_threshold_ms(),
        }
    }

    pub fn slow_statement_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_statement_threshold_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-attempt TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Attempts before a listener counts as unreachable.
    pub attempts: u32,

    /// Base delay for exponential backoff between attempts in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            attempts: 3,
            retry_base_delay_ms: 50,
            retry_max_delay_ms: 500,
        }
    }
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Upper bound for a single check that is not retried, such as a data store ping.
    pub fn check_budget(&self) -> Duration {
        self.connect_timeout() * self.attempts.max(1)
    }
}

/// Readiness sweep configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Re-sweep interval in seconds; 0 sweeps once at startup.
    pub interval_secs: u64,
}

/// Teardown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for draining HTTP connections, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,

    /// Install the Prometheus recorder served at `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            [service]
            name = "orders"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.name, "orders");
        assert!(config.listeners.is_empty());
        assert!(config.database.is_none());
        assert_eq!(config.shutdown.drain_timeout(), Duration::from_secs(30));
        assert_eq!(config.probe.attempts, 3);
        assert_eq!(config.readiness.interval_secs, 0);
    }

    #[test]
    fn listener_kinds_parse_snake_case() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            [[listeners]]
            kind = "tech_http"
            address = "127.0.0.1:8081"

            [[listeners]]
            kind = "grpc"
            address = "127.0.0.1:50051"

            [database]
            url = "postgres://localhost/orders"
            "#,
        )
        .unwrap();

        assert_eq!(config.listeners[0].kind, ListenerKind::TechHttp);
        assert_eq!(config.listeners[1].kind, ListenerKind::Grpc);
        let db = config.database.unwrap();
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.acquire_timeout(), Duration::from_secs(2));
        assert_eq!(db.log_statements, StatementLogLevel::Debug);
        assert_eq!(db.log_slow_statements, StatementLogLevel::Warn);
        assert_eq!(db.slow_statement_threshold(), Duration::from_secs(1));
    }

    #[test]
    fn statement_log_levels_parse_lowercase() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/orders"
            log_statements = "off"
            log_slow_statements = "error"
            slow_statement_threshold_ms = 250
            "#,
        )
        .unwrap();

        let db = config.database.unwrap();
        assert_eq!(db.log_statements, StatementLogLevel::Off);
        assert_eq!(db.log_slow_statements, StatementLogLevel::Error);
        assert_eq!(db.slow_statement_threshold(), Duration::from_millis(250));

        let err = toml::from_str::<OrchestratorConfig>(
            r#"
            [database]
            url = "postgres://localhost/orders"
            log_statements = "loud"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn check_budget_spans_every_attempt() {
        let probe = ProbeConfig {
            connect_timeout_ms: 200,
            attempts: 3,
            ..ProbeConfig::default()
        };
        assert_eq!(probe.check_budget(), Duration::from_millis(600));
    }
}
