//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → service::options_from_config (ordered construction options)
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start; nothing is persisted back
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DatabaseConfig, ListenerConfig, ListenerKind, ObservabilityConfig, OrchestratorConfig,
    ProbeConfig, ReadinessConfig, ServiceConfig, ShutdownConfig, StatementLogLevel,
};
