//! Service lifecycle orchestrator.
//!
//! Boots a set of listeners, an optional pooled data store and dependent
//! components, aggregates their readiness and liveness, and tears them down
//! in a fixed order on SIGTERM/SIGINT.

pub mod component;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod service;
pub mod store;

pub use component::DependentComponent;
pub use config::OrchestratorConfig;
pub use error::{BoxError, DataStoreError, ListenerError, ServiceError};
pub use health::{HealthState, HealthStatus, ReadinessSnapshot};
pub use lifecycle::Shutdown;
pub use net::{Protocol, ServeContext, ServingHandle};
pub use service::options::{
    options_from_config, with_component, with_data_store, with_database, with_grpc_server,
    with_http_server, with_probe_config, with_readiness_config, with_shutdown_config,
    with_tech_http_server,
};
pub use service::{Phase, Registry, Service, ServiceOption};
pub use store::{DataStore, PgDataStore};
