//! Construction options.
//!
//! Each option mutates the registry of a service under construction. Options
//! are applied in order and the first failure aborts construction. Options that
//! declare a listener first look for an existing same-protocol listener at the
//! address and extend it instead of registering a duplicate.

use axum::Router;
use std::sync::Arc;

use crate::component::DependentComponent;
use crate::config::{
    DatabaseConfig, ListenerKind, OrchestratorConfig, ProbeConfig, ReadinessConfig, ShutdownConfig,
};
use crate::error::ServiceError;
use crate::net::listener::Protocol;
use crate::net::{GrpcServer, HttpServer};
use crate::service::registry::Registry;
use crate::store::{DataStore, PgDataStore};

/// A configuration mutator applied once during construction.
pub trait ServiceOption: Send {
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError>;
}

impl<F> ServiceOption for F
where
    F: FnOnce(&mut Registry) -> Result<(), ServiceError> + Send,
{
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError> {
        (*self)(registry)
    }
}

/// Registers a gRPC listener.
pub struct GrpcServerOption {
    address: String,
}

impl ServiceOption for GrpcServerOption {
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError> {
        if registry.find_listener(&self.address, Protocol::Grpc).is_some() {
            tracing::debug!(address = %self.address, "gRPC listener already registered");
            return Ok(());
        }
        registry.add_listener(&self.address, Arc::new(GrpcServer::new()))?;
        Ok(())
    }
}

pub fn with_grpc_server(address: impl Into<String>) -> Box<dyn ServiceOption> {
    Box::new(GrpcServerOption {
        address: address.into(),
    })
}

/// Registers an HTTP listener serving the probe and metrics endpoints.
pub struct TechHttpServerOption {
    address: String,
}

impl ServiceOption for TechHttpServerOption {
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError> {
        if let Some(existing) = registry.find_listener(&self.address, Protocol::Http) {
            if let Some(http) = existing.handle().as_http() {
                http.enable_tech();
                return Ok(());
            }
        }
        registry.add_listener(&self.address, Arc::new(HttpServer::tech()))?;
        Ok(())
    }
}

pub fn with_tech_http_server(address: impl Into<String>) -> Box<dyn ServiceOption> {
    Box::new(TechHttpServerOption {
        address: address.into(),
    })
}

/// Registers an HTTP listener serving an application router.
pub struct HttpServerOption {
    address: String,
    router: Router,
}

impl ServiceOption for HttpServerOption {
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError> {
        let HttpServerOption { address, router } = *self;
        if let Some(existing) = registry.find_listener(&address, Protocol::Http) {
            if let Some(http) = existing.handle().as_http() {
                return http.merge(&address, router);
            }
        }
        registry.add_listener(&address, Arc::new(HttpServer::new(router)))?;
        Ok(())
    }
}

pub fn with_http_server(address: impl Into<String>, router: Router) -> Box<dyn ServiceOption> {
    Box::new(HttpServerOption {
        address: address.into(),
        router,
    })
}

/// Attaches a lazily-connected Postgres pool.
pub struct DataStoreOption {
    config: DatabaseConfig,
}

impl ServiceOption for DataStoreOption {
    fn apply(self: Box<Self>, registry: &mut Registry) -> Result<(), ServiceError> {
        let store = PgDataStore::connect_lazy(&self.config)?;
        registry.attach_data_store(Arc::new(store))
    }
}

pub fn with_database(config: DatabaseConfig) -> Box<dyn ServiceOption> {
    Box::new(DataStoreOption { config })
}

pub fn with_data_store(store: Arc<dyn DataStore>) -> Box<dyn ServiceOption> {
    Box::new(move |registry: &mut Registry| registry.attach_data_store(store))
}

pub fn with_component(component: Arc<dyn DependentComponent>) -> Box<dyn ServiceOption> {
    Box::new(move |registry: &mut Registry| registry.add_component(component))
}

pub fn with_probe_config(probe: ProbeConfig) -> Box<dyn ServiceOption> {
    Box::new(move |registry: &mut Registry| {
        if probe.attempts == 0 {
            return Err(ServiceError::InvalidOption(
                "probe attempts must be greater than zero".into(),
            ));
        }
        registry.settings_mut().probe = probe;
        Ok(())
    })
}

pub fn with_readiness_config(readiness: ReadinessConfig) -> Box<dyn ServiceOption> {
    Box::new(move |registry: &mut Registry| {
        registry.settings_mut().readiness = readiness;
        Ok(())
    })
}

pub fn with_shutdown_config(shutdown: ShutdownConfig) -> Box<dyn ServiceOption> {
    Box::new(move |registry: &mut Registry| {
        registry.settings_mut().shutdown = shutdown;
        Ok(())
    })
}

/// Translate a validated configuration into ordered construction options.
pub fn options_from_config(config: &OrchestratorConfig) -> Vec<Box<dyn ServiceOption>> {
    let mut options = vec![
        with_probe_config(config.probe.clone()),
        with_readiness_config(config.readiness.clone()),
        with_shutdown_config(config.shutdown.clone()),
    ];

    for listener in &config.listeners {
        options.push(match listener.kind {
            ListenerKind::TechHttp => with_tech_http_server(listener.address.clone()),
            ListenerKind::Grpc => with_grpc_server(listener.address.clone()),
        });
    }

    if let Some(database) = &config.database {
        options.push(with_database(database.clone()));
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListenerConfig;

    fn apply_all(options: Vec<Box<dyn ServiceOption>>) -> Result<Registry, ServiceError> {
        let mut registry = Registry::default();
        for option in options {
            option.apply(&mut registry)?;
        }
        Ok(registry)
    }

    #[test]
    fn reapplied_listener_options_extend_existing_entries() {
        let registry = apply_all(vec![
            with_grpc_server("127.0.0.1:50051"),
            with_grpc_server("127.0.0.1:50051"),
            with_http_server("127.0.0.1:8080", Router::new()),
            with_tech_http_server("127.0.0.1:8080"),
            with_http_server("127.0.0.1:8080", Router::new()),
        ])
        .unwrap();

        assert_eq!(registry.listeners().len(), 2);
        let http = registry
            .find_listener("127.0.0.1:8080", Protocol::Http)
            .and_then(|l| l.handle().as_http())
            .unwrap();
        assert!(http.is_tech());
    }

    #[test]
    fn settings_options_override_defaults() {
        let registry = apply_all(vec![
            with_shutdown_config(ShutdownConfig {
                drain_timeout_secs: 5,
            }),
            with_readiness_config(ReadinessConfig { interval_secs: 7 }),
        ])
        .unwrap();

        assert_eq!(registry.settings().shutdown.drain_timeout_secs, 5);
        assert_eq!(registry.settings().readiness.interval_secs, 7);
    }

    #[test]
    fn zero_probe_attempts_rejected() {
        let probe = ProbeConfig {
            attempts: 0,
            ..ProbeConfig::default()
        };
        let err = apply_all(vec![with_probe_config(probe)]).err().unwrap();
        assert!(matches!(err, ServiceError::InvalidOption(_)));
    }

    #[test]
    fn config_listeners_keep_declaration_order() {
        let mut config = OrchestratorConfig::default();
        config.listeners = vec![
            ListenerConfig {
                kind: ListenerKind::Grpc,
                address: "127.0.0.1:50051".into(),
            },
            ListenerConfig {
                kind: ListenerKind::TechHttp,
                address: "127.0.0.1:8081".into(),
            },
        ];

        let registry = apply_all(options_from_config(&config)).unwrap();
        let addresses: Vec<_> = registry.listeners().iter().map(|l| l.address()).collect();
        assert_eq!(addresses, ["127.0.0.1:50051", "127.0.0.1:8081"]);
        assert_eq!(registry.listeners()[0].protocol(), Protocol::Grpc);
    }
}
