//! Component registry.
//!
//! Holds everything the service manages. Populated only during construction;
//! afterwards the set of entries is fixed and read without locks.

use std::sync::Arc;

use crate::component::DependentComponent;
use crate::config::{ProbeConfig, ReadinessConfig, ShutdownConfig};
use crate::error::ServiceError;
use crate::net::listener::{Listener, Protocol, ServingHandle};
use crate::store::DataStore;

/// Tunables that construction options may override.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub probe: ProbeConfig,
    pub readiness: ReadinessConfig,
    pub shutdown: ShutdownConfig,
}

/// Declared listeners, data store and dependent components.
#[derive(Default)]
pub struct Registry {
    listeners: Vec<Listener>,
    data_store: Option<Arc<dyn DataStore>>,
    components: Vec<Arc<dyn DependentComponent>>,
    settings: Settings,
}

impl Registry {
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Listeners serving `protocol`, in registration order.
    pub fn listeners_of(&self, protocol: Protocol) -> impl Iterator<Item = &Listener> {
        self.listeners
            .iter()
            .filter(move |l| l.protocol() == protocol)
    }

    pub fn find_listener(&self, address: &str, protocol: Protocol) -> Option<&Listener> {
        self.listeners_of(protocol).find(|l| l.address() == address)
    }

    /// Register a new listener. Same-protocol addresses must be unique.
    pub fn add_listener(
        &mut self,
        address: &str,
        handle: Arc<dyn ServingHandle>,
    ) -> Result<&Listener, ServiceError> {
        let protocol = handle.protocol();
        if self.find_listener(address, protocol).is_some() {
            return Err(ServiceError::DuplicateListener {
                protocol,
                address: address.to_string(),
            });
        }

        self.listeners.push(Listener::new(address, handle));
        tracing::debug!(address = %address, %protocol, "Listener registered");
        Ok(&self.listeners[self.listeners.len() - 1])
    }

    pub fn data_store(&self) -> Option<&Arc<dyn DataStore>> {
        self.data_store.as_ref()
    }

    pub fn attach_data_store(&mut self, store: Arc<dyn DataStore>) -> Result<(), ServiceError> {
        if self.data_store.is_some() {
            return Err(ServiceError::DataStoreAlreadyAttached);
        }
        self.data_store = Some(store);
        Ok(())
    }

    /// Dependent components, in registration order.
    pub fn components(&self) -> &[Arc<dyn DependentComponent>] {
        &self.components
    }

    pub fn add_component(&mut self, component: Arc<dyn DependentComponent>) -> Result<(), ServiceError> {
        if self.components.iter().any(|c| c.name() == component.name()) {
            return Err(ServiceError::DuplicateComponent(component.name().to_string()));
        }
        tracing::debug!(component = %component.name(), "Component registered");
        self.components.push(component);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{GrpcServer, HttpServer};

    #[test]
    fn same_address_is_unique_per_protocol() {
        let mut registry = Registry::default();
        registry
            .add_listener("127.0.0.1:9000", Arc::new(GrpcServer::new()))
            .unwrap();
        registry
            .add_listener("127.0.0.1:9000", Arc::new(HttpServer::tech()))
            .unwrap();

        let err = registry
            .add_listener("127.0.0.1:9000", Arc::new(GrpcServer::new()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateListener { protocol: Protocol::Grpc, .. }));
        assert_eq!(registry.listeners().len(), 2);
        assert!(registry.find_listener("127.0.0.1:9000", Protocol::Http).is_some());
        assert!(registry.find_listener("127.0.0.1:9001", Protocol::Grpc).is_none());
    }
}
