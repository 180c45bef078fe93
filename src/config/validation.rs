//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs before any resource is created
//! - Validate value ranges (timeouts > 0, attempts > 0)
//! - Detect duplicate listeners
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ListenerKind, OrchestratorConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("invalid listener address '{0}'")]
    InvalidAddress(String),

    #[error("duplicate {kind:?} listener on {address}")]
    DuplicateListener { kind: ListenerKind, address: String },

    #[error("invalid database url: {0}")]
    InvalidDatabaseUrl(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    let mut seen = HashSet::new();
    for listener in &config.listeners {
        if listener.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress(listener.address.clone()));
        }
        if !seen.insert((listener.kind, listener.address.as_str())) {
            errors.push(ValidationError::DuplicateListener {
                kind: listener.kind,
                address: listener.address.clone(),
            });
        }
    }

    if let Some(db) = &config.database {
        match Url::parse(&db.url) {
            Ok(url) if matches!(url.scheme(), "postgres" | "postgresql") => {}
            Ok(url) => errors.push(ValidationError::InvalidDatabaseUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))),
            Err(e) => errors.push(ValidationError::InvalidDatabaseUrl(e.to_string())),
        }
        if db.max_connections == 0 {
            errors.push(ValidationError::NotPositive("database.max_connections"));
        }
        if db.acquire_timeout_ms == 0 {
            errors.push(ValidationError::NotPositive("database.acquire_timeout_ms"));
        }
    }

    if config.probe.attempts == 0 {
        errors.push(ValidationError::NotPositive("probe.attempts"));
    }
    if config.probe.connect_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("probe.connect_timeout_ms"));
    }
    if config.shutdown.drain_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("shutdown.drain_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
