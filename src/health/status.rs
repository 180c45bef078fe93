//! Health status summary served on `GET /health`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::health::liveness::data_store_alive;
use crate::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl From<bool> for HealthState {
    fn from(healthy: bool) -> Self {
        if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// `ok` when every entry in `services` is healthy, `degraded` otherwise.
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since `start()`.
    pub uptime: f64,
    pub services: BTreeMap<String, HealthState>,
}

impl Service {
    /// Per-dependency health, keyed by `database` and component names.
    pub async fn health_status(&self) -> HealthStatus {
        let mut services = BTreeMap::new();

        if self.registry().data_store().is_some() {
            services.insert("database".to_string(), data_store_alive(self).await.into());
        }
        for component in self.registry().components() {
            services.insert(component.name().to_string(), component.is_ready().await.into());
        }

        let status = if services.values().all(|s| *s == HealthState::Healthy) {
            "ok"
        } else {
            "degraded"
        };

        HealthStatus {
            status,
            timestamp: Utc::now(),
            uptime: self.uptime().as_secs_f64(),
            services,
        }
    }
}
