//! Readiness aggregation.
//!
//! # Responsibilities
//! - AND every component's readiness with listener and data store reachability
//! - Publish the result as an atomically swapped snapshot
//! - Run the sweep at startup, and periodically when configured
//!
//! # Design Decisions
//! - Probe handlers read the snapshot; they never recompute it
//! - Empty sets are ready
//! - All checks run on every sweep so the logs name every failing part

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::health::liveness::{data_store_alive, listeners_reachable};
use crate::observability::metrics;
use crate::service::{lock, Service};

/// Last computed readiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessSnapshot {
    pub ready: bool,
    /// When the sweep that produced this value finished. `None` before the first sweep.
    pub checked_at: Option<DateTime<Utc>>,
}

impl Service {
    /// Recompute readiness and store it in the snapshot.
    pub async fn ready(&self) -> bool {
        let (components, listeners, data_store) = tokio::join!(
            components_ready(self),
            listeners_reachable(self),
            data_store_alive(self),
        );
        let ready = components && listeners && data_store;

        self.inner.readiness.store(Arc::new(ReadinessSnapshot {
            ready,
            checked_at: Some(Utc::now()),
        }));
        metrics::record_readiness(ready);

        tracing::debug!(ready, components, listeners, data_store, "Readiness sweep finished");
        ready
    }

    /// The last stored readiness. Never blocks and never probes.
    pub fn readiness(&self) -> Arc<ReadinessSnapshot> {
        self.inner.readiness.load_full()
    }
}

async fn components_ready(service: &Service) -> bool {
    let components = service.registry().components();
    let results = join_all(components.iter().map(|c| c.is_ready())).await;

    let mut all = true;
    for (component, ready) in components.iter().zip(results) {
        if !ready {
            tracing::warn!(component = %component.name(), "Component not ready");
            all = false;
        }
    }
    all
}

/// Run the first sweep, then repeat on the configured interval until stopped.
pub(crate) fn spawn_readiness_sweep(service: &Service) {
    let interval_secs = service.registry().settings().readiness.interval_secs;
    let stop = service.inner.sweep_stop.clone();
    let cancel = service.context().clone();
    let svc = service.clone();

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = cancel.cancelled() => return,
            _ = svc.ready() => {}
        }

        if interval_secs == 0 {
            return;
        }

        let mut ticker = time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = svc.ready() => {}
                    }
                }
            }
        }
        tracing::debug!("Readiness sweep stopped");
    });

    *lock(&service.inner.sweep) = Some(task);
}

/// Stop the background sweep and wait for it to exit.
pub(crate) async fn stop_readiness_sweep(service: &Service) {
    service.inner.sweep_stop.cancel();
    let task = lock(&service.inner.sweep).take();
    if let Some(task) = task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Readiness sweep panicked");
        }
    }
}
