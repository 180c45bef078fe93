//! Liveness checks.
//!
//! Computed on demand from listener reachability and the data store ping.
//! Nothing here touches the readiness snapshot.

use futures_util::future::join_all;
use tokio::time;

use crate::net::probe::tcp_reachable;
use crate::observability::metrics;
use crate::service::Service;

impl Service {
    /// Whether every listener accepts connections and the data store answers.
    pub async fn is_alive(&self) -> bool {
        let (listeners, data_store) = tokio::join!(listeners_reachable(self), data_store_alive(self));
        let alive = listeners && data_store;
        metrics::record_liveness(alive);
        alive
    }
}

/// Probe every registered listener concurrently.
pub(crate) async fn listeners_reachable(service: &Service) -> bool {
    let probe = &service.registry().settings().probe;
    let listeners = service.registry().listeners();
    let results = join_all(listeners.iter().map(|l| tcp_reachable(l.address(), probe))).await;

    let mut all = true;
    for (listener, reachable) in listeners.iter().zip(results) {
        if !reachable {
            tracing::warn!(
                address = %listener.address(),
                protocol = %listener.protocol(),
                "Listener unreachable"
            );
            all = false;
        }
    }
    all
}

/// Ping the data store, if one is attached, within the probe budget.
pub(crate) async fn data_store_alive(service: &Service) -> bool {
    let Some(store) = service.registry().data_store() else {
        return true;
    };

    let budget = service.registry().settings().probe.check_budget();
    match time::timeout(budget, store.ping(service.context())).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Data store unreachable");
            false
        }
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "Data store ping timed out");
            false
        }
    }
}
