//! Error fan-in.
//!
//! Listener tasks push terminal errors onto an unbounded queue. `start()`
//! drains it while running; once teardown begins the receiver moves to a
//! dedicated sink task that drains it until every sender is gone.

use std::sync::Arc;

use crate::error::ListenerError;
use crate::service::{lock, Service};

/// Log a listener error and republish it to subscribers.
pub(crate) fn observe_error(service: &Service, err: ListenerError) {
    tracing::error!(address = %err.address(), error = %err, "Listener failed");

    if let Some(events) = lock(&service.inner.error_events).as_ref() {
        // No subscribers is fine.
        let _ = events.send(Arc::new(err));
    }
}

/// Move the queue receiver into its own draining task.
///
/// Returns `false` if the receiver is already gone.
pub(crate) fn spawn_error_sink(service: &Service) -> bool {
    let Some(mut errors) = lock(&service.inner.errors_rx).take() else {
        tracing::warn!("Error queue receiver already taken");
        return false;
    };

    let svc = service.clone();
    let task = tokio::spawn(async move {
        let mut drained = 0usize;
        while let Some(err) = errors.recv().await {
            drained += 1;
            observe_error(&svc, err);
        }
        tracing::debug!(drained, "Error queue closed");
    });

    *lock(&service.inner.sink) = Some(task);
    true
}

/// Wait for the sink to drain a closed queue.
pub(crate) async fn await_error_sink(service: &Service) {
    let task = lock(&service.inner.sink).take();
    if let Some(task) = task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Error sink panicked");
        }
    }
}
