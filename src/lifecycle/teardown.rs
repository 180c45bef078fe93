//! Ordered teardown.
//!
//! # Order
//! ```text
//! 1. Release dependent components (registration order)
//! 2. Gracefully stop gRPC listeners (no deadline)
//! 3. Shut down HTTP listeners (one shared deadline)
//! 4. Close the data store
//! 5. Close the error queue, then wait for the sink
//! ```
//!
//! Every step is best-effort: failures are logged and the next step runs.

use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::health::readiness::stop_readiness_sweep;
use crate::lifecycle::sink::{await_error_sink, spawn_error_sink};
use crate::net::listener::Protocol;
use crate::observability::metrics;
use crate::service::{lock, Phase, Service};

impl Service {
    /// Tear everything down. Only the first call does any work.
    pub async fn stop(&self) {
        let mut claimed = false;
        let mut running = false;
        self.inner.phase.send_if_modified(|phase| {
            claimed = !self.inner.stopping.swap(true, Ordering::SeqCst);
            running = *phase == Phase::Running;
            false
        });
        if !claimed {
            tracing::info!(service = %self.name(), "Stop already requested");
            return;
        }

        // Release a concurrently blocked start() and wait for it to hand back
        // the error receiver.
        self.inner.trigger.trigger();
        if running {
            let mut phase = self.watch_phase();
            let _ = phase.wait_for(|p| *p >= Phase::Draining).await;
        }
        self.enter_draining();

        let began = Instant::now();
        tracing::info!(service = %self.name(), "Service stopping");

        stop_readiness_sweep(self).await;
        spawn_error_sink(self);

        self.release_components().await;
        self.stop_grpc_listeners().await;
        self.shutdown_http_listeners().await;
        self.close_data_store().await;

        // Every listener task has exited, so ours is the last sender.
        drop(lock(&self.inner.errors_tx).take());
        await_error_sink(self).await;
        drop(lock(&self.inner.error_events).take());

        self.inner.phase.send_replace(Phase::Stopped);
        let elapsed = began.elapsed();
        metrics::record_shutdown_duration(elapsed);
        tracing::info!(service = %self.name(), elapsed_ms = elapsed.as_millis() as u64, "Service stopped");
    }

    async fn release_components(&self) {
        for component in self.registry().components() {
            match component.release().await {
                Ok(()) => tracing::debug!(component = %component.name(), "Component released"),
                Err(e) => {
                    tracing::error!(component = %component.name(), error = %e, "Failed to release component")
                }
            }
        }
    }

    async fn stop_grpc_listeners(&self) {
        for listener in self.registry().listeners_of(Protocol::Grpc) {
            listener.graceful_stop().await;
            tracing::debug!(address = %listener.address(), "gRPC listener stopped");
        }
    }

    async fn shutdown_http_listeners(&self) {
        let drain = self.registry().settings().shutdown.drain_timeout();
        let deadline = tokio::time::Instant::now() + drain;

        for listener in self.registry().listeners_of(Protocol::Http) {
            match listener.shutdown_by(deadline).await {
                Ok(()) => tracing::debug!(address = %listener.address(), "HTTP listener stopped"),
                Err(err) => {
                    tracing::warn!(address = %listener.address(), error = %err, "HTTP listener drain cut short");
                    metrics::record_listener_error(listener.address());
                    if let Some(errors) = lock(&self.inner.errors_tx).as_ref() {
                        let _ = errors.send(err);
                    }
                }
            }
        }
    }

    async fn close_data_store(&self) {
        if let Some(store) = self.registry().data_store() {
            store.close().await;
            tracing::debug!("Data store closed");
        }
    }
}
