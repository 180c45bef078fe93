//! Startup coordination.
//!
//! # Responsibilities
//! - Record the start time and move the service to `Running`
//! - Launch one task per listener
//! - Start the readiness sweep
//! - Block until a termination trigger, consuming listener errors meanwhile
//!
//! # Design Decisions
//! - Listener launches are unordered; none waits for another to bind
//! - A failed signal wait is returned to the caller; no teardown follows
//! - The error receiver is handed back even if `start()` is dropped mid-wait

use chrono::Utc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::error::{ListenerError, ServiceError};
use crate::health::readiness::spawn_readiness_sweep;
use crate::lifecycle::signals::SignalOutcome;
use crate::lifecycle::sink::observe_error;
use crate::service::{lock, Phase, Service, Started};

/// Returns the error receiver and marks `start()` as finished when dropped,
/// so a concurrent `stop()` can proceed.
struct StartGuard<'a> {
    service: &'a Service,
    errors: Option<mpsc::UnboundedReceiver<ListenerError>>,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if let Some(errors) = self.errors.take() {
            *lock(&self.service.inner.errors_rx) = Some(errors);
        }
        self.service.enter_draining();
    }
}

impl Service {
    /// Launch every listener and block until termination is requested.
    ///
    /// Returns `Ok(())` on SIGTERM, SIGINT or the programmatic trigger. Call
    /// [`Service::stop`] afterwards to tear down. Fails with
    /// [`ServiceError::Signal`] if the wait itself fails, including
    /// cancellation of the service context.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let trap = lock(&self.inner.trap)
            .take()
            .ok_or(ServiceError::AlreadyStarted)?;

        let mut began = false;
        self.inner.phase.send_if_modified(|phase| {
            if *phase == Phase::Created && !self.inner.stopping.load(Ordering::SeqCst) {
                *phase = Phase::Running;
                began = true;
            }
            began
        });
        if !began {
            tracing::info!(service = %self.name(), "Service stopped before start");
            return Ok(());
        }

        let _ = self.inner.started.set(Started {
            at: Utc::now(),
            instant: Instant::now(),
        });

        let errors_tx = lock(&self.inner.errors_tx).clone();
        match errors_tx {
            Some(tx) => {
                for listener in self.registry().listeners() {
                    listener.launch(self.clone(), tx.clone());
                }
            }
            None => tracing::warn!("Error queue closed before start, listeners not launched"),
        }

        spawn_readiness_sweep(self);

        tracing::info!(
            service = %self.name(),
            instance_id = %self.instance_id(),
            listeners = self.registry().listeners().len(),
            "Service started"
        );

        let mut guard = StartGuard {
            service: self,
            errors: lock(&self.inner.errors_rx).take(),
        };

        let wait = trap.wait(&self.inner.cancel);
        tokio::pin!(wait);

        let outcome = loop {
            let Some(errors) = guard.errors.as_mut() else {
                break (&mut wait).await;
            };

            let received = tokio::select! {
                outcome = &mut wait => break outcome,
                received = errors.recv() => received,
            };

            match received {
                Some(err) => observe_error(self, err),
                None => guard.errors = None,
            }
        };
        drop(guard);

        match outcome {
            SignalOutcome::Terminated(signal) => {
                tracing::info!(service = %self.name(), ?signal, "Termination requested");
                Ok(())
            }
            SignalOutcome::Failed(err) => {
                tracing::error!(service = %self.name(), error = %err, "Signal wait failed");
                Err(err.into())
            }
        }
    }
}
