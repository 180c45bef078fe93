//! Listener entries and their serving handles.
//!
//! # Responsibilities
//! - Bind a configured address and serve one transport on it
//! - Launch the serving loop exactly once on its own task
//! - Stop the loop on request, with or without a deadline
//! - Report terminal failures through the service error queue
//!
//! # Design Decisions
//! - Bind failures travel the same path as serve failures
//! - Each entry owns its stop token; stopping never depends on the service token
//! - Every launched task holds a clone of the error sender and is always joined
//!   (or aborted and joined) before the queue is closed

use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ListenerError;
use crate::net::grpc::GrpcServer;
use crate::net::http::HttpServer;
use crate::observability::metrics;
use crate::service::Service;

/// Transport served by a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// HTTP/1.1 and HTTP/2 via axum. Drained with a deadline on shutdown.
    Http,
    /// gRPC via tonic. Stopped gracefully, without a deadline.
    Grpc,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Grpc => write!(f, "grpc"),
        }
    }
}

/// Everything a serving loop needs from the orchestrator.
pub struct ServeContext {
    /// Address to bind.
    pub address: String,
    /// Fires when the listener must stop accepting and drain.
    pub stop: CancellationToken,
    /// Handle to the owning service, for handlers that report on it.
    pub service: Service,
}

/// A transport implementation behind a listener entry.
#[async_trait]
pub trait ServingHandle: Send + Sync + 'static {
    fn protocol(&self) -> Protocol;

    /// Bind and serve until `ctx.stop` fires.
    ///
    /// Returns `Ok(())` only for a requested stop; everything else is an error.
    async fn serve(&self, ctx: ServeContext) -> Result<(), ListenerError>;

    fn as_grpc(&self) -> Option<&GrpcServer> {
        None
    }

    fn as_http(&self) -> Option<&HttpServer> {
        None
    }
}

/// One independently-addressed server endpoint.
pub struct Listener {
    address: String,
    handle: Arc<dyn ServingHandle>,
    stop: CancellationToken,
    launched: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Listener {
    pub fn new(address: impl Into<String>, handle: Arc<dyn ServingHandle>) -> Self {
        Self {
            address: address.into(),
            handle,
            stop: CancellationToken::new(),
            launched: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn protocol(&self) -> Protocol {
        self.handle.protocol()
    }

    pub fn handle(&self) -> &dyn ServingHandle {
        self.handle.as_ref()
    }

    /// Whether the serving task has been launched.
    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::SeqCst)
    }

    /// Spawn the serving loop. A second call is ignored.
    pub(crate) fn launch(&self, service: Service, errors: mpsc::UnboundedSender<ListenerError>) {
        if self.launched.swap(true, Ordering::SeqCst) {
            tracing::warn!(address = %self.address, "Listener already launched");
            return;
        }

        let ctx = ServeContext {
            address: self.address.clone(),
            stop: self.stop.clone(),
            service,
        };
        let handle = Arc::clone(&self.handle);
        let address = self.address.clone();
        let protocol = handle.protocol();

        let task = tokio::spawn(async move {
            tracing::info!(address = %address, %protocol, "Listener started");

            match handle.serve(ctx).await {
                Ok(()) => tracing::info!(address = %address, %protocol, "Listener stopped"),
                Err(err) => {
                    metrics::record_listener_error(&address);
                    if let Err(mpsc::error::SendError(err)) = errors.send(err) {
                        tracing::error!(error = %err, "Error queue closed, dropping listener error");
                    }
                }
            }
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Stop accepting and wait for in-flight work, however long it takes.
    pub async fn graceful_stop(&self) {
        self.stop.cancel();
        if let Some(task) = self.take_task() {
            if let Err(e) = task.await {
                tracing::error!(address = %self.address, error = %e, "Listener task panicked");
            }
        }
    }

    /// Stop accepting and wait for in-flight work up to `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ListenerError> {
        self.shutdown_by(Instant::now() + timeout).await
    }

    /// Stop accepting and wait for in-flight work until `deadline`.
    ///
    /// On expiry the serving task is aborted, so it is gone either way.
    pub async fn shutdown_by(&self, deadline: Instant) -> Result<(), ListenerError> {
        let began = Instant::now();
        self.stop.cancel();
        let Some(mut task) = self.take_task() else {
            return Ok(());
        };

        match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!(address = %self.address, error = %e, "Listener task panicked");
                Ok(())
            }
            Err(_) => {
                task.abort();
                let _ = task.await;
                Err(ListenerError::ShutdownTimeout {
                    address: self.address.clone(),
                    deadline: deadline.saturating_duration_since(began),
                })
            }
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("address", &self.address)
            .field("protocol", &self.protocol())
            .field("launched", &self.is_launched())
            .finish()
    }
}

/// Bind a TCP listener on a textual socket address.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = address.parse().map_err(|e| ListenerError::Bind {
        address: address.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.to_string(),
            source,
        })?;

    tracing::debug!(address = %address, "Listener bound");
    Ok(listener)
}
