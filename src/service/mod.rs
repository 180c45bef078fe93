//! The orchestrated service.
//!
//! # Data Flow
//! ```text
//! Service::new(cancel, name, options)
//!     → options.rs (ordered mutators, fail fast)
//!     → registry.rs (listeners, data store, components; fixed from here on)
//!
//! Service::start   (lifecycle/startup.rs)
//! Service::ready / is_alive / health_status   (health/)
//! Service::stop    (lifecycle/teardown.rs)
//! ```
//!
//! # Design Decisions
//! - `Service` is a cheap clone over shared state so probe handlers can reach it
//! - The readiness snapshot is swapped atomically and read without blocking
//! - The cancellation token is owned here; nothing else creates one

pub mod options;
pub mod registry;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ListenerError, ServiceError};
use crate::health::readiness::ReadinessSnapshot;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::SignalTrap;
use crate::net::listener::Protocol;

pub use options::ServiceOption;
pub use registry::{Registry, Settings};

/// Capacity of the error broadcast; slow subscribers observe `Lagged`.
const ERROR_EVENTS_CAPACITY: usize = 64;

/// Lifecycle phase of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Constructed, `start()` not yet called.
    Created,
    /// Listeners launched, waiting for a termination trigger.
    Running,
    /// Trigger received or teardown in progress.
    Draining,
    /// Teardown finished.
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Started {
    pub(crate) at: DateTime<Utc>,
    pub(crate) instant: Instant,
}

pub(crate) struct Inner {
    pub(crate) name: String,
    pub(crate) instance_id: Uuid,
    pub(crate) cancel: CancellationToken,
    pub(crate) registry: Registry,
    pub(crate) started: OnceLock<Started>,
    pub(crate) readiness: ArcSwap<ReadinessSnapshot>,
    pub(crate) phase: watch::Sender<Phase>,
    pub(crate) stopping: AtomicBool,
    pub(crate) trigger: Shutdown,
    pub(crate) trap: Mutex<Option<SignalTrap>>,
    pub(crate) errors_tx: Mutex<Option<mpsc::UnboundedSender<ListenerError>>>,
    pub(crate) errors_rx: Mutex<Option<mpsc::UnboundedReceiver<ListenerError>>>,
    pub(crate) error_events: Mutex<Option<broadcast::Sender<Arc<ListenerError>>>>,
    pub(crate) sink: Mutex<Option<JoinHandle<()>>>,
    pub(crate) sweep: Mutex<Option<JoinHandle<()>>>,
    pub(crate) sweep_stop: CancellationToken,
}

/// Supervisor for one process's listeners, data store and dependent components.
#[derive(Clone)]
pub struct Service {
    pub(crate) inner: Arc<Inner>,
}

impl Service {
    /// Build a service by applying `options` in order to an empty registry.
    ///
    /// The first failing option aborts construction; nothing is returned to
    /// the caller in that case. Must be called inside a Tokio runtime when a
    /// database option is used.
    pub fn new<I>(cancel: CancellationToken, name: impl Into<String>, options: I) -> Result<Self, ServiceError>
    where
        I: IntoIterator<Item = Box<dyn ServiceOption>>,
    {
        let name = name.into();
        let mut registry = Registry::default();
        for option in options {
            option.apply(&mut registry)?;
        }

        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (error_events, _) = broadcast::channel(ERROR_EVENTS_CAPACITY);
        let (phase, _) = watch::channel(Phase::Created);
        let trigger = Shutdown::new();
        let trap = SignalTrap::new(trigger.subscribe());
        let instance_id = Uuid::new_v4();

        tracing::debug!(
            service = %name,
            instance_id = %instance_id,
            listeners = registry.listeners().len(),
            components = registry.components().len(),
            data_store = registry.data_store().is_some(),
            "Service constructed"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                instance_id,
                cancel,
                registry,
                started: OnceLock::new(),
                readiness: ArcSwap::from_pointee(ReadinessSnapshot::default()),
                phase,
                stopping: AtomicBool::new(false),
                trigger,
                trap: Mutex::new(Some(trap)),
                errors_tx: Mutex::new(Some(errors_tx)),
                errors_rx: Mutex::new(Some(errors_rx)),
                error_events: Mutex::new(Some(error_events)),
                sink: Mutex::new(None),
                sweep: Mutex::new(None),
                sweep_stop: CancellationToken::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn instance_id(&self) -> Uuid {
        self.inner.instance_id
    }

    /// The service-owned cancellation token.
    pub fn context(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn phase(&self) -> Phase {
        *self.inner.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.inner.phase.subscribe()
    }

    /// When `start()` was first called.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.started.get().map(|s| s.at)
    }

    /// Time since `start()`; zero before it.
    pub fn uptime(&self) -> Duration {
        self.inner
            .started
            .get()
            .map(|s| s.instant.elapsed())
            .unwrap_or_default()
    }

    /// Programmatic equivalent of SIGTERM.
    pub fn shutdown_trigger(&self) -> Shutdown {
        self.inner.trigger.clone()
    }

    /// Terminal listener errors, until teardown completes.
    ///
    /// The receiver reports `Closed` once the error queue has been drained.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<Arc<ListenerError>> {
        match lock(&self.inner.error_events).as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Attach gRPC service implementations to a registered gRPC listener.
    pub fn attach_grpc_service<F>(&self, address: &str, register: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut tonic::service::RoutesBuilder),
    {
        let grpc = self
            .inner
            .registry
            .find_listener(address, Protocol::Grpc)
            .and_then(|l| l.handle().as_grpc())
            .ok_or_else(|| ServiceError::ListenerNotFound(address.to_string()))?;

        grpc.register(address, register)?;
        tracing::debug!(address = %address, "gRPC service registered");
        Ok(())
    }

    /// Merge application routes into a registered HTTP listener.
    pub fn add_http_routes(&self, address: &str, router: axum::Router) -> Result<(), ServiceError> {
        let http = self
            .inner
            .registry
            .find_listener(address, Protocol::Http)
            .and_then(|l| l.handle().as_http())
            .ok_or_else(|| ServiceError::ListenerNotFound(address.to_string()))?;

        http.merge(address, router)
    }

    /// Move to `Draining` unless already there or beyond.
    pub(crate) fn enter_draining(&self) -> bool {
        self.inner.phase.send_if_modified(|phase| {
            if *phase < Phase::Draining {
                *phase = Phase::Draining;
                true
            } else {
                false
            }
        })
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.name)
            .field("instance_id", &self.inner.instance_id)
            .field("phase", &self.phase())
            .field("listeners", &self.inner.registry.listeners())
            .finish()
    }
}

/// Lock a mutex, recovering the guard if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
