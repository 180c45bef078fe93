//! Shared fakes and helpers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use service_orchestrator::config::ProbeConfig;
use service_orchestrator::error::{BoxError, DataStoreError, ListenerError};
use service_orchestrator::net::listener::bind;
use service_orchestrator::{
    DataStore, DependentComponent, Protocol, Registry, ServeContext, ServiceError, ServiceOption,
    ServingHandle,
};
use tokio_util::sync::CancellationToken;

/// Records the order in which teardown touches things.
#[derive(Clone, Default)]
pub struct OrderLog(Arc<Mutex<Vec<String>>>);

impl OrderLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A dependent component with a switchable readiness flag.
pub struct FakeComponent {
    name: String,
    ready: AtomicBool,
    releases: AtomicUsize,
    log: OrderLog,
}

impl FakeComponent {
    pub fn new(name: &str, ready: bool, log: &OrderLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ready: AtomicBool::new(ready),
            releases: AtomicUsize::new(0),
            log: log.clone(),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependentComponent for FakeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn release(&self) -> Result<(), BoxError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("component:{}", self.name));
        Ok(())
    }
}

/// A data store whose reachability can be switched at runtime.
pub struct FakeDataStore {
    reachable: AtomicBool,
    closes: AtomicUsize,
    closed_at: Mutex<Option<Instant>>,
    log: OrderLog,
}

impl FakeDataStore {
    pub fn new(reachable: bool, log: &OrderLog) -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(reachable),
            closes: AtomicUsize::new(0),
            closed_at: Mutex::new(None),
            log: log.clone(),
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn closed_at(&self) -> Option<Instant> {
        *self.closed_at.lock().unwrap()
    }
}

#[async_trait]
impl DataStore for FakeDataStore {
    async fn ping(&self, cancel: &CancellationToken) -> Result<(), DataStoreError> {
        if cancel.is_cancelled() {
            return Err(DataStoreError::Cancelled);
        }
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DataStoreError::Ping("connection refused".into()))
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        *self.closed_at.lock().unwrap() = Some(Instant::now());
        self.log.push("datastore");
    }
}

/// A serving handle that accepts until stopped, lingers, then logs its exit.
pub struct ScriptedServer {
    protocol: Protocol,
    linger: Duration,
    fail_on_stop: bool,
    log: OrderLog,
}

impl ScriptedServer {
    pub fn new(protocol: Protocol, log: &OrderLog) -> Arc<Self> {
        Arc::new(Self {
            protocol,
            linger: Duration::ZERO,
            fail_on_stop: false,
            log: log.clone(),
        })
    }

    /// Takes `linger` to stop and then reports a serve error.
    pub fn slow_failing(protocol: Protocol, linger: Duration, log: &OrderLog) -> Arc<Self> {
        Arc::new(Self {
            protocol,
            linger,
            fail_on_stop: true,
            log: log.clone(),
        })
    }
}

#[async_trait]
impl ServingHandle for ScriptedServer {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn serve(&self, ctx: ServeContext) -> Result<(), ListenerError> {
        let listener = bind(&ctx.address).await?;
        loop {
            tokio::select! {
                _ = ctx.stop.cancelled() => break,
                accepted = listener.accept() => drop(accepted),
            }
        }
        drop(listener);

        tokio::time::sleep(self.linger).await;
        self.log.push(format!("{}:{}", self.protocol, ctx.address));

        if self.fail_on_stop {
            Err(ListenerError::Serve {
                address: ctx.address.clone(),
                source: "connection reset while draining".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// Register an arbitrary serving handle.
pub fn with_handle(address: &str, handle: Arc<dyn ServingHandle>) -> Box<dyn ServiceOption> {
    let address = address.to_string();
    Box::new(move |registry: &mut Registry| -> Result<(), ServiceError> {
        registry.add_listener(&address, handle).map(|_| ())
    })
}

/// Probe settings that give up quickly.
pub fn fast_probe() -> ProbeConfig {
    ProbeConfig {
        connect_timeout_ms: 200,
        attempts: 2,
        retry_base_delay_ms: 10,
        retry_max_delay_ms: 20,
    }
}

/// A loopback address that nothing is listening on.
pub async fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
