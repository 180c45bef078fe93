//! HTTP serving handle.
//!
//! # Responsibilities
//! - Own the axum Router until the listener launches
//! - Merge probe and metrics routes into technical listeners
//! - Wire up middleware (tracing, request ID, panic recovery, request timeout)
//! - Serve with graceful shutdown on the listener stop token

use async_trait::async_trait;
use axum::Router;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::error::{ListenerError, ServiceError};
use crate::health::handlers;
use crate::net::listener::{bind, Protocol, ServeContext, ServingHandle};

/// Read/write budget for a single request on orchestrator-built listeners.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct HttpState {
    router: Option<Router>,
    tech: bool,
}

/// An HTTP listener's serving handle.
pub struct HttpServer {
    state: Mutex<HttpState>,
    request_timeout: Duration,
}

impl HttpServer {
    /// Serve an application router.
    pub fn new(router: Router) -> Self {
        Self {
            state: Mutex::new(HttpState {
                router: Some(router),
                tech: false,
            }),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Serve the probe and metrics endpoints.
    pub fn tech() -> Self {
        let server = Self::new(Router::new());
        server.enable_tech();
        server
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether the probe endpoints are served here.
    pub fn is_tech(&self) -> bool {
        self.lock().tech
    }

    pub(crate) fn enable_tech(&self) {
        self.lock().tech = true;
    }

    /// Merge more routes into this listener. Fails once the listener has launched.
    pub fn merge(&self, address: &str, router: Router) -> Result<(), ServiceError> {
        let mut state = self.lock();
        let current = state
            .router
            .take()
            .ok_or_else(|| ServiceError::ListenerStarted(address.to_string()))?;
        state.router = Some(current.merge(router));
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HttpState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self, router: Router, tech: bool, ctx: &ServeContext) -> Router {
        let router = if tech {
            router.merge(handlers::routes(ctx.service.clone()))
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new())
                .layer(TimeoutLayer::new(self.request_timeout))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }
}

#[async_trait]
impl ServingHandle for HttpServer {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    async fn serve(&self, ctx: ServeContext) -> Result<(), ListenerError> {
        let (router, tech) = {
            let mut state = self.lock();
            let router = state
                .router
                .take()
                .ok_or_else(|| ListenerError::AlreadyServed(ctx.address.clone()))?;
            (router, state.tech)
        };
        let app = self.build_router(router, tech, &ctx);

        let listener = bind(&ctx.address).await?;
        tracing::info!(address = %ctx.address, tech, "HTTP server starting");

        axum::serve(listener, app)
            .with_graceful_shutdown(ctx.stop.clone().cancelled_owned())
            .await
            .map_err(|e| ListenerError::Serve {
                address: ctx.address.clone(),
                source: Box::new(e),
            })
    }

    fn as_http(&self) -> Option<&HttpServer> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Registry, Service, ServiceOption};
    use axum::routing::get;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    async fn failing_handler() -> &'static str {
        panic!("handler failed")
    }

    async fn slow_handler() -> &'static str {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "late"
    }

    async fn serve(server: HttpServer) -> (Service, JoinHandle<()>, String) {
        let address = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().to_string()
        };
        let server = Arc::new(server);
        let addr = address.clone();
        let option = Box::new(move |registry: &mut Registry| -> Result<(), ServiceError> {
            registry.add_listener(&addr, server).map(|_| ())
        }) as Box<dyn ServiceOption>;
        let service = Service::new(CancellationToken::new(), "http", vec![option]).unwrap();

        let svc = service.clone();
        let task = tokio::spawn(async move { svc.start().await.unwrap() });
        for _ in 0..100 {
            if tokio::net::TcpStream::connect(&address).await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        (service, task, address)
    }

    #[tokio::test]
    async fn panicking_handler_answers_500() {
        let app = Router::new().route("/boom", get(failing_handler));
        let (service, task, address) = serve(HttpServer::new(app)).await;

        let res = reqwest::get(format!("http://{address}/boom")).await.unwrap();
        assert_eq!(res.status(), 500);

        // The listener keeps serving after a panic.
        let res = reqwest::get(format!("http://{address}/boom")).await.unwrap();
        assert_eq!(res.status(), 500);

        service.stop().await;
        task.await.unwrap();
    }

    #[tokio::test]
    async fn request_timeout_is_configurable() {
        let app = Router::new().route("/slow", get(slow_handler));
        let server = HttpServer::new(app).with_request_timeout(Duration::from_millis(100));
        let (service, task, address) = serve(server).await;

        let res = reqwest::get(format!("http://{address}/slow")).await.unwrap();
        assert_eq!(res.status(), 408);

        service.stop().await;
        task.await.unwrap();
    }

    #[test]
    fn merge_fails_once_router_is_taken() {
        let server = HttpServer::tech();
        server.merge("127.0.0.1:1", Router::new()).unwrap();
        server.lock().router.take();

        let err = server.merge("127.0.0.1:1", Router::new()).unwrap_err();
        assert!(matches!(err, ServiceError::ListenerStarted(_)));
        assert!(server.is_tech());
    }
}
