//! gRPC serving handle.
//!
//! Services are attached by the embedding application through a
//! `RoutesBuilder` before launch; the listener serves whatever was attached.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;

use crate::error::{ListenerError, ServiceError};
use crate::net::listener::{bind, Protocol, ServeContext, ServingHandle};

/// A gRPC listener's serving handle.
pub struct GrpcServer {
    routes: Mutex<Option<RoutesBuilder>>,
}

impl GrpcServer {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Some(RoutesBuilder::default())),
        }
    }

    /// Attach service implementations. Fails once the listener has launched.
    pub fn register<F>(&self, address: &str, register: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut RoutesBuilder),
    {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let builder = routes
            .as_mut()
            .ok_or_else(|| ServiceError::ListenerStarted(address.to_string()))?;
        register(builder);
        Ok(())
    }
}

impl Default for GrpcServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServingHandle for GrpcServer {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    async fn serve(&self, ctx: ServeContext) -> Result<(), ListenerError> {
        let routes = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| ListenerError::AlreadyServed(ctx.address.clone()))?
            .routes();

        let listener = bind(&ctx.address).await?;
        tracing::info!(address = %ctx.address, "gRPC server starting");

        Server::builder()
            .add_routes(routes)
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                ctx.stop.clone().cancelled_owned(),
            )
            .await
            .map_err(|e| ListenerError::Serve {
                address: ctx.address.clone(),
                source: Box::new(e),
            })
    }

    fn as_grpc(&self) -> Option<&GrpcServer> {
        Some(self)
    }
}
