//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Service::start
//!     → listener.rs (one task per entry, bind + serve)
//!     → http.rs (axum) | grpc.rs (tonic)
//!     → terminal error → service error queue
//!
//! Probes:
//!     → probe.rs (bounded TCP reachability)
//!
//! Listener States:
//!     Registered → Serving → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - Listeners bind inside their own task so bind errors share the serve error path
//! - Each listener tracked for graceful shutdown
//! - Listener launches are unordered relative to each other

pub mod grpc;
pub mod http;
pub mod listener;
pub mod probe;

pub use grpc::GrpcServer;
pub use http::HttpServer;
pub use listener::{Listener, Protocol, ServeContext, ServingHandle};
