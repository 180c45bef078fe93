//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness (readiness.rs):
//!     Sweep at startup (and on an interval if configured)
//!     → components AND listeners AND data store
//!     → ArcSwap snapshot
//!     → GET /health/ready reads the snapshot
//!
//! Liveness (liveness.rs):
//!     GET /health/live
//!     → TCP connect per listener + data store ping
//!
//! Status (status.rs):
//!     GET /health
//!     → per-dependency healthy/unhealthy map
//! ```
//!
//! # Design Decisions
//! - Probes return booleans; failures are logged, not propagated
//! - Liveness never writes the readiness snapshot
//! - Handlers (handlers.rs) only see the `Service` handle

pub mod handlers;
pub mod liveness;
pub mod readiness;
pub mod status;

pub use readiness::ReadinessSnapshot;
pub use status::{HealthState, HealthStatus};
