//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Created → Running: launch listeners → readiness sweep → wait
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT/trigger → Draining
//!     wait failure → Err from start()
//!
//! Teardown (teardown.rs):
//!     components → gRPC → HTTP (deadline) → data store → error queue → Stopped
//!
//! Error fan-in (sink.rs):
//!     listener tasks → queue → start() loop, then the sink task → subscribers
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown regardless of which part failed first
//! - HTTP draining has a deadline; gRPC draining does not
//! - The queue closes only after every producer has exited

pub mod shutdown;
pub mod signals;
pub(crate) mod sink;
pub mod startup;
pub mod teardown;

pub use shutdown::Shutdown;
pub use signals::{SignalError, SignalOutcome, SignalTrap, TermSignal};
