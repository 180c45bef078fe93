//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (gauges, counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → `/metrics` on technical HTTP listeners (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap; recording without an installed recorder is a no-op

pub mod logging;
pub mod metrics;
