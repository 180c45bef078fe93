//! Resilience helpers.
//!
//! # Design Decisions
//! - Every probe attempt has a deadline; retries are bounded
//! - Jittered backoff keeps concurrent probes from synchronising

pub mod backoff;
