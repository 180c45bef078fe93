//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM and SIGINT handlers (Ctrl-C elsewhere)
//! - Merge them with the programmatic trigger and the service cancellation token
//! - Report the result as a tagged outcome, consumed once
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancellation of the service token is a failure, not a termination

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// What ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    Terminate,
    Interrupt,
    /// `Service::shutdown_trigger()` fired.
    Trigger,
}

/// Why the wait failed.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to install {signal} handler: {source}")]
    Install {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("service context cancelled")]
    Cancelled,
}

/// Result of waiting on a [`SignalTrap`].
#[derive(Debug)]
pub enum SignalOutcome {
    /// A recognised termination trigger arrived.
    Terminated(TermSignal),
    /// The wait itself failed.
    Failed(SignalError),
}

/// Blocks until termination is requested.
pub struct SignalTrap {
    manual: broadcast::Receiver<()>,
}

impl SignalTrap {
    pub fn new(manual: broadcast::Receiver<()>) -> Self {
        Self { manual }
    }

    /// Wait for a termination signal, the manual trigger, or cancellation.
    pub async fn wait(mut self, cancel: &CancellationToken) -> SignalOutcome {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut term = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(source) => {
                    return SignalOutcome::Failed(SignalError::Install {
                        signal: "SIGTERM",
                        source,
                    })
                }
            };
            let mut interrupt = match signal(SignalKind::interrupt()) {
                Ok(s) => s,
                Err(source) => {
                    return SignalOutcome::Failed(SignalError::Install {
                        signal: "SIGINT",
                        source,
                    })
                }
            };

            tokio::select! {
                _ = term.recv() => SignalOutcome::Terminated(TermSignal::Terminate),
                _ = interrupt.recv() => SignalOutcome::Terminated(TermSignal::Interrupt),
                _ = self.manual.recv() => SignalOutcome::Terminated(TermSignal::Trigger),
                _ = cancel.cancelled() => SignalOutcome::Failed(SignalError::Cancelled),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => SignalOutcome::Terminated(TermSignal::Interrupt),
                    Err(source) => SignalOutcome::Failed(SignalError::Install {
                        signal: "Ctrl-C",
                        source,
                    }),
                },
                _ = self.manual.recv() => SignalOutcome::Terminated(TermSignal::Trigger),
                _ = cancel.cancelled() => SignalOutcome::Failed(SignalError::Cancelled),
            }
        }
    }
}
