//! Programmatic shutdown trigger.

use tokio::sync::broadcast;

/// In-process equivalent of a termination signal.
///
/// The signal trap subscribes at service construction, so a trigger fired
/// before `start()` reaches its wait is still observed.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown trigger.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the trigger.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the trigger. Has no effect once nobody is waiting.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
