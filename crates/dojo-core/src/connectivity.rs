//! Online/offline signal consumed by the sync coordinator.

use std::sync::Arc;

use tokio::sync::watch;

/// Source of the current network reachability.
pub trait ConnectivityMonitor: Send + Sync {
    /// Receiver holding `true` while the device is online.
    fn observe_connectivity(&self) -> watch::Receiver<bool>;
}

/// Manually driven connectivity state.
///
/// Platforms without a reachability API (and tests) flip it explicitly.
#[derive(Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update reachability. Observers only wake on an actual change.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor for ConnectivitySignal {
    fn observe_connectivity(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_values_do_not_wake_observers() {
        let signal = ConnectivitySignal::new(false);
        let mut rx = signal.observe_connectivity();

        signal.set_online(false);
        assert!(!rx.has_changed().unwrap());

        signal.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert!(signal.is_online());
    }
}
