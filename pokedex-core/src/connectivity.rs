//! Online/offline signal: current status plus a transition stream.

use std::time::Duration;

use tokio::sync::watch;

/// Timeout for the startup reachability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Holds the current online/offline status and notifies subscribers on
/// transitions.
///
/// The monitor does not watch the OS network stack itself; it is fed by
/// a reachability probe at startup and by explicit `set_online` calls
/// afterwards. Subscribers only wake on actual transitions.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial status.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Returns the current status.
    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a status change. No-op (and no wakeup) if unchanged.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    /// Subscribes to status transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Probes whether the catalog API is reachable.
///
/// Any HTTP response counts as online; only transport failures (DNS,
/// connect, timeout) count as offline.
pub async fn probe(base_url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Failed to build probe client: {}", e);
            return false;
        }
    };

    match client.get(base_url).send().await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Connectivity probe failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_reflects_initial_state() {
        assert!(ConnectivityMonitor::new(true).current());
        assert!(!ConnectivityMonitor::new(false).current());
    }

    #[test]
    fn test_set_online_updates_current() {
        let monitor = ConnectivityMonitor::new(true);
        monitor.set_online(false);
        assert!(!monitor.current());
        monitor.set_online(true);
        assert!(monitor.current());
    }

    #[tokio::test]
    async fn test_subscriber_sees_transition() {
        let monitor = ConnectivityMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn test_unchanged_status_does_not_notify() {
        let monitor = ConnectivityMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
