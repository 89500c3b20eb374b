//! Registry of connected native-messaging hosts.

use std::{collections::HashMap, sync::Arc};

use mediakeys_protocol::Msg;
use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// Registry state.
#[derive(Default)]
struct Inner {
    /// Next id handed out.
    next_id: u64,
    /// Outbound queue per connected host.
    hosts: HashMap<u64, UnboundedSender<Msg>>,
}

/// Connected hosts, shared between the control socket and the extension sink.
///
/// Sending never blocks, so the dispatch worker can broadcast from its own
/// thread.
#[derive(Clone, Default)]
pub struct HostRegistry {
    /// Shared state.
    inner: Arc<Mutex<Inner>>,
}

impl HostRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host; returns its id and the queue of messages for it.
    pub fn register(&self) -> (u64, UnboundedReceiver<Msg>) {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.hosts.insert(id, tx);
        debug!(id, hosts = inner.hosts.len(), "host_registered");
        (id, rx)
    }

    /// Remove a host.
    pub fn unregister(&self, id: u64) {
        let mut inner = self.inner.lock();
        if inner.hosts.remove(&id).is_some() {
            debug!(id, hosts = inner.hosts.len(), "host_unregistered");
        }
    }

    /// Number of connected hosts.
    pub fn count(&self) -> usize {
        self.inner.lock().hosts.len()
    }

    /// Queue `msg` for every host; returns how many accepted it. Hosts whose
    /// connection has gone away are dropped.
    pub fn broadcast(&self, msg: &Msg) -> usize {
        let mut inner = self.inner.lock();
        inner.hosts.retain(|_, tx| tx.send(msg.clone()).is_ok());
        inner.hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use mediakeys_protocol::Command;

    use super::*;

    fn action() -> Msg {
        Msg::Action {
            action: Command::SkipForward,
        }
    }

    #[test]
    fn broadcast_reaches_every_host() {
        let reg = HostRegistry::new();
        let (_a, mut rx_a) = reg.register();
        let (_b, mut rx_b) = reg.register();
        assert_eq!(reg.broadcast(&action()), 2);
        assert_eq!(rx_a.try_recv().ok(), Some(action()));
        assert_eq!(rx_b.try_recv().ok(), Some(action()));
    }

    #[test]
    fn closed_hosts_are_pruned() {
        let reg = HostRegistry::new();
        let (_a, rx_a) = reg.register();
        let (_b, _rx_b) = reg.register();
        drop(rx_a);
        assert_eq!(reg.broadcast(&action()), 1);
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn unregister_removes() {
        let reg = HostRegistry::new();
        let (id, _rx) = reg.register();
        reg.unregister(id);
        assert_eq!(reg.count(), 0);
        assert_eq!(reg.broadcast(&action()), 0);
    }
}
