//! Connectivity signal: an observed online/offline boolean.
//!
//! Reconnects (false→true transitions) are counted so a watcher never misses
//! one, even when several flips land before it gets to observe the channel.

use tokio::sync::watch;

/// Snapshot published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
    /// Number of false→true transitions since the signal was created
    pub reconnects: u64,
}

/// Owner side of the signal; cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct ConnectivitySignal {
    state: watch::Sender<ConnectivityState>,
}

impl ConnectivitySignal {
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(ConnectivityState {
            online,
            reconnects: 0,
        });
        Self { state }
    }

    /// Publish the current reachability; repeated values are not re-emitted.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|state| {
            if state.online == online {
                return false;
            }
            if online {
                state.reconnects += 1;
            }
            state.online = online;
            true
        });

        if changed {
            if online {
                tracing::info!("Connectivity restored");
            } else {
                tracing::warn!("Connectivity lost");
            }
        }
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    /// Raw receiver for callers that only need the current value.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Watcher yielding only reconnects that happen after this call.
    pub fn reconnects(&self) -> ReconnectWatcher {
        let receiver = self.state.subscribe();
        let seen = receiver.borrow().reconnects;
        ReconnectWatcher { receiver, seen }
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Waits for false→true transitions of a [`ConnectivitySignal`].
#[derive(Debug, Clone)]
pub struct ReconnectWatcher {
    receiver: watch::Receiver<ConnectivityState>,
    seen: u64,
}

impl ReconnectWatcher {
    /// Resolves on the next unseen reconnect; `None` once the signal is dropped.
    pub async fn next_reconnect(&mut self) -> Option<()> {
        loop {
            let current = self.receiver.borrow_and_update().reconnects;
            if current > self.seen {
                self.seen = current;
                return Some(());
            }
            self.receiver.changed().await.ok()?;
        }
    }
}
