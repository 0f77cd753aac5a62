//! Owner-facing interface to the connection manager.
//!
//! The `ConnectionHandle` is cheap to clone and never fails observably:
//! if the manager task is gone, `start()`/`stop()` are logged and dropped.

use tokio::sync::{mpsc, watch};
use tracing::debug;

use agenda_core::ConnectionState;

use super::commands::ManagerMessage;

/// Point-in-time view of the manager, published after every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionSnapshot {
    /// Current lifecycle state
    pub state: ConnectionState,
    /// Consecutive failed attempts since the last successful open
    pub attempts: u32,
}

/// Handle for driving and observing the connection manager.
#[derive(Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<ManagerMessage>,
    snapshots: watch::Receiver<ConnectionSnapshot>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<ManagerMessage>,
        snapshots: watch::Receiver<ConnectionSnapshot>,
    ) -> Self {
        Self { sender, snapshots }
    }

    /// Requests a connection. No-op if already open or connecting.
    pub fn start(&self) {
        self.send(ManagerMessage::Start);
    }

    /// Disconnects and disables automatic reconnection until the next
    /// `start()`. Safe to call repeatedly and from any state.
    pub fn stop(&self) {
        self.send(ManagerMessage::Stop);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.snapshots.borrow().state
    }

    /// Current state and attempt count.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        *self.snapshots.borrow()
    }

    /// Receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the manager stopped before that happened.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Option<ConnectionSnapshot>
    where
        F: FnMut(&ConnectionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let reached = rx.wait_for(|snapshot| predicate(snapshot)).await.ok().map(|s| *s);
        reached
    }

    /// Trigger suitable for handing to a retry affordance.
    pub fn retry_trigger(&self) -> RetryTrigger {
        RetryTrigger::new(self.sender.clone())
    }

    fn send(&self, message: ManagerMessage) {
        let name = message.name();
        if self.sender.send(message).is_err() {
            debug!(command = name, "Connection manager is gone, dropping command");
        }
    }
}

/// Activation side of the manual-retry affordance.
///
/// Activating only queues a `start()`; it never runs manager code inline,
/// so it is safe to call from inside a collaborator callback.
#[derive(Clone)]
pub struct RetryTrigger {
    sender: mpsc::UnboundedSender<ManagerMessage>,
}

impl RetryTrigger {
    pub(crate) fn new(sender: mpsc::UnboundedSender<ManagerMessage>) -> Self {
        Self { sender }
    }

    /// Queues a manual `start()`.
    pub fn activate(&self) {
        if self.sender.send(ManagerMessage::Start).is_err() {
            debug!("Connection manager is gone, ignoring retry");
        }
    }
}

impl std::fmt::Debug for RetryTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryTrigger")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
