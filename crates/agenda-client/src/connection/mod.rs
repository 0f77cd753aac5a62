//! Connection lifecycle using the Actor pattern.
//!
//! ```text
//! ┌──────────────────┐  Start/Stop   ┌───────────────────┐  dispatch  ┌────────────────────┐
//! │ ConnectionHandle │──────────────▶│ ConnectionManager │───────────▶│ NotificationRouter │
//! └──────────────────┘   (mpsc)      └───────────────────┘            └────────────────────┘
//!          ▲                           ▲   ▲          │
//!          │ ConnectionSnapshot        │   │ Opened   │ spawns
//!          │ (watch)                   │   │ Signal   ▼
//!          └───────────────────────────┘   └── open task / link pump / reconnect timer
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - Channel operations handle closure gracefully

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod actor;
mod commands;
mod handle;

pub use actor::{ConnectionManager, ManagerSettings};
pub use handle::{ConnectionHandle, ConnectionSnapshot, RetryTrigger};

use crate::collaborators::{ManualRetryAffordance, StatusDisplay};
use crate::router::NotificationRouter;
use crate::transport::Transport;

/// Spawns the connection manager and returns a handle for interaction.
///
/// The manager starts in `Idle`; call [`ConnectionHandle::start`] to
/// connect. It runs until `cancel_token` is cancelled, closing any open
/// link on the way out.
///
/// # Example
///
/// ```ignore
/// let (handle, task) = spawn_connection_manager(
///     ManagerSettings::default(),
///     Arc::new(transport),
///     router,
///     collaborators.status.clone(),
///     collaborators.retry.clone(),
///     cancel_token.clone(),
/// );
/// handle.start();
/// ```
pub fn spawn_connection_manager(
    settings: ManagerSettings,
    transport: Arc<dyn Transport>,
    router: NotificationRouter,
    status: Arc<dyn StatusDisplay>,
    retry: Arc<dyn ManualRetryAffordance>,
    cancel_token: CancellationToken,
) -> (ConnectionHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(ConnectionSnapshot::default());

    let manager = ConnectionManager::new(
        receiver,
        sender.clone(),
        settings,
        transport,
        router,
        status,
        retry,
        snapshot_tx,
        cancel_token,
    );
    let task = tokio::spawn(manager.run());

    (ConnectionHandle::new(sender, snapshot_rx), task)
}
