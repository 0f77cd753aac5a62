//! Presentation collaborators invoked by the client core.
//!
//! Everything visual or audible lives behind these traits. The core calls
//! them synchronously from its single task, so implementations must return
//! quickly and must not block on the connection manager. Activation of the
//! retry affordance goes through [`RetryTrigger`], which only queues a
//! command.

use std::sync::Arc;

use agenda_core::{ItemStatus, ReferenceId, Severity};
use thiserror::Error;

use crate::connection::RetryTrigger;

/// Sound playback failure. Always swallowed by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Sound playback failed: {0}")]
pub struct SoundError(pub String);

/// Online/offline indicator.
pub trait StatusDisplay: Send + Sync {
    fn update(&self, connected: bool);
}

/// Transient toast notification.
pub trait ToastDisplay: Send + Sync {
    fn show(&self, title: &str, message: &str, severity: Severity);
}

/// Status badge of one booking in a list.
pub trait EntityStatusDisplay: Send + Sync {
    fn update(&self, reference_id: &ReferenceId, status: ItemStatus);
}

/// Counter of new bookings.
pub trait CounterDisplay: Send + Sync {
    fn increment(&self);
}

/// Notification sound.
pub trait SoundPlayer: Send + Sync {
    fn play(&self) -> Result<(), SoundError>;
}

/// Desktop-notification permission prompt.
pub trait PermissionRequester: Send + Sync {
    /// Asks for permission only if the user has not decided yet.
    fn request_if_undetermined(&self);
}

/// "Reconnect" button shown once retries are exhausted.
pub trait ManualRetryAffordance: Send + Sync {
    /// Shows the affordance. Activating it should call `retry.activate()`.
    fn show(&self, retry: RetryTrigger);

    /// Hides the affordance again (a manual start or stop happened).
    fn hide(&self) {}
}

/// The full set of collaborators, shared by the router and the manager.
#[derive(Clone)]
pub struct Collaborators {
    pub status: Arc<dyn StatusDisplay>,
    pub toast: Arc<dyn ToastDisplay>,
    pub entity_status: Arc<dyn EntityStatusDisplay>,
    pub counter: Arc<dyn CounterDisplay>,
    pub sound: Arc<dyn SoundPlayer>,
    pub permission: Arc<dyn PermissionRequester>,
    pub retry: Arc<dyn ManualRetryAffordance>,
}
