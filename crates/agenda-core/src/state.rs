//! Connection lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the notification channel.
///
/// There is exactly one of these per client process, owned and mutated by
/// the connection manager. Observers only ever see copies.
///
/// ```text
/// Idle ─▶ Connecting ─▶ Open ─▶ Closed ─▶ ReconnectPending ─▶ Connecting ─▶ ...
///                                   │
///                                   └─▶ Exhausted (budget spent, manual start only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Never connected.
    #[default]
    Idle,

    /// An open attempt is in flight.
    Connecting,

    /// Transport is open and frames are flowing.
    Open,

    /// Not connected. Either transient (a reconnect is about to be scheduled)
    /// or quiescent after `stop()`.
    Closed,

    /// A reconnect timer is armed.
    ReconnectPending,

    /// Reconnect budget spent; only an explicit start leaves this state.
    Exhausted,
}

impl ConnectionState {
    /// Returns true only for `Open`.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the manager is working towards a connection on its own
    /// (an attempt in flight or a timer armed).
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, Self::Connecting | Self::ReconnectPending)
    }

    /// Returns a short lowercase label for logs and status lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::ReconnectPending => "reconnect_pending",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
