//! Messages processed by the connection manager.
//!
//! Owner commands (`Start`, `Stop`) and transport signals share one queue,
//! so the manager sees them strictly one at a time and in arrival order.

use crate::transport::{TransportError, TransportLink, TransportSignal};

/// Everything the manager task reacts to.
pub(crate) enum ManagerMessage {
    /// Owner (or retry affordance) asked for a connection.
    Start,

    /// Owner asked to disconnect and stay disconnected.
    Stop,

    /// An open attempt finished.
    Opened {
        /// Generation the attempt was started under
        generation: u64,
        /// The open link, or why it could not be opened
        result: Result<Box<dyn TransportLink>, TransportError>,
    },

    /// A live link produced a signal.
    Signal {
        /// Generation of the link that produced it
        generation: u64,
        signal: TransportSignal,
    },

    /// A reconnect timer fired.
    ReconnectDue {
        /// Generation the timer was armed under
        generation: u64,
    },
}

impl ManagerMessage {
    /// Short name for logs.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Opened { .. } => "opened",
            Self::Signal { .. } => "signal",
            Self::ReconnectDue { .. } => "reconnect_due",
        }
    }
}
