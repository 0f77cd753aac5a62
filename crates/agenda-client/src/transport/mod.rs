//! Transport abstraction for the notifications channel.
//!
//! The connection manager only ever talks to a [`Transport`] (to open a
//! link) and to the [`TransportLink`] it returns (to read signals, send
//! frames and close). The production implementation is
//! [`WebSocketTransport`]; tests substitute scripted in-memory links.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod websocket;

pub use websocket::{AuthCookie, WebSocketTransport, DEFAULT_CONNECT_TIMEOUT};

// ============================================================================
// Signals
// ============================================================================

/// Asynchronous notifications delivered by an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// One inbound text frame.
    Frame(String),

    /// Transport-level error. Does not by itself end the link; a `Closed`
    /// follows if the link is gone.
    Error(String),

    /// The link is finished. No further signals follow.
    Closed {
        /// Close reason given by the peer, if any
        reason: Option<String>,
    },
}

// ============================================================================
// Errors
// ============================================================================

/// Transport failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The open attempt failed (refused, DNS, TLS, handshake rejected...).
    #[error("Failed to open transport: {0}")]
    Open(String),

    /// The open attempt did not complete in time.
    #[error("Timed out opening transport after {0:?}")]
    Timeout(Duration),

    /// The handshake request could not be built.
    #[error("Invalid handshake request: {0}")]
    InvalidRequest(String),

    /// Writing a frame failed.
    #[error("Failed to send frame: {0}")]
    Send(String),
}

// ============================================================================
// Traits
// ============================================================================

/// Opens links to the notifications endpoint.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Attempts to open one link.
    async fn open(&self) -> Result<Box<dyn TransportLink>, TransportError>;

    /// Human-readable target, used in logs.
    fn describe(&self) -> String;
}

/// One open duplex link.
///
/// `recv` must be cancel-safe: the pump selects it against shutdown and
/// keep-alive ticks.
#[async_trait]
pub trait TransportLink: Send {
    /// Waits for the next signal. After `Closed` the link is finished.
    async fn recv(&mut self) -> TransportSignal;

    /// Sends one text frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Closes the link. Safe to call on an already-closed link.
    async fn close(&mut self);
}
