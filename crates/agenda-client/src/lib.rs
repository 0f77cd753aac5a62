//! Agenda Client - Reconnecting notifications client
//!
//! This crate keeps one real-time connection to the booking server's
//! notifications channel, recovers from connection loss with a bounded
//! fixed-interval retry, and routes incoming notifications to presentation
//! collaborators by kind.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐   frames   ┌───────────────────┐  events  ┌────────────────────┐
//! │ Transport │───────────▶│ ConnectionManager │─────────▶│ NotificationRouter │
//! └───────────┘            └───────────────────┘          └────────────────────┘
//!                                   │                               │
//!                          StatusDisplay / retry          Toast / EntityStatus /
//!                                                           Counter / Sound
//! ```
//!
//! - [`connection`]: lifecycle state machine, reconnect timer, link pump
//! - [`router`]: kind → handler registry and the kind policy table
//! - [`transport`]: transport abstraction and the WebSocket implementation
//! - [`collaborators`]: the presentation interfaces the core calls
//! - [`console`]: terminal implementations of those interfaces
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()` outside tests.

pub mod client;
pub mod collaborators;
pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod router;
pub mod transport;

pub use client::{authenticated_transport, NotificationClient, DEFAULT_SHUTDOWN_TIMEOUT};
pub use collaborators::Collaborators;
pub use config::{ClientConfig, ConfigError};
pub use connection::{
    spawn_connection_manager, ConnectionHandle, ConnectionSnapshot, ManagerSettings, RetryTrigger,
};
pub use error::{ClientError, Result};
pub use router::{DispatchOutcome, KindPolicy, NotificationRouter, PolicyTable};
pub use transport::{Transport, TransportError, TransportLink, TransportSignal};

// Re-export the shared vocabulary so callers need only this crate
pub use agenda_core::{ConnectionState, EventKind, ItemStatus, ReconnectPolicy, ReferenceId, Severity};
pub use agenda_protocol::NotificationEvent;
