//! Agenda Core - Shared types for the booking notifications client
//!
//! This crate provides the domain vocabulary shared between the wire
//! protocol (agenda-protocol) and the runtime client (agenda-client):
//! connection lifecycle states, the reconnect policy, notification kinds
//! and the presentation values they map to.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod kind;
pub mod policy;
pub mod state;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use kind::{EventKind, ItemStatus, ReferenceId, Severity};
pub use policy::ReconnectPolicy;
pub use state::ConnectionState;
