//! Error types for the notifications client.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// Client Error Type
// ============================================================================

/// Errors surfaced while setting up or tearing down the client.
///
/// Nothing that happens on the connection itself ends up here: transport
/// failures are handled by the connection manager and only show up as state
/// transitions and collaborator calls.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No identity token is available, so the channel would be rejected.
    #[error("No identity token available; set --token or AGENDA_TOKEN")]
    Unauthenticated,

    /// The manager task did not finish within the shutdown grace period.
    #[error("Connection manager did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// The manager task panicked or was aborted.
    #[error("Connection manager task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
