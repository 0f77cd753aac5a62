//! Agenda Protocol - Wire protocol for the notifications channel
//!
//! This crate provides frame types and decoding for the server-push
//! channel between the booking server and the notifications client:
//! inbound notification frames, outbound keep-alive frames and the
//! endpoint derivation rule.

pub mod endpoint;
pub mod event;
pub mod frame;

pub use endpoint::{notifications_endpoint, EndpointError, NOTIFICATIONS_PATH};
pub use event::{DecodeError, NotificationEvent};
pub use frame::ClientFrame;
