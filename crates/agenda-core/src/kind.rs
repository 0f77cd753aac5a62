//! Notification kinds and the presentation values they map to.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Event Kind
// ============================================================================

/// Discriminator of a notification event.
///
/// Parsed from the frame's `type` field. Both the canonical camelCase names
/// and the legacy names emitted by the booking server are accepted. Any other
/// tag is kept verbatim in `Other` so that newer server kinds stay valid and
/// can still be registered against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Server acknowledged the subscription. Logged only.
    ConnectionEstablished,

    /// A booking was created.
    ItemCreated,

    /// A booking was confirmed.
    ItemConfirmed,

    /// A booking was cancelled.
    ItemCancelled,

    /// Reminder for an upcoming booking.
    ItemReminder,

    /// The client did not show up.
    ItemNoShow,

    /// Any tag this build does not know about.
    Other(String),
}

impl EventKind {
    /// Parses a wire tag. Never fails.
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            "connectionEstablished" | "connection_established" => Self::ConnectionEstablished,
            "itemCreated" | "novo_agendamento" => Self::ItemCreated,
            "itemConfirmed" | "agendamento_confirmado" => Self::ItemConfirmed,
            "itemCancelled" | "agendamento_cancelado" => Self::ItemCancelled,
            "itemReminder" | "lembrete_agendamento" => Self::ItemReminder,
            "itemNoShow" | "cliente_nao_compareceu" => Self::ItemNoShow,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConnectionEstablished => "connectionEstablished",
            Self::ItemCreated => "itemCreated",
            Self::ItemConfirmed => "itemConfirmed",
            Self::ItemCancelled => "itemCancelled",
            Self::ItemReminder => "itemReminder",
            Self::ItemNoShow => "itemNoShow",
            Self::Other(tag) => tag,
        }
    }

    /// Returns true for every kind except `Other`.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// All kinds this build knows about.
    pub fn known() -> [EventKind; 6] {
        [
            Self::ConnectionEstablished,
            Self::ItemCreated,
            Self::ItemConfirmed,
            Self::ItemCancelled,
            Self::ItemReminder,
            Self::ItemNoShow,
        ]
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match Self::from_wire(&tag) {
            Self::Other(_) => Self::Other(tag),
            known => known,
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        Self::from_wire(tag)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Display styling for a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Item Status
// ============================================================================

/// Status of a booking as shown in the panel's booking list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl ItemStatus {
    /// Wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Human-readable badge text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No Show",
        }
    }

    /// Parses a status name, including the booking server's legacy names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scheduled" | "agendado" => Some(Self::Scheduled),
            "confirmed" | "confirmado" => Some(Self::Confirmed),
            "in_progress" | "em_andamento" => Some(Self::InProgress),
            "completed" | "concluido" => Some(Self::Completed),
            "cancelled" | "cancelado" => Some(Self::Cancelled),
            "no_show" | "nao_compareceu" => Some(Self::NoShow),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reference Identifier
// ============================================================================

/// Correlation identifier of the booking an event refers to.
///
/// The server sends it as a JSON string or integer; both are normalised to
/// their decimal/string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
