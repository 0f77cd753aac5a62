//! Inbound notification frames.
//!
//! One JSON object per frame:
//!
//! ```json
//! {"type": "agendamento_cancelado", "message": "Booking #42 cancelled", "agendamento_id": 42}
//! ```
//!
//! `type` is mandatory and must be a string. `message` is optional. The
//! entity reference travels as `agendamento_id` and may be a string or an
//! integer. Unrecognised fields are ignored.

use agenda_core::{EventKind, ReferenceId};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Reasons a frame could not be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not JSON at all.
    #[error("Frame is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Payload is JSON but not an object.
    #[error("Frame is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    /// The `type` discriminator is absent or not a string.
    #[error("Frame has no string `type` field")]
    MissingDiscriminator,

    /// A known field has the wrong shape.
    #[error("Frame has an invalid field: {0}")]
    InvalidField(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "agendamento_id", deserialize_with = "deserialize_reference")]
    reference_id: Option<ReferenceId>,
}

fn deserialize_reference<'de, D>(deserializer: D) -> Result<Option<ReferenceId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(ReferenceId::new(s))),
        Value::Number(n) => Ok(Some(ReferenceId::new(n.to_string()))),
        other => Err(serde::de::Error::custom(format!(
            "agendamento_id must be a string or integer, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A decoded notification.
///
/// Built from exactly one inbound frame and consumed synchronously by the
/// router. The kind is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    kind: EventKind,
    message: Option<String>,
    reference_id: Option<ReferenceId>,
}

impl NotificationEvent {
    /// Creates an event with no message or reference.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            message: None,
            reference_id: None,
        }
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the entity reference.
    #[must_use]
    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(ReferenceId::new(reference_id));
        self
    }

    /// Decodes one text frame.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(frame).map_err(DecodeError::Malformed)?;

        match &value {
            Value::Object(map) => {
                if !matches!(map.get("type"), Some(Value::String(_))) {
                    return Err(DecodeError::MissingDiscriminator);
                }
            }
            other => return Err(DecodeError::NotAnObject(json_type_name(other))),
        }

        let raw: RawFrame = serde_json::from_value(value).map_err(DecodeError::InvalidField)?;

        Ok(Self {
            kind: EventKind::from(raw.kind),
            message: raw.message,
            reference_id: raw.reference_id,
        })
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Message text, or an empty string when the frame carried none.
    pub fn message_or_empty(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    pub fn reference_id(&self) -> Option<&ReferenceId> {
        self.reference_id.as_ref()
    }
}
