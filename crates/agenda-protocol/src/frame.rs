//! Outbound client frames.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Frames the client sends to the server.
///
/// The server only understands `ping` (answered with a `pong` notification
/// frame); everything else it silently ignores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Keep-alive probe
    Ping {
        /// Milliseconds since the Unix epoch, echoed back in the pong
        timestamp: i64,
    },
}

impl ClientFrame {
    /// Creates a ping stamped with the current time.
    pub fn ping() -> Self {
        Self::Ping {
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Serializes the frame to its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
