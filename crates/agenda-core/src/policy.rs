//! Reconnection policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DomainError, DomainResult};

/// Default delay before a reconnect attempt.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default number of consecutive failed attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed-interval reconnect policy.
///
/// `max_attempts` bounds the consecutive failed attempts since the last
/// successful open. The attempts counter itself lives in the connection
/// manager; this type only answers questions about it.
///
/// In TOML the interval is written in milliseconds:
///
/// ```toml
/// [reconnect]
/// interval_ms = 5000
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Fixed delay between a failure and the next attempt.
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,

    /// Consecutive failures tolerated before the budget is exhausted.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Records one failure against `attempts` and returns the new count.
    ///
    /// The count never exceeds `max_attempts`.
    pub fn record_failure(&self, attempts: u32) -> u32 {
        if attempts < self.max_attempts {
            attempts.saturating_add(1)
        } else {
            self.max_attempts
        }
    }

    /// Returns true once `attempts` has used up the budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// Rejects a zero interval, which would turn retries into a busy loop.
    pub fn validate(&self) -> DomainResult<()> {
        if self.interval.is_zero() {
            return Err(DomainError::InvalidFieldValue {
                field: "reconnect.interval_ms".to_string(),
                value: "0".to_string(),
                expected: "a positive number of milliseconds".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
