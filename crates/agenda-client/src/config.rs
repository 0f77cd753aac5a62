//! Client configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) is a valid configuration:
//!
//! ```toml
//! page_url = "https://salon.example.com/"
//! keepalive_secs = 30
//! auth_cookie = "sessionid"
//!
//! [reconnect]
//! interval_ms = 5000
//! max_attempts = 5
//!
//! [kinds.itemReminder]
//! title = "Upcoming appointment"
//! severity = "warning"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use agenda_core::{DomainError, EventKind, ReconnectPolicy};
use agenda_protocol::{notifications_endpoint, EndpointError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::connection::ManagerSettings;
use crate::router::{KindPolicy, PolicyTable};

/// Default origin of the hosting page.
pub const DEFAULT_PAGE_URL: &str = "http://localhost:8000/";

/// Default name of the cookie carrying the identity token.
pub const DEFAULT_AUTH_COOKIE: &str = "sessionid";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected structure.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(#[from] DomainError),

    /// `page_url` does not yield a usable notifications endpoint.
    #[error("invalid page_url: {0}")]
    Endpoint(#[from] EndpointError),
}

/// Runtime configuration of the notifications client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin of the hosting page; the channel endpoint is derived from it
    pub page_url: String,

    /// Reconnect interval and budget
    pub reconnect: ReconnectPolicy,

    /// Keep-alive ping interval in seconds; absent or 0 disables pings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive_secs: Option<u64>,

    /// Cookie name used to present the identity token
    pub auth_cookie: String,

    /// Per-kind overrides merged over the built-in policy table
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub kinds: HashMap<EventKind, KindPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            keepalive_secs: None,
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
            kinds: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Location of the per-user configuration file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agenda-notify").join("config.toml"))
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user file is read
    /// if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                other => {
                    debug!(path = ?other, "No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!(path = %path.display(), "Loading configuration");
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reconnect.validate()?;
        if self.auth_cookie.trim().is_empty() {
            return Err(DomainError::InvalidFieldValue {
                field: "auth_cookie".to_string(),
                value: self.auth_cookie.clone(),
                expected: "a non-empty cookie name".to_string(),
            }
            .into());
        }
        self.endpoint()?;
        Ok(())
    }

    /// The notifications endpoint derived from `page_url`.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let page = Url::parse(&self.page_url).map_err(EndpointError::from)?;
        Ok(notifications_endpoint(&page)?)
    }

    pub fn keepalive(&self) -> Option<Duration> {
        self.keepalive_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Built-in policy table with the configured overrides applied.
    pub fn policy_table(&self) -> PolicyTable {
        let mut table = PolicyTable::builtin();
        table.merge(self.kinds.clone());
        table
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            policy: self.reconnect,
            keepalive: self.keepalive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::{ItemStatus, Severity};
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.reconnect.interval, Duration::from_secs(5));
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.keepalive(), None);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "ws://localhost:8000/ws/notifications/"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ClientConfig::from_toml_str("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = ClientConfig::from_toml_str(
            r#"
page_url = "https://salon.example.com/painel/"
keepalive_secs = 30

[reconnect]
interval_ms = 250
max_attempts = 3

[kinds.lembrete_agendamento]
title = "Upcoming appointment"
severity = "warning"
"#,
        )
        .unwrap();

        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://salon.example.com/ws/notifications/"
        );
        assert_eq!(config.keepalive(), Some(Duration::from_secs(30)));

        let settings = config.manager_settings();
        assert_eq!(settings.policy.interval, Duration::from_millis(250));
        assert_eq!(settings.policy.max_attempts, 3);

        // Legacy key resolves to the canonical kind
        let table = config.policy_table();
        let reminder = table.get(&EventKind::ItemReminder).unwrap();
        assert_eq!(reminder.title, "Upcoming appointment");
        assert_eq!(reminder.severity, Severity::Warning);
        assert_eq!(
            table.get(&EventKind::ItemCancelled).unwrap().status_transition,
            Some(ItemStatus::Cancelled)
        );
    }

    #[test]
    fn test_zero_keepalive_disables_pings() {
        let config = ClientConfig::from_toml_str("keepalive_secs = 0").unwrap();
        assert_eq!(config.keepalive(), None);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ClientConfig::from_toml_str("[reconnect]\ninterval_ms = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_page_scheme_rejected() {
        let result = ClientConfig::from_toml_str("page_url = \"ftp://salon.example.com/\"");
        assert!(matches!(result, Err(ConfigError::Endpoint(_))));
    }

    #[test]
    fn test_empty_cookie_name_rejected() {
        let result = ClientConfig::from_toml_str("auth_cookie = \"\"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ClientConfig::from_toml_str("page_url = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_url = \"http://127.0.0.1:9000/\"").unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "ws://127.0.0.1:9000/ws/notifications/"
        );
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let result = ClientConfig::load(Some(&missing));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
