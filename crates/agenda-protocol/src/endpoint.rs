//! Endpoint derivation from the hosting page URL.

use thiserror::Error;
use url::Url;

/// Path of the notifications channel on the booking server.
pub const NOTIFICATIONS_PATH: &str = "/ws/notifications/";

/// Errors deriving the channel endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported page scheme: {0} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Page URL has no host: {0}")]
    MissingHost(String),
}

/// Derives `<ws|wss>://<host>/ws/notifications/` from the page URL.
///
/// The encrypted variant is selected when the page is served over https.
/// Port is kept; credentials, query and fragment are dropped. Passing an
/// already-derived `ws`/`wss` URL yields the same endpoint.
pub fn notifications_endpoint(page: &Url) -> Result<Url, EndpointError> {
    let scheme = match page.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };

    if page.host_str().is_none() {
        return Err(EndpointError::MissingHost(page.to_string()));
    }

    let mut endpoint = page.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|()| EndpointError::UnsupportedScheme(page.scheme().to_string()))?;
    // Both setters only fail for cannot-be-a-base URLs, ruled out by the host check
    let _ = endpoint.set_username("");
    let _ = endpoint.set_password(None);
    endpoint.set_path(NOTIFICATIONS_PATH);
    endpoint.set_query(None);
    endpoint.set_fragment(None);

    Ok(endpoint)
}
