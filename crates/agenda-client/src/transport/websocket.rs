//! WebSocket transport over `tokio-tungstenite`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use super::{Transport, TransportError, TransportLink, TransportSignal};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on a single open attempt (TCP + TLS + upgrade).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity token presented as a cookie on the upgrade request.
#[derive(Clone)]
pub struct AuthCookie {
    pub name: String,
    pub token: String,
}

impl AuthCookie {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }

    fn header_value(&self) -> Result<HeaderValue, TransportError> {
        HeaderValue::from_str(&format!("{}={}", self.name, self.token))
            .map_err(|e| TransportError::InvalidRequest(format!("auth cookie: {e}")))
    }
}

// Keep the token out of logs
impl fmt::Debug for AuthCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCookie")
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Opens WebSocket links to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    endpoint: Url,
    auth: Option<AuthCookie>,
    connect_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            auth: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthCookie) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self) -> Result<Box<dyn TransportLink>, TransportError> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        if let Some(auth) = &self.auth {
            request.headers_mut().insert(COOKIE, auth.header_value()?);
        }

        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|e| TransportError::Open(e.to_string()))?;

        debug!(
            endpoint = %self.endpoint,
            status = %response.status(),
            "WebSocket handshake complete"
        );

        Ok(Box::new(WebSocketLink {
            stream,
            failed: false,
        }))
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

struct WebSocketLink {
    stream: WsStream,
    /// Set after a stream error; the next `recv` reports `Closed`.
    failed: bool,
}

#[async_trait]
impl TransportLink for WebSocketLink {
    async fn recv(&mut self) -> TransportSignal {
        if self.failed {
            return TransportSignal::Closed {
                reason: Some("stream error".to_string()),
            };
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return TransportSignal::Frame(text.as_str().to_owned());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    return match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => TransportSignal::Frame(text),
                        Err(_) => TransportSignal::Error("binary frame is not UTF-8".to_string()),
                    };
                }
                Some(Ok(Message::Close(frame))) => {
                    return TransportSignal::Closed {
                        reason: frame.map(|f| f.reason.as_str().to_owned()),
                    };
                }
                // Control frames are answered by tungstenite itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => {
                    self.failed = true;
                    return TransportSignal::Error(e.to_string());
                }
                None => return TransportSignal::Closed { reason: None },
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(frame))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close did not complete cleanly");
        }
    }
}
