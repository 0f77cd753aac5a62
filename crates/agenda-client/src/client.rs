//! Composition root for the notifications client.
//!
//! `NotificationClient` wires a transport, the router and the collaborators
//! to a connection manager, asks for notification permission once, and
//! starts connecting. The owner keeps the client for the lifetime of the
//! hosting page and calls [`NotificationClient::shutdown`] when it goes away.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::collaborators::Collaborators;
use crate::config::ClientConfig;
use crate::connection::{spawn_connection_manager, ConnectionHandle, ManagerSettings};
use crate::error::{ClientError, Result};
use crate::router::NotificationRouter;
use crate::transport::{AuthCookie, Transport, WebSocketTransport};

/// Grace period for the manager to close its link on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Builds the WebSocket transport for `config`, presenting `token` as the
/// identity cookie.
///
/// Fails with [`ClientError::Unauthenticated`] when no usable token is
/// given: the server rejects anonymous channels, so there is no point
/// connecting.
pub fn authenticated_transport(
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<WebSocketTransport> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ClientError::Unauthenticated)?;

    let endpoint = config.endpoint()?;
    Ok(WebSocketTransport::new(endpoint)
        .with_auth(AuthCookie::new(config.auth_cookie.clone(), token)))
}

/// A running notifications client.
pub struct NotificationClient {
    handle: ConnectionHandle,
    task: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl NotificationClient {
    /// Launches a client with the default handlers for `config`'s policy
    /// table and starts connecting.
    pub fn launch(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        collaborators: Collaborators,
        cancel_token: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let router =
            NotificationRouter::with_default_handlers(config.policy_table(), collaborators.clone());
        Ok(Self::launch_with_router(
            config.manager_settings(),
            transport,
            router,
            &collaborators,
            cancel_token,
        ))
    }

    /// Launches a client around a caller-built router.
    pub fn launch_with_router(
        settings: ManagerSettings,
        transport: Arc<dyn Transport>,
        router: NotificationRouter,
        collaborators: &Collaborators,
        cancel_token: CancellationToken,
    ) -> Self {
        // Independent of connection state, so ask before the first attempt
        collaborators.permission.request_if_undetermined();

        let (handle, task) = spawn_connection_manager(
            settings,
            transport,
            router,
            Arc::clone(&collaborators.status),
            Arc::clone(&collaborators.retry),
            cancel_token.clone(),
        );
        handle.start();
        info!("Notification client launched");

        Self {
            handle,
            task,
            cancel_token,
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Stops the connection and waits for the manager task to finish.
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        self.handle.stop();
        self.cancel_token.cancel();

        match tokio::time::timeout(timeout, self.task).await {
            Ok(Ok(())) => {
                debug!("Connection manager joined");
                Ok(())
            }
            Ok(Err(e)) => Err(ClientError::TaskFailed(e.to_string())),
            Err(_) => Err(ClientError::ShutdownTimeout(timeout)),
        }
    }
}
