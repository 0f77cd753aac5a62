//! Connection manager actor - owns the connection lifecycle.
//!
//! The ConnectionManager is the single owner of the connection state, the
//! attempts counter and the live link. Owner commands, open results, link
//! signals and timer expiries all arrive on one queue and are handled one
//! at a time, so frames reach the router in transport order and no state is
//! ever mutated concurrently.
//!
//! # Generations
//!
//! Every open attempt, live link and armed reconnect timer carries the
//! generation that was current when it was created. `connect()` and
//! `stop()` bump the generation, so anything still in flight from an
//! earlier generation is recognised and ignored when it reports back.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel send failures are logged but don't panic

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use agenda_core::{ConnectionState, ReconnectPolicy};
use agenda_protocol::{ClientFrame, NotificationEvent};

use super::commands::ManagerMessage;
use super::handle::{ConnectionSnapshot, RetryTrigger};
use crate::collaborators::{ManualRetryAffordance, StatusDisplay};
use crate::router::NotificationRouter;
use crate::transport::{Transport, TransportError, TransportLink, TransportSignal};

// ============================================================================
// Settings
// ============================================================================

/// Tuning knobs for the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagerSettings {
    /// Reconnect interval and budget
    pub policy: ReconnectPolicy,

    /// Ping interval while open; `None` disables keep-alive
    pub keepalive: Option<Duration>,
}

/// The link currently promoted to `Open`.
struct ActiveLink {
    generation: u64,
    /// Stops the link's pump task, which then closes the link
    cancel: CancellationToken,
}

// ============================================================================
// Connection Manager
// ============================================================================

/// The connection manager actor.
///
/// # Ownership
///
/// The actor owns:
/// - `state` and `attempts`: published to observers through a watch channel
/// - `link`: the pump task of the open link, if any
/// - `timer`: the armed reconnect timer, if any
///
/// Collaborators are called inline from this task. They must not block;
/// the retry affordance gets a [`RetryTrigger`], which only queues a start.
pub struct ConnectionManager {
    /// Message receiver
    receiver: mpsc::UnboundedReceiver<ManagerMessage>,

    /// Sender half handed to spawned tasks (opens, timers, pumps)
    sender: mpsc::UnboundedSender<ManagerMessage>,

    transport: Arc<dyn Transport>,
    router: NotificationRouter,
    status: Arc<dyn StatusDisplay>,
    retry: Arc<dyn ManualRetryAffordance>,
    settings: ManagerSettings,

    state: ConnectionState,
    /// Consecutive failures since the last successful open
    attempts: u32,
    generation: u64,
    link: Option<ActiveLink>,
    timer: Option<JoinHandle<()>>,

    snapshots: watch::Sender<ConnectionSnapshot>,
    cancel_token: CancellationToken,
}

impl ConnectionManager {
    /// Creates a new manager in `Idle`.
    ///
    /// `sender` must feed `receiver`; spawned tasks report back through it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<ManagerMessage>,
        sender: mpsc::UnboundedSender<ManagerMessage>,
        settings: ManagerSettings,
        transport: Arc<dyn Transport>,
        router: NotificationRouter,
        status: Arc<dyn StatusDisplay>,
        retry: Arc<dyn ManualRetryAffordance>,
        snapshots: watch::Sender<ConnectionSnapshot>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            sender,
            transport,
            router,
            status,
            retry,
            settings,
            state: ConnectionState::Idle,
            attempts: 0,
            generation: 0,
            link: None,
            timer: None,
            snapshots,
            cancel_token,
        }
    }

    /// Runs the actor event loop until the cancellation token fires.
    ///
    /// On exit the manager behaves as if `stop()` had been called: the link
    /// is closed and no timer survives.
    pub async fn run(mut self) {
        info!(
            endpoint = %self.transport.describe(),
            interval_ms = self.settings.policy.interval.as_millis() as u64,
            max_attempts = self.settings.policy.max_attempts,
            "Connection manager starting"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                message = self.receiver.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
            }
        }

        self.stop();
        info!(generation = self.generation, "Connection manager stopped");
    }

    fn handle_message(&mut self, message: ManagerMessage) {
        match message {
            ManagerMessage::Start => self.start(),
            ManagerMessage::Stop => self.stop(),
            ManagerMessage::Opened { generation, result } => self.on_opened(generation, result),
            ManagerMessage::Signal { generation, signal } => self.on_signal(generation, signal),
            ManagerMessage::ReconnectDue { generation } => self.on_reconnect_due(generation),
        }
    }

    // ------------------------------------------------------------------------
    // Owner commands
    // ------------------------------------------------------------------------

    fn start(&mut self) {
        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                debug!(state = %self.state, "Start ignored, already connected or connecting");
                return;
            }
            ConnectionState::ReconnectPending => {
                debug!("Start requested while a reconnect is pending, connecting now");
                self.cancel_timer();
            }
            ConnectionState::Exhausted => {
                info!(attempts = self.attempts, "Manual reconnect requested");
                self.retry.hide();
            }
            ConnectionState::Idle | ConnectionState::Closed => {}
        }

        self.connect();
    }

    fn stop(&mut self) {
        let previous = self.state;

        // Anything still in flight now belongs to a dead generation
        self.generation = self.generation.wrapping_add(1);
        self.cancel_timer();
        self.drop_link();

        match previous {
            ConnectionState::Open => self.status.update(false),
            ConnectionState::Exhausted => self.retry.hide(),
            _ => {}
        }

        if previous != ConnectionState::Closed {
            info!(from = %previous, "Connection stopped");
        }
        self.set_state(ConnectionState::Closed);
    }

    // ------------------------------------------------------------------------
    // Opening
    // ------------------------------------------------------------------------

    fn connect(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.set_state(ConnectionState::Connecting);

        debug!(
            generation,
            attempts = self.attempts,
            endpoint = %self.transport.describe(),
            "Opening transport"
        );

        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = transport.open().await;
            if let Err(mpsc::error::SendError(message)) =
                sender.send(ManagerMessage::Opened { generation, result })
            {
                // Manager is gone; don't leak a freshly opened link
                if let ManagerMessage::Opened {
                    result: Ok(mut link),
                    ..
                } = message
                {
                    link.close().await;
                }
            }
        });
    }

    fn on_opened(
        &mut self,
        generation: u64,
        result: Result<Box<dyn TransportLink>, TransportError>,
    ) {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            debug!(
                generation,
                current = self.generation,
                state = %self.state,
                "Discarding superseded open result"
            );
            if let Ok(mut link) = result {
                tokio::spawn(async move { link.close().await });
            }
            return;
        }

        match result {
            Ok(link) => {
                self.attempts = 0;
                self.set_state(ConnectionState::Open);
                info!(generation, endpoint = %self.transport.describe(), "Connected");
                self.status.update(true);

                let cancel = self.cancel_token.child_token();
                tokio::spawn(pump(
                    link,
                    generation,
                    self.sender.clone(),
                    cancel.clone(),
                    self.settings.keepalive,
                ));
                self.link = Some(ActiveLink { generation, cancel });
            }
            Err(e) => {
                warn!(
                    attempt = self.attempts.saturating_add(1),
                    max_attempts = self.settings.policy.max_attempts,
                    error = %e,
                    "Failed to open notifications channel"
                );
                self.handle_connection_loss();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Live link
    // ------------------------------------------------------------------------

    fn on_signal(&mut self, generation: u64, signal: TransportSignal) {
        let is_current = self
            .link
            .as_ref()
            .is_some_and(|link| link.generation == generation);
        if !is_current || self.state != ConnectionState::Open {
            debug!(generation, current = self.generation, "Ignoring signal from stale link");
            return;
        }

        match signal {
            TransportSignal::Frame(text) => self.handle_frame(&text),
            TransportSignal::Error(e) => {
                // A close follows if the link is actually gone
                warn!(error = %e, "Transport error on notifications channel");
            }
            TransportSignal::Closed { reason } => {
                warn!(
                    reason = reason.as_deref().unwrap_or("none"),
                    "Notifications channel closed"
                );
                self.drop_link();
                self.handle_connection_loss();
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match NotificationEvent::decode(text) {
            Ok(event) => {
                self.router.dispatch(&event);
            }
            Err(e) => {
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Reconnection
    // ------------------------------------------------------------------------

    /// Common path for a failed open and for the loss of an open link.
    fn handle_connection_loss(&mut self) {
        self.set_state(ConnectionState::Closed);
        self.status.update(false);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let policy = self.settings.policy;
        self.attempts = policy.record_failure(self.attempts);

        if policy.is_exhausted(self.attempts) {
            self.set_state(ConnectionState::Exhausted);
            warn!(
                attempts = self.attempts,
                "Reconnect budget exhausted, waiting for manual retry"
            );
            self.retry.show(RetryTrigger::new(self.sender.clone()));
            return;
        }

        self.set_state(ConnectionState::ReconnectPending);
        info!(
            attempt = self.attempts,
            max_attempts = policy.max_attempts,
            delay_ms = policy.interval.as_millis() as u64,
            "Reconnect scheduled"
        );

        let generation = self.generation;
        let sender = self.sender.clone();
        self.cancel_timer();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(policy.interval).await;
            // Ignore send error - the manager may have exited meanwhile
            let _ = sender.send(ManagerMessage::ReconnectDue { generation });
        }));
    }

    fn on_reconnect_due(&mut self, generation: u64) {
        if generation != self.generation || self.state != ConnectionState::ReconnectPending {
            debug!(generation, current = self.generation, "Ignoring superseded reconnect timer");
            return;
        }

        self.timer = None;
        self.connect();
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, attempts = self.attempts, "State transition");
        }
        self.state = state;
        self.snapshots.send_replace(ConnectionSnapshot {
            state,
            attempts: self.attempts,
        });
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn drop_link(&mut self) {
        if let Some(link) = self.link.take() {
            link.cancel.cancel();
        }
    }
}

// ============================================================================
// Link pump
// ============================================================================

/// Forwards a link's signals to the manager and sends keep-alive pings.
///
/// Exits after the link reports `Closed`, or closes the link itself when
/// cancelled or when the manager is gone.
async fn pump(
    mut link: Box<dyn TransportLink>,
    generation: u64,
    sender: mpsc::UnboundedSender<ManagerMessage>,
    cancel: CancellationToken,
    keepalive: Option<Duration>,
) {
    let mut ticker = keepalive.filter(|d| !d.is_zero()).map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            signal = link.recv() => {
                let closed = matches!(signal, TransportSignal::Closed { .. });
                if sender.send(ManagerMessage::Signal { generation, signal }).is_err() {
                    break;
                }
                if closed {
                    return;
                }
            }
            _ = next_tick(&mut ticker) => {
                match ClientFrame::ping().encode() {
                    Ok(frame) => {
                        if let Err(e) = link.send(frame).await {
                            let signal = TransportSignal::Error(e.to_string());
                            if sender.send(ManagerMessage::Signal { generation, signal }).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => debug!(error = %e, "Failed to encode keep-alive ping"),
                }
            }
        }
    }

    link.close().await;
    debug!(generation, "Link closed");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
