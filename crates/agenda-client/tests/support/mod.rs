//! Shared test doubles: a scripted transport and recording collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use agenda_client::collaborators::{
    CounterDisplay, EntityStatusDisplay, ManualRetryAffordance, PermissionRequester, SoundError,
    SoundPlayer, StatusDisplay, ToastDisplay,
};
use agenda_client::{
    spawn_connection_manager, Collaborators, ConnectionHandle, ConnectionState, ItemStatus,
    ManagerSettings, NotificationRouter, PolicyTable, ReconnectPolicy, ReferenceId, RetryTrigger,
    Severity, Transport, TransportError, TransportLink, TransportSignal,
};

// ============================================================================
// Scripted transport
// ============================================================================

/// What the next `open()` does.
pub enum Step {
    /// Fail immediately
    Fail,
    /// Succeed immediately
    Accept,
    /// Succeed once the gate fires (or is dropped)
    Hold(oneshot::Receiver<()>),
}

/// Transport whose open attempts follow a script. Once the script runs
/// out every attempt fails.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    opens: AtomicUsize,
    links: Mutex<Vec<LinkController>>,
}

impl MockTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    /// Number of `open()` calls so far.
    pub fn open_calls(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Controllers of every link handed out, in order.
    pub fn links(&self) -> Vec<LinkController> {
        self.links.lock().unwrap().clone()
    }

    pub fn link(&self, index: usize) -> LinkController {
        self.links()[index].clone()
    }

    fn new_link(&self) -> Box<dyn TransportLink> {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        self.links.lock().unwrap().push(LinkController {
            inbound: tx,
            sent: sent.clone(),
            closed: closed.clone(),
        });

        Box::new(MockLink {
            inbound: rx,
            sent,
            closed,
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self) -> Result<Box<dyn TransportLink>, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Fail);

        match step {
            Step::Fail => Err(TransportError::Open("connection refused".to_string())),
            Step::Accept => Ok(self.new_link()),
            Step::Hold(gate) => {
                let _ = gate.await;
                Ok(self.new_link())
            }
        }
    }

    fn describe(&self) -> String {
        "mock://notifications".to_string()
    }
}

struct MockLink {
    inbound: mpsc::UnboundedReceiver<TransportSignal>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl TransportLink for MockLink {
    async fn recv(&mut self) -> TransportSignal {
        self.inbound
            .recv()
            .await
            .unwrap_or(TransportSignal::Closed { reason: None })
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Server side of a mock link.
#[derive(Clone)]
pub struct LinkController {
    inbound: mpsc::UnboundedSender<TransportSignal>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl LinkController {
    pub fn frame(&self, text: &str) {
        let _ = self.inbound.send(TransportSignal::Frame(text.to_string()));
    }

    pub fn error(&self, message: &str) {
        let _ = self.inbound.send(TransportSignal::Error(message.to_string()));
    }

    pub fn close_by_peer(&self) {
        let _ = self.inbound.send(TransportSignal::Closed {
            reason: Some("going away".to_string()),
        });
    }

    /// True once the client closed this link.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

// ============================================================================
// Recording collaborators
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Status(bool),
    Toast {
        title: String,
        message: String,
        severity: Severity,
    },
    EntityStatus {
        reference_id: String,
        status: ItemStatus,
    },
    Counter,
    Sound,
    Permission,
    RetryShown,
    RetryHidden,
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    retry: Mutex<Option<RetryTrigger>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.calls().contains(call)
    }

    /// Status updates, in order.
    pub fn statuses(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status(connected) => Some(connected),
                _ => None,
            })
            .collect()
    }

    /// Calls made by notification handlers (status and retry excluded).
    pub fn presentation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::Toast { .. } | Call::EntityStatus { .. } | Call::Counter | Call::Sound
                )
            })
            .collect()
    }

    /// The trigger handed to the retry affordance most recently.
    pub fn retry_trigger(&self) -> Option<RetryTrigger> {
        self.retry.lock().unwrap().clone()
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            status: self.clone(),
            toast: self.clone(),
            entity_status: self.clone(),
            counter: self.clone(),
            sound: self.clone(),
            permission: self.clone(),
            retry: self.clone(),
        }
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl StatusDisplay for Recorder {
    fn update(&self, connected: bool) {
        self.push(Call::Status(connected));
    }
}

impl ToastDisplay for Recorder {
    fn show(&self, title: &str, message: &str, severity: Severity) {
        self.push(Call::Toast {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        });
    }
}

impl EntityStatusDisplay for Recorder {
    fn update(&self, reference_id: &ReferenceId, status: ItemStatus) {
        self.push(Call::EntityStatus {
            reference_id: reference_id.as_str().to_string(),
            status,
        });
    }
}

impl CounterDisplay for Recorder {
    fn increment(&self) {
        self.push(Call::Counter);
    }
}

impl SoundPlayer for Recorder {
    fn play(&self) -> Result<(), SoundError> {
        self.push(Call::Sound);
        Ok(())
    }
}

impl PermissionRequester for Recorder {
    fn request_if_undetermined(&self) {
        self.push(Call::Permission);
    }
}

impl ManualRetryAffordance for Recorder {
    fn show(&self, retry: RetryTrigger) {
        *self.retry.lock().unwrap() = Some(retry);
        self.push(Call::RetryShown);
    }

    fn hide(&self) {
        self.push(Call::RetryHidden);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub const INTERVAL: Duration = Duration::from_secs(5);

pub fn policy(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy::new(INTERVAL, max_attempts)
}

/// A manager wired to a scripted transport and a recorder, not yet started.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub recorder: Arc<Recorder>,
    pub handle: ConnectionHandle,
    pub cancel_token: CancellationToken,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn new(settings: ManagerSettings, transport: Arc<MockTransport>) -> Self {
        let recorder = Recorder::new();
        let router = NotificationRouter::with_default_handlers(
            PolicyTable::builtin(),
            recorder.collaborators(),
        );
        Self::with_router(settings, transport, recorder, router)
    }

    pub fn with_router(
        settings: ManagerSettings,
        transport: Arc<MockTransport>,
        recorder: Arc<Recorder>,
        router: NotificationRouter,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (handle, task) = spawn_connection_manager(
            settings,
            transport.clone(),
            router,
            recorder.clone(),
            recorder.clone(),
            cancel_token.clone(),
        );
        Self {
            transport,
            recorder,
            handle,
            cancel_token,
            task,
        }
    }

    /// Waits until the manager reports `state`.
    pub async fn wait_state(&self, state: ConnectionState) {
        self.handle
            .wait_for(|s| s.state == state)
            .await
            .expect("manager exited");
    }

    /// Starts the manager and waits for the first link to open.
    pub async fn open(&self) -> LinkController {
        self.handle.start();
        self.wait_state(ConnectionState::Open).await;
        let links = self.transport.links();
        links.last().cloned().expect("no link opened")
    }
}

pub fn settings(max_attempts: u32) -> ManagerSettings {
    ManagerSettings {
        policy: policy(max_attempts),
        keepalive: None,
    }
}

/// Polls `condition` on the (possibly paused) clock until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met in time");
}
