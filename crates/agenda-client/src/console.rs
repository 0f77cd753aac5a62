//! Terminal implementations of the presentation collaborators.
//!
//! Used by the `agenda-notify` binary: toasts become log-style lines, the
//! sound is the terminal bell, and the retry affordance is a prompt that is
//! answered by pressing Enter.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use agenda_core::{ItemStatus, ReferenceId, Severity};
use chrono::Local;
use tracing::debug;

use crate::collaborators::{
    Collaborators, CounterDisplay, EntityStatusDisplay, ManualRetryAffordance,
    PermissionRequester, SoundError, SoundPlayer, StatusDisplay, ToastDisplay,
};
use crate::connection::RetryTrigger;

// ============================================================================
// Output sink
// ============================================================================

/// Shared, line-oriented output. Cloning shares the underlying writer.
#[derive(Clone)]
pub struct ConsoleOutput {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleOutput {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        // A panic while holding the lock leaves only a partial line behind
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes one timestamped line.
    fn line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let mut writer = self.lock();
        writeln!(writer, "{} {}", Local::now().format("%H:%M:%S"), args)?;
        writer.flush()
    }

    /// Like `line`, but failures are only logged.
    fn emit(&self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.line(args) {
            debug!(error = %e, "Console write failed");
        }
    }

    fn raw(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.lock();
        writer.write_all(bytes)?;
        writer.flush()
    }
}

impl fmt::Debug for ConsoleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConsoleOutput")
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Prints online/offline transitions, suppressing repeats.
#[derive(Debug)]
pub struct ConsoleStatus {
    out: ConsoleOutput,
    last: Mutex<Option<bool>>,
}

impl ConsoleStatus {
    pub fn new(out: ConsoleOutput) -> Self {
        Self {
            out,
            last: Mutex::new(None),
        }
    }
}

impl StatusDisplay for ConsoleStatus {
    fn update(&self, connected: bool) {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        if *last == Some(connected) {
            return;
        }
        *last = Some(connected);
        drop(last);

        let label = if connected { "online" } else { "offline" };
        self.out.emit(format_args!("[status] {label}"));
    }
}

#[derive(Debug)]
pub struct ConsoleToast {
    out: ConsoleOutput,
}

impl ConsoleToast {
    pub fn new(out: ConsoleOutput) -> Self {
        Self { out }
    }
}

impl ToastDisplay for ConsoleToast {
    fn show(&self, title: &str, message: &str, severity: Severity) {
        if message.is_empty() {
            self.out.emit(format_args!("[{severity}] {title}"));
        } else {
            self.out.emit(format_args!("[{severity}] {title}: {message}"));
        }
    }
}

#[derive(Debug)]
pub struct ConsoleEntityStatus {
    out: ConsoleOutput,
}

impl ConsoleEntityStatus {
    pub fn new(out: ConsoleOutput) -> Self {
        Self { out }
    }
}

impl EntityStatusDisplay for ConsoleEntityStatus {
    fn update(&self, reference_id: &ReferenceId, status: ItemStatus) {
        self.out
            .emit(format_args!("[booking #{reference_id}] {}", status.label()));
    }
}

/// Counts new bookings since startup.
#[derive(Debug)]
pub struct ConsoleCounter {
    out: ConsoleOutput,
    count: AtomicU64,
}

impl ConsoleCounter {
    pub fn new(out: ConsoleOutput) -> Self {
        Self {
            out,
            count: AtomicU64::new(0),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl CounterDisplay for ConsoleCounter {
    fn increment(&self) {
        let count = self.count.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        self.out.emit(format_args!("[new bookings] {count}"));
    }
}

/// Rings the terminal bell.
#[derive(Debug)]
pub struct TerminalBell {
    out: ConsoleOutput,
}

impl TerminalBell {
    pub fn new(out: ConsoleOutput) -> Self {
        Self { out }
    }
}

impl SoundPlayer for TerminalBell {
    fn play(&self) -> Result<(), SoundError> {
        self.out
            .raw(b"\x07")
            .map_err(|e| SoundError(e.to_string()))
    }
}

/// The terminal needs no permission; the first call prints where
/// notifications will appear.
#[derive(Debug)]
pub struct ConsolePermission {
    out: ConsoleOutput,
    decided: AtomicBool,
}

impl ConsolePermission {
    pub fn new(out: ConsoleOutput) -> Self {
        Self {
            out,
            decided: AtomicBool::new(false),
        }
    }
}

impl PermissionRequester for ConsolePermission {
    fn request_if_undetermined(&self) {
        if self.decided.swap(true, Ordering::Relaxed) {
            return;
        }
        self.out
            .emit(format_args!("Notifications will be shown in this terminal"));
    }
}

/// Prompts for a manual reconnect and holds the trigger until it is
/// answered.
#[derive(Debug)]
pub struct ConsoleRetryPrompt {
    out: ConsoleOutput,
    pending: Mutex<Option<RetryTrigger>>,
}

impl ConsoleRetryPrompt {
    pub fn new(out: ConsoleOutput) -> Self {
        Self {
            out,
            pending: Mutex::new(None),
        }
    }

    /// Takes the trigger if the prompt is currently shown.
    pub fn take_pending(&self) -> Option<RetryTrigger> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).take()
    }

    pub fn is_shown(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }
}

impl ManualRetryAffordance for ConsoleRetryPrompt {
    fn show(&self, retry: RetryTrigger) {
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = Some(retry);
        self.out.emit(format_args!(
            "Could not reach the server. Press Enter to reconnect."
        ));
    }

    fn hide(&self) {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).take();
    }
}

/// Builds the full console collaborator set over one output.
///
/// The retry prompt is also returned on its own so the caller can wire it
/// to stdin.
pub fn console_collaborators(out: ConsoleOutput) -> (Collaborators, Arc<ConsoleRetryPrompt>) {
    let retry = Arc::new(ConsoleRetryPrompt::new(out.clone()));
    let collaborators = Collaborators {
        status: Arc::new(ConsoleStatus::new(out.clone())),
        toast: Arc::new(ConsoleToast::new(out.clone())),
        entity_status: Arc::new(ConsoleEntityStatus::new(out.clone())),
        counter: Arc::new(ConsoleCounter::new(out.clone())),
        sound: Arc::new(TerminalBell::new(out.clone())),
        permission: Arc::new(ConsolePermission::new(out)),
        retry: retry.clone(),
    };
    (collaborators, retry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn output() -> (ConsoleOutput, Buffer) {
        let buffer = Buffer::default();
        (ConsoleOutput::new(buffer.clone()), buffer)
    }

    #[test]
    fn test_toast_line() {
        let (out, buffer) = output();
        let toast = ConsoleToast::new(out);

        toast.show("Booking Cancelled", "Booking #42 cancelled", Severity::Warning);
        toast.show("Reminder", "", Severity::Info);

        let text = buffer.contents();
        assert!(text.contains("[warning] Booking Cancelled: Booking #42 cancelled"));
        assert!(text.contains("[info] Reminder\n"));
    }

    #[test]
    fn test_status_suppresses_repeats() {
        let (out, buffer) = output();
        let status = ConsoleStatus::new(out);

        status.update(false);
        status.update(false);
        status.update(true);

        let text = buffer.contents();
        assert_eq!(text.matches("offline").count(), 1);
        assert_eq!(text.matches("online").count(), 1);
    }

    #[test]
    fn test_counter_counts() {
        let (out, buffer) = output();
        let counter = ConsoleCounter::new(out);

        counter.increment();
        counter.increment();

        assert_eq!(counter.count(), 2);
        assert!(buffer.contents().contains("[new bookings] 2"));
    }

    #[test]
    fn test_entity_status_uses_label() {
        let (out, buffer) = output();
        ConsoleEntityStatus::new(out).update(&ReferenceId::new("42"), ItemStatus::NoShow);

        assert!(buffer.contents().contains("[booking #42]"));
    }

    #[test]
    fn test_bell_failure_is_reported() {
        let bell = TerminalBell::new(ConsoleOutput::new(BrokenPipe));
        assert!(bell.play().is_err());

        let (out, buffer) = output();
        assert!(TerminalBell::new(out).play().is_ok());
        assert_eq!(buffer.contents(), "\x07");
    }

    #[test]
    fn test_permission_notice_printed_once() {
        let (out, buffer) = output();
        let permission = ConsolePermission::new(out);

        permission.request_if_undetermined();
        permission.request_if_undetermined();

        assert_eq!(buffer.contents().lines().count(), 1);
    }

    #[test]
    fn test_retry_prompt_holds_trigger_until_taken() {
        let (out, buffer) = output();
        let prompt = ConsoleRetryPrompt::new(out);
        let (tx, mut rx) = mpsc::unbounded_channel();

        prompt.show(RetryTrigger::new(tx));
        assert!(prompt.is_shown());
        assert!(buffer.contents().contains("Press Enter"));

        let trigger = prompt.take_pending().unwrap();
        assert!(!prompt.is_shown());
        assert!(prompt.take_pending().is_none());

        trigger.activate();
        assert_eq!(rx.try_recv().unwrap().name(), "start");
    }

    #[test]
    fn test_retry_prompt_hide_drops_trigger() {
        let (out, _buffer) = output();
        let prompt = ConsoleRetryPrompt::new(out);
        let (tx, _rx) = mpsc::unbounded_channel();

        prompt.show(RetryTrigger::new(tx));
        prompt.hide();
        assert!(prompt.take_pending().is_none());
    }

    #[test]
    fn test_write_failures_do_not_panic() {
        let out = ConsoleOutput::new(BrokenPipe);
        let (collaborators, _prompt) = console_collaborators(out);

        collaborators.status.update(true);
        collaborators.toast.show("t", "m", Severity::Danger);
        collaborators.counter.increment();
    }
}
