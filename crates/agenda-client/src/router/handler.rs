//! Notification handlers.

use agenda_core::EventKind;
use agenda_protocol::NotificationEvent;
use thiserror::Error;
use tracing::{debug, info};

use super::policy::KindPolicy;
use crate::collaborators::Collaborators;

/// A handler could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler needs a policy entry and the table has none.
    #[error("No presentation policy for kind {0}")]
    MissingPolicy(EventKind),

    /// Any other handler-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// What a handler gets besides the event.
pub struct DispatchContext<'a> {
    /// Policy table entry for the event's kind, if any
    pub policy: Option<&'a KindPolicy>,

    /// Presentation collaborators
    pub collaborators: &'a Collaborators,
}

/// Side-effecting reaction to one notification kind.
pub trait NotificationHandler: Send + Sync {
    fn handle(
        &self,
        event: &NotificationEvent,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError>;
}

/// Adapter for closures, see [`NotificationRouter::register_fn`](super::NotificationRouter::register_fn).
pub(crate) struct FnHandler<F>(pub(crate) F);

impl<F> NotificationHandler for FnHandler<F>
where
    F: Fn(&NotificationEvent, &DispatchContext<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        event: &NotificationEvent,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        (self.0)(event, ctx)
    }
}

/// Applies the kind's policy table entry: toast, status transition,
/// counter and sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresentationHandler;

impl NotificationHandler for PresentationHandler {
    fn handle(
        &self,
        event: &NotificationEvent,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        let policy = ctx
            .policy
            .ok_or_else(|| HandlerError::MissingPolicy(event.kind().clone()))?;
        let sinks = ctx.collaborators;

        sinks
            .toast
            .show(&policy.title, event.message_or_empty(), policy.severity);

        if let Some(status) = policy.status_transition {
            match event.reference_id() {
                Some(reference_id) => sinks.entity_status.update(reference_id, status),
                None => debug!(
                    kind = %event.kind(),
                    status = %status,
                    "Event carries no booking reference, skipping status update"
                ),
            }
        }

        if policy.increment_counter {
            sinks.counter.increment();
        }

        if policy.play_sound {
            if let Err(e) = sinks.sound.play() {
                debug!(error = %e, "Ignoring sound playback failure");
            }
        }

        Ok(())
    }
}

/// Logs the event and does nothing else. Used for the server's
/// subscription acknowledgement.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyHandler;

impl NotificationHandler for LogOnlyHandler {
    fn handle(
        &self,
        event: &NotificationEvent,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        info!(
            kind = %event.kind(),
            message = event.message_or_empty(),
            "Notification channel acknowledged"
        );
        Ok(())
    }
}
