//! Notification router.
//!
//! Maps an event's kind to one registered handler and invokes it with the
//! event, the kind's policy table entry and the presentation collaborators.
//!
//! Dispatch never fails from the caller's point of view:
//! - unregistered kinds are dropped (forward compatibility)
//! - handler errors and panics are caught here and logged

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use agenda_core::EventKind;
use agenda_protocol::NotificationEvent;
use tracing::{debug, error};

mod handler;
mod policy;

pub use handler::{
    DispatchContext, HandlerError, LogOnlyHandler, NotificationHandler, PresentationHandler,
};
pub use policy::{KindPolicy, PolicyTable};

use crate::collaborators::Collaborators;
use handler::FnHandler;

/// Result of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No handler registered for the kind; event dropped.
    Unhandled,
    /// Handler ran to completion.
    Handled,
    /// Handler returned an error or panicked.
    Failed,
}

/// Routes decoded events to handlers by kind.
pub struct NotificationRouter {
    handlers: HashMap<EventKind, Arc<dyn NotificationHandler>>,
    table: PolicyTable,
    collaborators: Collaborators,
}

impl NotificationRouter {
    /// Router with no handlers registered.
    pub fn new(table: PolicyTable, collaborators: Collaborators) -> Self {
        Self {
            handlers: HashMap::new(),
            table,
            collaborators,
        }
    }

    /// Router with the standard bindings: every kind in `table` gets the
    /// [`PresentationHandler`], `ConnectionEstablished` gets the
    /// [`LogOnlyHandler`].
    pub fn with_default_handlers(table: PolicyTable, collaborators: Collaborators) -> Self {
        let mut router = Self::new(table, collaborators);
        let presentation: Arc<dyn NotificationHandler> = Arc::new(PresentationHandler);

        let kinds: Vec<EventKind> = router.table.kinds().cloned().collect();
        for kind in kinds {
            router.register_shared(kind, Arc::clone(&presentation));
        }
        router.register(EventKind::ConnectionEstablished, LogOnlyHandler);
        router
    }

    /// Registers `handler` for `kind`. The last registration wins.
    pub fn register<H>(&mut self, kind: EventKind, handler: H)
    where
        H: NotificationHandler + 'static,
    {
        self.register_shared(kind, Arc::new(handler));
    }

    /// Registers a closure for `kind`. The last registration wins.
    pub fn register_fn<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&NotificationEvent, &DispatchContext<'_>) -> Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register(kind, FnHandler(handler));
    }

    /// Registers an already shared handler for `kind`.
    pub fn register_shared(&mut self, kind: EventKind, handler: Arc<dyn NotificationHandler>) {
        if self.handlers.insert(kind.clone(), handler).is_some() {
            debug!(kind = %kind, "Replaced notification handler");
        }
    }

    /// Removes the handler for `kind`, if any.
    pub fn unregister(&mut self, kind: &EventKind) -> bool {
        self.handlers.remove(kind).is_some()
    }

    pub fn is_registered(&self, kind: &EventKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn policy_table(&self) -> &PolicyTable {
        &self.table
    }

    /// Invokes the handler registered for the event's kind.
    pub fn dispatch(&self, event: &NotificationEvent) -> DispatchOutcome {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(kind) else {
            debug!(kind = %kind, known = kind.is_known(), "No handler registered, dropping event");
            return DispatchOutcome::Unhandled;
        };

        let ctx = DispatchContext {
            policy: self.table.get(kind),
            collaborators: &self.collaborators,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event, &ctx))) {
            Ok(Ok(())) => {
                debug!(kind = %kind, "Notification dispatched");
                DispatchOutcome::Handled
            }
            Ok(Err(e)) => {
                error!(kind = %kind, error = %e, "Notification handler failed");
                DispatchOutcome::Failed
            }
            Err(payload) => {
                error!(
                    kind = %kind,
                    panic = panic_message(payload.as_ref()),
                    "Notification handler panicked"
                );
                DispatchOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
