//! Kind-to-presentation policy table.
//!
//! The single source of truth for what each notification kind looks like:
//! toast title, severity, the status transition applied to the referenced
//! booking, and whether the counter and sound fire. The built-in table can
//! be overridden per kind from configuration.

use std::collections::HashMap;

use agenda_core::{EventKind, ItemStatus, Severity};
use serde::{Deserialize, Serialize};

/// Presentation policy for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindPolicy {
    /// Toast title
    pub title: String,

    /// Toast styling
    pub severity: Severity,

    /// Status applied to the referenced booking, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_transition: Option<ItemStatus>,

    /// Bump the new-bookings counter
    #[serde(default)]
    pub increment_counter: bool,

    /// Play the notification sound
    #[serde(default)]
    pub play_sound: bool,
}

impl KindPolicy {
    /// Toast-only policy.
    pub fn toast(title: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            severity,
            status_transition: None,
            increment_counter: false,
            play_sound: false,
        }
    }

    #[must_use]
    pub fn with_transition(mut self, status: ItemStatus) -> Self {
        self.status_transition = Some(status);
        self
    }

    #[must_use]
    pub fn with_counter(mut self) -> Self {
        self.increment_counter = true;
        self
    }

    #[must_use]
    pub fn with_sound(mut self) -> Self {
        self.play_sound = true;
        self
    }
}

/// Mapping from kind to policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    entries: HashMap<EventKind, KindPolicy>,
}

impl PolicyTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The booking panel's standard table.
    ///
    /// `ConnectionEstablished` has no entry: it has no visual effect.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            EventKind::ItemCreated,
            KindPolicy::toast("New Booking", Severity::Success)
                .with_counter()
                .with_sound(),
        );
        table.insert(
            EventKind::ItemConfirmed,
            KindPolicy::toast("Booking Confirmed", Severity::Info)
                .with_transition(ItemStatus::Confirmed),
        );
        table.insert(
            EventKind::ItemCancelled,
            KindPolicy::toast("Booking Cancelled", Severity::Warning)
                .with_transition(ItemStatus::Cancelled),
        );
        table.insert(
            EventKind::ItemReminder,
            KindPolicy::toast("Reminder", Severity::Info),
        );
        table.insert(
            EventKind::ItemNoShow,
            KindPolicy::toast("Client No-Show", Severity::Danger)
                .with_transition(ItemStatus::NoShow),
        );
        table
    }

    /// Inserts or replaces the policy for `kind`, returning the previous one.
    pub fn insert(&mut self, kind: EventKind, policy: KindPolicy) -> Option<KindPolicy> {
        self.entries.insert(kind, policy)
    }

    pub fn get(&self, kind: &EventKind) -> Option<&KindPolicy> {
        self.entries.get(kind)
    }

    /// Replaces entries with the given overrides; other entries are kept.
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = (EventKind, KindPolicy)>) {
        for (kind, policy) in overrides {
            self.entries.insert(kind, policy);
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &EventKind> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
