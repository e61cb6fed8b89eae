//! Engine stimuli.

use crate::dom::MutationRecord;
use crate::prefs::{PreferenceStore, Preferences, StorageChange, StoreError};
use serde_json::Value;

/// In-page navigation signals that force a full-document sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    NavigateStart,
    NavigateFinish,
    PageDataUpdated,
    /// Standard history navigation.
    PopState,
}

impl NavigationSignal {
    pub const ALL: [NavigationSignal; 4] = [
        Self::PageDataUpdated,
        Self::NavigateFinish,
        Self::NavigateStart,
        Self::PopState,
    ];

    /// Host event name this signal is subscribed under.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::NavigateStart => "yt-navigate-start",
            Self::NavigateFinish => "yt-navigate-finish",
            Self::PageDataUpdated => "yt-page-data-updated",
            Self::PopState => "popstate",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.event_name() == name)
    }
}

/// Point-to-point messages from a control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMessage {
    /// `{ "type": "force-kill" }`: sweep the whole document now.
    ForceRescan,
}

impl RuntimeMessage {
    /// Decodes a message; anything not matching a known shape is `None`.
    pub fn parse(value: &Value) -> Option<Self> {
        match value.as_object()?.get("type")?.as_str()? {
            "force-kill" => Some(Self::ForceRescan),
            _ => None,
        }
    }
}

/// One queued stimulus for the dispatch loop.
#[derive(Debug)]
pub enum EngineEvent {
    /// The host produced its document element; observation can begin.
    DocumentReady,
    /// Completion of the asynchronous initial preference load.
    PreferencesLoaded(Result<Option<Preferences>, StoreError>),
    StorageChanged(StorageChange),
    Mutations(Vec<MutationRecord>),
    Navigation(NavigationSignal),
    Message(Value),
}

impl EngineEvent {
    /// Reads `store` and wraps the outcome as a load-completion event.
    pub fn load_from<S: PreferenceStore + ?Sized>(store: &S) -> Self {
        Self::PreferencesLoaded(store.get())
    }

    /// Builds a navigation event from a host event name.
    pub fn navigation(name: &str) -> Option<Self> {
        NavigationSignal::from_event_name(name).map(Self::Navigation)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentReady => "document_ready",
            Self::PreferencesLoaded(_) => "preferences_loaded",
            Self::StorageChanged(_) => "storage_changed",
            Self::Mutations(_) => "mutations",
            Self::Navigation(_) => "navigation",
            Self::Message(_) => "message",
        }
    }
}
