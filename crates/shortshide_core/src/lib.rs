//! Core engine for hiding YouTube Shorts in a live document.
//! This crate owns classification, reversible hiding and the event loop
//! that keeps both in step with page mutations and user preferences.

pub mod classify;
pub mod dom;
pub mod engine;
pub mod hide;
pub mod logging;
pub mod prefs;
pub mod sweep;

pub use classify::classifier::{
    contains_disfavored_components, has_disfavored_link, is_disfavored_shelf,
    text_suggests_disfavored,
};
pub use classify::rules::{Rules, RulesConfig, RulesError};
pub use classify::target::find_target;
pub use dom::{
    CompiledSelector, HostDocument, Lookup, MemoryDocument, MutationRecord, NodeId, NodeKind,
    SelectorError, SelectorPattern,
};
pub use engine::{
    ContentEngine, DispatchReport, EngineEvent, EventLoop, LoopPhase, NavigationSignal,
    RuntimeMessage, SyncState, Transition,
};
pub use hide::{hide, is_hidden, restore_all, HideOutcome, HIDDEN_ATTR};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use prefs::{
    host_from_url, is_supported_host, resolve, ActiveDecision, JsonFilePreferenceStore,
    MemoryPreferenceStore, PreferenceStatus, PreferenceStore, Preferences, StorageChange,
    StoreError,
};
pub use sweep::{sweep, SweepReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
