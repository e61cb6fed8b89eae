//! Preference synchronization state.
//!
//! # Invariants
//! - Starts optimistic (`Active`) so the first sweep runs before preferences
//!   arrive.
//! - Mutated only through `apply`, which replaces the snapshot wholesale.

use crate::prefs::{ActiveDecision, Preferences};

/// Decision change produced by one `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged(ActiveDecision),
    Activated,
    Deactivated,
}

impl Transition {
    pub fn decision(self) -> ActiveDecision {
        match self {
            Self::Unchanged(decision) => decision,
            Self::Activated => ActiveDecision::Active,
            Self::Deactivated => ActiveDecision::Inactive,
        }
    }
}

/// Current preferences, host and derived decision.
#[derive(Debug, Clone)]
pub struct SyncState {
    preferences: Preferences,
    host: String,
    decision: ActiveDecision,
}

impl SyncState {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            preferences: Preferences::default(),
            host: host.into(),
            decision: ActiveDecision::Active,
        }
    }

    /// Replaces the snapshot and recomputes the decision.
    pub fn apply(&mut self, preferences: Preferences) -> Transition {
        let next = preferences.decision_for(&self.host);
        self.preferences = preferences;
        let previous = std::mem::replace(&mut self.decision, next);
        match (previous, next) {
            (ActiveDecision::Inactive, ActiveDecision::Active) => Transition::Activated,
            (ActiveDecision::Active, ActiveDecision::Inactive) => Transition::Deactivated,
            (_, unchanged) => Transition::Unchanged(unchanged),
        }
    }

    pub fn decision(&self) -> ActiveDecision {
        self.decision
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}
