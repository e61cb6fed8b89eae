//! User preferences and the derived active decision.
//!
//! # Responsibility
//! - Model the `{ enabled, perHost }` snapshot and its lenient wire form.
//! - Resolve the snapshot plus host name into `ActiveDecision`.
//! - Define the read-only store contract the engine consumes.
//!
//! # Invariants
//! - Snapshots are replaced wholesale, never edited in place by the core.
//! - The core never writes preferences back to a store.

pub mod model;
pub mod resolver;
pub mod store;

pub use model::Preferences;
pub use resolver::{host_from_url, is_supported_host, resolve, PreferenceStatus};
pub use store::{
    JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore, StorageChange, StoreError,
};

/// Whether hiding is currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveDecision {
    Active,
    Inactive,
}

impl ActiveDecision {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl From<bool> for ActiveDecision {
    fn from(value: bool) -> Self {
        if value {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}
