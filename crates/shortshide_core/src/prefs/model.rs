//! Preferences snapshot.
//!
//! Wire shape: `{ "enabled": bool, "perHost": { host: bool } }`.
//! Decoding is lenient: extra fields are ignored, `enabled` is true unless it
//! is literally `false`, a missing or non-object `perHost` is empty, and
//! non-boolean per-host entries are skipped.

use crate::prefs::resolver::resolve;
use crate::prefs::ActiveDecision;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable preferences snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct Preferences {
    /// Global kill switch; `false` disables hiding everywhere.
    pub enabled: bool,
    /// Per-host overrides keyed by exact host name.
    pub per_host: BTreeMap<String, bool>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enabled: true,
            per_host: BTreeMap::new(),
        }
    }
}

impl From<Value> for Preferences {
    fn from(value: Value) -> Self {
        Self::from_external(Some(&value))
    }
}

impl Preferences {
    /// Decodes the external representation; `None`/`null` yields defaults.
    pub fn from_external(value: Option<&Value>) -> Self {
        let Some(Value::Object(fields)) = value else {
            return Self::default();
        };
        let enabled = fields.get("enabled") != Some(&Value::Bool(false));
        let per_host = match fields.get("perHost") {
            Some(Value::Object(entries)) => entries
                .iter()
                .filter_map(|(host, flag)| flag.as_bool().map(|flag| (host.clone(), flag)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { enabled, per_host }
    }

    /// Encodes the external representation.
    pub fn to_external(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// New snapshot with one host override replaced.
    pub fn with_host_override(&self, host: &str, value: bool) -> Self {
        let mut next = self.clone();
        next.per_host.insert(host.to_string(), value);
        next
    }

    /// New snapshot with the global flag replaced.
    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            enabled,
            per_host: self.per_host.clone(),
        }
    }

    /// Active decision for `host`.
    pub fn decision_for(&self, host: &str) -> ActiveDecision {
        resolve(self.enabled, &self.per_host, host).into()
    }
}
