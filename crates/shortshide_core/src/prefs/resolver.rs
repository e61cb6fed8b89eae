//! Preference resolution for one host.

use crate::prefs::model::Preferences;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use url::Url;

const WWW_PREFIX: &str = "www.";

const SUPPORTED_HOSTS: &[&str] = &["www.youtube.com", "m.youtube.com", "youtube.com"];

/// Whether hiding applies on `host`.
///
/// The global flag dominates; an exact host override wins next; a `www.`
/// host then falls back to its bare-domain override; everything else
/// defaults to hiding. A `www.` key never applies to the bare host.
pub fn resolve(enabled: bool, per_host: &BTreeMap<String, bool>, host: &str) -> bool {
    if !enabled {
        return false;
    }
    host_override(per_host, host).unwrap_or(true)
}

/// Per-host part of [`resolve`], ignoring the global flag.
pub fn host_preference(prefs: &Preferences, host: &str) -> bool {
    if host.is_empty() {
        return true;
    }
    host_override(&prefs.per_host, host).unwrap_or(true)
}

fn host_override(per_host: &BTreeMap<String, bool>, host: &str) -> Option<bool> {
    if let Some(value) = per_host.get(host) {
        return Some(*value);
    }
    host.strip_prefix(WWW_PREFIX)
        .and_then(|bare| per_host.get(bare))
        .copied()
}

/// Hosts the control surface offers per-site toggles for.
pub fn is_supported_host(host: &str) -> bool {
    SUPPORTED_HOSTS.contains(&host)
}

/// Host name of an absolute URL.
pub fn host_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// Human-facing summary of the effective preference state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceStatus {
    /// Global switch is off.
    Disabled,
    /// Shorts are shown on this host because of a host override.
    ShownOnHost(String),
    Hiding,
}

impl PreferenceStatus {
    pub fn describe(prefs: &Preferences, host: &str) -> Self {
        if !prefs.enabled {
            return Self::Disabled;
        }
        if !host_preference(prefs, host) {
            return Self::ShownOnHost(host.to_string());
        }
        Self::Hiding
    }
}

impl Display for PreferenceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "shorts are shown (extension disabled)"),
            Self::ShownOnHost(host) => write!(f, "shorts are shown on {host}"),
            Self::Hiding => write!(f, "shorts are hidden"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{host_from_url, is_supported_host, resolve, PreferenceStatus};
    use crate::prefs::model::Preferences;
    use std::collections::BTreeMap;

    fn map(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
        entries
            .iter()
            .map(|(host, value)| (host.to_string(), *value))
            .collect()
    }

    #[test]
    fn global_switch_dominates() {
        assert!(!resolve(false, &map(&[]), "www.x.com"));
        assert!(!resolve(false, &map(&[("www.x.com", true)]), "www.x.com"));
        assert!(!resolve(false, &map(&[]), ""));
    }

    #[test]
    fn defaults_to_hiding_on_unknown_hosts() {
        assert!(resolve(true, &map(&[]), "www.x.com"));
        assert!(resolve(true, &map(&[]), ""));
    }

    #[test]
    fn www_host_falls_back_to_bare_override() {
        assert!(!resolve(true, &map(&[("x.com", false)]), "www.x.com"));
        assert!(resolve(true, &map(&[("x.com", false), ("www.x.com", true)]), "www.x.com"));
    }

    #[test]
    fn bare_host_never_uses_www_override() {
        assert!(resolve(true, &map(&[("www.x.com", false)]), "x.com"));
    }

    #[test]
    fn exact_prefix_only() {
        assert!(resolve(true, &map(&[("x.com", false)]), "WWW.x.com"));
        assert!(!resolve(true, &map(&[("", false)]), "www."));
        assert!(!resolve(true, &map(&[("", false)]), ""));
    }

    #[test]
    fn status_summaries() {
        let prefs = Preferences::default();
        assert_eq!(PreferenceStatus::describe(&prefs, "youtube.com"), PreferenceStatus::Hiding);
        assert_eq!(
            PreferenceStatus::describe(&prefs.with_enabled(false), "youtube.com"),
            PreferenceStatus::Disabled
        );
        let overridden = prefs.with_host_override("youtube.com", false);
        assert_eq!(
            PreferenceStatus::describe(&overridden, "www.youtube.com"),
            PreferenceStatus::ShownOnHost("www.youtube.com".to_string())
        );
        assert_eq!(PreferenceStatus::describe(&overridden, ""), PreferenceStatus::Hiding);
    }

    #[test]
    fn host_helpers() {
        assert_eq!(
            host_from_url("https://www.youtube.com/shorts/abc").as_deref(),
            Some("www.youtube.com")
        );
        assert_eq!(host_from_url("not a url"), None);
        assert_eq!(host_from_url("about:blank"), None);
        assert!(is_supported_host("m.youtube.com"));
        assert!(!is_supported_host("music.youtube.com"));
    }
}
