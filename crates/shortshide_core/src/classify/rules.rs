//! Classification policy: selector lists, hint list and link pattern.
//!
//! # Responsibility
//! - Hold every host-specific literal the classifier and sweep rely on.
//! - Allow overlaying a JSON rules file on the built-in YouTube policy.
//!
//! # Invariants
//! - `removal_priority` order is the granularity policy; it is never sorted.
//! - Hints are stored lower-case.
//! - `link_pattern` always matches `/<keyword>` followed by `/` or end.
//! - Selectors are compiled once when the rules are built. A selector the
//!   engine rejects is kept and never matches.

use crate::dom::SelectorPattern;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Path keyword identifying disfavored links.
pub const DEFAULT_LINK_KEYWORD: &str = "shorts";

static DEFAULT_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/shorts(?:/|$)").expect("valid shorts link regex"));

const TEXT_HINTS: &[&str] = &[
    "shorts",
    "шорт",
    "шортс",
    "шорты",
    "короткие видео",
    "короткие ролики",
    "короткие відео",
    "коротке відео",
];

const SECTION_SELECTORS: &[&str] = &[
    "ytd-reel-shelf-renderer",
    "ytd-rich-section-renderer",
    "ytd-rich-shelf-renderer",
];

const CONTAINER_SELECTORS: &[&str] = &[
    "ytd-guide-entry-renderer",
    "ytd-mini-guide-entry-renderer",
    "yt-chip-cloud-chip-renderer",
    "ytd-button-renderer",
    "tp-yt-paper-item",
    "ytm-chip-cloud-chip-renderer",
];

const REMOVAL_PRIORITY: &[&str] = &[
    r#"ytd-rich-section-renderer[section-identifier="shorts_shelf"]"#,
    "ytd-rich-shelf-renderer",
    "ytd-reel-shelf-renderer",
    "ytd-rich-item-renderer",
    "ytd-guide-entry-renderer",
    "ytd-mini-guide-entry-renderer",
    "yt-chip-cloud-chip-renderer",
    "ytd-button-renderer",
    "tp-yt-paper-item",
    "ytm-chip-cloud-chip-renderer",
];

/// Rules loading errors.
#[derive(Debug)]
pub enum RulesError {
    Json(serde_json::Error),
    EmptyKeyword,
    EmptySelectorList(&'static str),
    Pattern(regex::Error),
}

impl Display for RulesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid rules json: {err}"),
            Self::EmptyKeyword => write!(f, "link keyword must not be empty"),
            Self::EmptySelectorList(field) => write!(f, "selector list `{field}` must not be empty"),
            Self::Pattern(err) => write!(f, "invalid link pattern: {err}"),
        }
    }
}

impl Error for RulesError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Pattern(err) => Some(err),
            Self::EmptyKeyword | Self::EmptySelectorList(_) => None,
        }
    }
}

impl From<serde_json::Error> for RulesError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<regex::Error> for RulesError {
    fn from(value: regex::Error) -> Self {
        Self::Pattern(value)
    }
}

/// Optional overrides read from a rules file. Missing fields keep defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesConfig {
    pub link_keyword: Option<String>,
    pub text_hints: Option<Vec<String>>,
    pub section_selectors: Option<Vec<String>>,
    pub container_selectors: Option<Vec<String>>,
    pub removal_priority: Option<Vec<String>>,
    pub loose_link_containers: Option<String>,
}

/// Effective classification policy.
#[derive(Debug, Clone)]
pub struct Rules {
    pub link_keyword: String,
    pub link_pattern: Regex,
    pub text_hints: Vec<String>,
    /// Dedicated shelf widget, always disfavored.
    pub shelf_tag: String,
    /// Sectioned shelf widget, disfavored when its marker matches.
    pub sectioned_shelf_tag: String,
    pub section_marker_attr: String,
    pub section_marker_value: String,
    /// Generic section/shelf widgets, disfavored only by content.
    pub generic_shelf_selector: SelectorPattern,
    pub section_selectors: Vec<SelectorPattern>,
    pub container_selectors: Vec<SelectorPattern>,
    pub removal_priority: Vec<SelectorPattern>,
    /// Known disfavored widgets embedded in a shelf.
    pub component_selector: SelectorPattern,
    /// Narrow heading candidates inside a shelf.
    pub title_selector: SelectorPattern,
    pub item_selector: SelectorPattern,
    /// Widgets that mark an item as a disfavored card.
    pub item_embed_selector: SelectorPattern,
    /// Containers a loose disfavored link hides instead of itself.
    pub loose_link_containers: SelectorPattern,
    pub link_selector: SelectorPattern,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            link_keyword: DEFAULT_LINK_KEYWORD.to_string(),
            link_pattern: DEFAULT_LINK_RE.clone(),
            text_hints: to_owned_list(TEXT_HINTS),
            shelf_tag: "ytd-reel-shelf-renderer".to_string(),
            sectioned_shelf_tag: "ytd-rich-section-renderer".to_string(),
            section_marker_attr: "section-identifier".to_string(),
            section_marker_value: "shorts_shelf".to_string(),
            generic_shelf_selector: "ytd-rich-section-renderer, ytd-rich-shelf-renderer".into(),
            section_selectors: to_patterns(SECTION_SELECTORS),
            container_selectors: to_patterns(CONTAINER_SELECTORS),
            removal_priority: to_patterns(REMOVAL_PRIORITY),
            component_selector:
                "ytm-shorts-lockup-view-model, ytm-shorts-lockup-view-model-v2, ytd-reel-video-renderer"
                    .into(),
            title_selector: "#title, #title-text, h2, yt-formatted-string.title, yt-formatted-string#title, yt-formatted-string[title]"
                .into(),
            item_selector: "ytd-rich-item-renderer".into(),
            item_embed_selector: "ytm-shorts-lockup-view-model, ytm-shorts-lockup-view-model-v2"
                .into(),
            loose_link_containers: SelectorPattern::new(format!(
                "{}, ytd-rich-shelf-renderer, ytd-rich-item-renderer",
                CONTAINER_SELECTORS.join(", ")
            )),
            link_selector: "a[href]".into(),
        }
    }
}

impl Rules {
    /// Built-in policy overlaid with `config`.
    pub fn from_config(config: RulesConfig) -> Result<Self, RulesError> {
        let mut rules = Self::default();
        if let Some(keyword) = config.link_keyword {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                return Err(RulesError::EmptyKeyword);
            }
            rules.link_pattern = link_pattern_for(keyword)?;
            rules.link_keyword = keyword.to_string();
        }
        if let Some(hints) = config.text_hints {
            rules.text_hints = hints
                .iter()
                .map(|hint| hint.trim().to_lowercase())
                .filter(|hint| !hint.is_empty())
                .collect();
        }
        if let Some(selectors) = config.section_selectors {
            rules.section_selectors = non_empty(selectors, "sectionSelectors")?;
        }
        if let Some(selectors) = config.container_selectors {
            rules.container_selectors = non_empty(selectors, "containerSelectors")?;
        }
        if let Some(selectors) = config.removal_priority {
            rules.removal_priority = non_empty(selectors, "removalPriority")?;
        }
        if let Some(selector) = config.loose_link_containers {
            if selector.trim().is_empty() {
                return Err(RulesError::EmptySelectorList("looseLinkContainers"));
            }
            rules.loose_link_containers = compile("looseLinkContainers", selector.trim());
        }
        Ok(rules)
    }

    /// Parses a JSON rules document and overlays it on the defaults.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let config: RulesConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Whether `href` points at a disfavored path.
    pub fn is_disfavored_href(&self, href: &str) -> bool {
        self.link_pattern.is_match(href)
    }

    /// Whether `text` contains any hint, compared lower-case.
    pub fn text_has_hint(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let normalized = text.to_lowercase();
        self.text_hints
            .iter()
            .any(|hint| normalized.contains(hint.as_str()))
    }
}

fn link_pattern_for(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i)/{}(?:/|$)", regex::escape(keyword)))
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn to_patterns(values: &[&str]) -> Vec<SelectorPattern> {
    values.iter().copied().map(SelectorPattern::from).collect()
}

fn compile(field: &str, source: &str) -> SelectorPattern {
    let pattern = SelectorPattern::new(source);
    if let Some(err) = pattern.error() {
        warn!("event=rules_selector module=classify status=skipped field={field} error={err}");
    }
    pattern
}

fn non_empty(values: Vec<String>, field: &'static str) -> Result<Vec<SelectorPattern>, RulesError> {
    let cleaned: Vec<SelectorPattern> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| compile(field, value))
        .collect();
    if cleaned.is_empty() {
        return Err(RulesError::EmptySelectorList(field));
    }
    Ok(cleaned)
}
