//! CSS selectors for host documents.
//!
//! # Responsibility
//! - Parse selector lists with the `selectors` engine and scraper's
//!   selector implementation, so syntax support matches `scraper::Selector`.
//! - Keep rules-file selectors compiled once, failures included.
//!
//! # Invariants
//! - A `SelectorPattern` that failed to compile never matches anything.
//! - Pseudo-classes outside the tree-structural set are rejected at parse
//!   time; a static snapshot has no hover/focus state.

use cssparser::{Parser as CssParser, ParserInput};
use scraper::selector::{Parser as HtmlSelectorParser, Simple};
use selectors::matching::{
    matches_selector_list, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorList};
use selectors::{Element, NthIndexCache};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Selector parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    /// The engine rejected the syntax.
    Unsupported { selector: String, reason: String },
}

impl Display for SelectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "selector must not be empty"),
            Self::Unsupported { selector, reason } => {
                write!(f, "unsupported selector `{selector}`: {reason}")
            }
        }
    }
}

impl Error for SelectorError {}

/// Parsed selector list.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    list: SelectorList<Simple>,
}

impl CompiledSelector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut input = ParserInput::new(source);
        let mut parser = CssParser::new(&mut input);
        let list = SelectorList::parse(&HtmlSelectorParser, &mut parser, ParseRelative::No)
            .map_err(|err| SelectorError::Unsupported {
                selector: source.to_string(),
                reason: format!("{:?}", err.kind),
            })?;
        Ok(Self {
            source: source.to_string(),
            list,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `element` matches any selector of the list.
    pub fn matches<E: Element<Impl = Simple>>(&self, element: &E) -> bool {
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        matches_selector_list(&self.list, element, &mut context)
    }
}

/// Selector from a rules list, compiled once. A failed compile is kept so
/// lookups can treat it as "no match" without parsing again.
#[derive(Debug, Clone)]
pub struct SelectorPattern {
    source: String,
    compiled: Result<CompiledSelector, SelectorError>,
}

impl SelectorPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = CompiledSelector::parse(&source);
        Self { source, compiled }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled form, or `None` when the engine rejected the pattern.
    pub fn compiled(&self) -> Option<&CompiledSelector> {
        self.compiled.as_ref().ok()
    }

    pub fn error(&self) -> Option<&SelectorError> {
        self.compiled.as_ref().err()
    }
}

impl PartialEq for SelectorPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for SelectorPattern {}

impl From<&str> for SelectorPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
