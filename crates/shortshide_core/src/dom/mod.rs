//! Host document seam.
//!
//! # Responsibility
//! - Define the minimal tree/attribute/selector surface the classifier and
//!   hider need from a host page.
//! - Encode selector-engine incompatibility as a value (`Lookup::NoMatch`),
//!   never as a panic.
//!
//! # Invariants
//! - Node identity is `NodeId`; ids of detached nodes stay valid but report
//!   no parent.
//! - Queries on stale or non-element ids return empty results, never panic.
//! - `select_all` returns descendants only (root excluded), in document order.
//! - String selector helpers parse once per call; rules-file selectors are
//!   compiled once as `SelectorPattern`s.

pub mod memory;
pub mod selector;
pub mod style;

pub use memory::MemoryDocument;
pub use selector::{CompiledSelector, SelectorError, SelectorPattern};

/// Opaque node identity inside one host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, for diagnostics only.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Host node classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element,
    Text,
    Comment,
}

/// One batch entry delivered by tree observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: Option<NodeId>,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

/// Result of a selector probe that may legitimately not apply on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NoMatch,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NoMatch => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Result<Option<T>, SelectorError>> for Lookup<T> {
    fn from(value: Result<Option<T>, SelectorError>) -> Self {
        match value {
            Ok(Some(found)) => Self::Found(found),
            Ok(None) | Err(_) => Self::NoMatch,
        }
    }
}

/// Tree surface consumed from the host page.
///
/// Mutation is limited to attributes: the core never creates or destroys
/// host nodes.
pub trait HostDocument {
    /// Document node (tree root).
    fn root(&self) -> NodeId;

    /// Root element (`<html>`), when the host has produced one.
    fn document_element(&self) -> Option<NodeId>;

    /// Node kind, or `None` for ids unknown to this document.
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Lower-case local tag name for elements.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Sets one attribute; returns `false` when `node` is not an element.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool;

    /// Removes one attribute; returns whether it was present.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: NodeId) -> String;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Tests one node against a compiled selector list.
    fn matches_selector(&self, node: NodeId, selector: &CompiledSelector) -> bool;

    /// All descendants of `scope` matching `selector`, in document order.
    fn select_all(&self, scope: NodeId, selector: &CompiledSelector) -> Vec<NodeId>;

    /// Starts recording mutation records for the subtree under `target`.
    fn observe(&mut self, target: NodeId);

    /// Drains mutation records collected since the last call.
    fn take_mutations(&mut self) -> Vec<MutationRecord>;

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn select_first(&self, scope: NodeId, selector: &CompiledSelector) -> Option<NodeId> {
        self.select_all(scope, selector).into_iter().next()
    }

    /// Nearest inclusive ancestor element matching `selector`.
    fn select_closest(&self, node: NodeId, selector: &CompiledSelector) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.is_element(current) && self.matches_selector(current, selector) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.matches_selector(node, &compiled))
    }

    fn query_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.select_all(scope, &compiled))
    }

    /// First matching descendant in document order.
    fn query_first(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.select_first(scope, &compiled))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.select_closest(node, &compiled))
    }
}

/// Matches of `pattern` among the descendants of `root`, plus `root` itself
/// when it matches.
///
/// A pattern that failed to compile yields an empty list.
pub fn query_inclusive<D: HostDocument + ?Sized>(
    doc: &D,
    root: NodeId,
    pattern: &SelectorPattern,
) -> Vec<NodeId> {
    let Some(selector) = pattern.compiled() else {
        return Vec::new();
    };
    let mut results = Vec::new();
    if doc.is_element(root) && doc.matches_selector(root, selector) {
        results.push(root);
    }
    if matches!(
        doc.kind(root),
        Some(NodeKind::Document | NodeKind::Fragment | NodeKind::Element)
    ) {
        results.extend(doc.select_all(root, selector));
    }
    results
}

/// Nearest inclusive ancestor matching `pattern`; `NoMatch` when the pattern
/// failed to compile.
pub fn probe_closest<D: HostDocument + ?Sized>(
    doc: &D,
    node: NodeId,
    pattern: &SelectorPattern,
) -> Lookup<NodeId> {
    pattern
        .compiled()
        .and_then(|selector| doc.select_closest(node, selector))
        .map_or(Lookup::NoMatch, Lookup::Found)
}

pub fn probe_first<D: HostDocument + ?Sized>(
    doc: &D,
    scope: NodeId,
    pattern: &SelectorPattern,
) -> Lookup<NodeId> {
    pattern
        .compiled()
        .and_then(|selector| doc.select_first(scope, selector))
        .map_or(Lookup::NoMatch, Lookup::Found)
}

/// All descendants matching `pattern`, empty when it failed to compile.
pub fn probe_all<D: HostDocument + ?Sized>(
    doc: &D,
    scope: NodeId,
    pattern: &SelectorPattern,
) -> Vec<NodeId> {
    pattern
        .compiled()
        .map(|selector| doc.select_all(scope, selector))
        .unwrap_or_default()
}

pub fn probe_matches<D: HostDocument + ?Sized>(
    doc: &D,
    node: NodeId,
    pattern: &SelectorPattern,
) -> bool {
    pattern
        .compiled()
        .is_some_and(|selector| doc.matches_selector(node, selector))
}

#[cfg(test)]
mod tests {
    use super::{probe_closest, probe_matches, Lookup, MemoryDocument, SelectorError};
    use super::{HostDocument, SelectorPattern};

    #[test]
    fn lookup_folds_selector_errors_into_no_match() {
        let failed: Result<Option<u8>, SelectorError> = Err(SelectorError::Unsupported {
            selector: "a:hover".to_string(),
            reason: "pseudo-class".to_string(),
        });
        assert_eq!(Lookup::from(failed), Lookup::NoMatch);
        assert_eq!(Lookup::from(Ok::<_, SelectorError>(Some(3_u8))), Lookup::Found(3));
        assert_eq!(Lookup::from(Ok::<Option<u8>, SelectorError>(None)), Lookup::NoMatch);
    }

    #[test]
    fn failed_pattern_never_matches() {
        let doc = MemoryDocument::parse_html(r#"<body><a id="link" href="/shorts">x</a></body>"#);
        let link = doc
            .query_first(doc.root(), "#link")
            .expect("query")
            .expect("link exists");
        let broken = SelectorPattern::new("a:hover");
        assert!(!probe_matches(&doc, link, &broken));
        assert_eq!(probe_closest(&doc, link, &broken), Lookup::NoMatch);
        assert_eq!(
            probe_closest(&doc, link, &SelectorPattern::new("body a")),
            Lookup::Found(link)
        );
    }
}
