//! Arena-backed in-memory host document.
//!
//! # Responsibility
//! - Provide a `HostDocument` for tests, the CLI and embedding hosts that
//!   hand over static markup.
//! - Parse HTML through `scraper` and record child-list mutations the way a
//!   tree observer would report them.
//!
//! # Invariants
//! - Nodes are never freed; removed nodes stay addressable but detached.
//! - Attribute names are stored lower-case.
//! - Mutation records are only produced after `observe` was called, and only
//!   for changes inside the observed subtree.

use crate::dom::selector::CompiledSelector;
use crate::dom::{HostDocument, MutationRecord, NodeId, NodeKind};
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use scraper::{Html, Node as HtmlNode};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{ElementSelectorFlags, MatchingContext};
use selectors::parser::SelectorImpl;
use selectors::{Element, OpaqueElement};
use std::fmt::{Debug, Formatter};

type Namespace = <Simple as SelectorImpl>::BorrowedNamespaceUrl;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Document,
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document tree.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    observed: Option<NodeId>,
    pending: Vec<MutationRecord>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates an empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            observed: None,
            pending: Vec::new(),
        }
    }

    /// Parses a full HTML document. Malformed markup is repaired by the
    /// HTML5 tree builder, so this never fails.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::new();
        let root = doc.root();
        let starts: Vec<_> = parsed.tree.root().children().collect();
        let mut stack: Vec<_> = starts.into_iter().rev().map(|node| (node, root)).collect();
        while let Some((source, parent)) = stack.pop() {
            if let Some(created) = doc.import_node(source.value(), parent) {
                let children: Vec<_> = source.children().collect();
                stack.extend(children.into_iter().rev().map(|child| (child, created)));
            }
        }
        doc
    }

    /// Parses `html` as a fragment and appends its top-level nodes to
    /// `parent`, producing one mutation record for the whole batch.
    ///
    /// Returns the inserted top-level node ids.
    pub fn insert_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        if !self.can_have_children(parent) {
            return Vec::new();
        }
        let parsed = Html::parse_fragment(html);
        let fragment = self.push_node(NodeData::Fragment, None);
        let starts: Vec<_> = parsed.root_element().children().collect();
        let mut stack: Vec<_> = starts
            .into_iter()
            .rev()
            .map(|node| (node, fragment))
            .collect();
        while let Some((source, target)) = stack.pop() {
            if let Some(created) = self.import_node(source.value(), target) {
                let children: Vec<_> = source.children().collect();
                stack.extend(children.into_iter().rev().map(|child| (child, created)));
            }
        }

        let added = std::mem::take(&mut self.nodes[fragment.0].children);
        for child in &added {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children.extend(added.iter().copied());
        self.record(parent, added.clone(), Vec::new());
        added
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(
            NodeData::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            }),
            None,
        )
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()), None)
    }

    /// Appends `child` under `parent`, detaching it from its previous parent.
    ///
    /// Returns `false` when `parent` cannot hold children or the move would
    /// create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.can_have_children(parent)
            || self.node(child).is_none()
            || self.is_inclusive_ancestor(child, parent)
        {
            return false;
        }
        if let Some(previous) = self.nodes[child.0].parent {
            self.remove_child(previous, child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.record(parent, vec![child], Vec::new());
        true
    }

    /// Detaches `child` from `parent`; returns whether it was attached there.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(node) = self.node(parent) else {
            return false;
        };
        let Some(position) = node.children.iter().position(|id| *id == child) else {
            return false;
        };
        self.nodes[parent.0].children.remove(position);
        self.nodes[child.0].parent = None;
        self.record(parent, Vec::new(), vec![child]);
        true
    }

    /// Convenience accessor for `<body>`.
    pub fn body(&self) -> Option<NodeId> {
        self.query_first(self.root(), "body").ok().flatten()
    }

    /// Serializes `node` (outer HTML for elements, children for documents).
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Number of nodes ever created in this document.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(current) = self.node(node) else {
            return;
        };
        match &current.data {
            NodeData::Document | NodeData::Fragment => {
                for child in &current.children {
                    self.write_html(*child, out);
                }
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in &current.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    fn import_node(&mut self, source: &HtmlNode, parent: NodeId) -> Option<NodeId> {
        let data = match source {
            HtmlNode::Element(element) => NodeData::Element(ElementData {
                tag: element.name().to_ascii_lowercase(),
                attrs: element
                    .attrs()
                    .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                    .collect(),
            }),
            HtmlNode::Text(text) => {
                let content: &str = text;
                NodeData::Text(content.to_string())
            }
            HtmlNode::Comment(comment) => {
                let content: &str = comment;
                NodeData::Comment(content.to_string())
            }
            _ => return None,
        };
        let id = self.push_node(data, Some(parent));
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    fn push_node(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn arena_element(&self, id: NodeId) -> Option<ArenaElement<'_>> {
        self.element(id)
            .map(|data| ArenaElement { doc: self, id, data })
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn can_have_children(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(|node| &node.data),
            Some(NodeData::Document | NodeData::Fragment | NodeData::Element(_))
        )
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|entry| entry.parent);
        }
        false
    }

    fn record(&mut self, target: NodeId, added_nodes: Vec<NodeId>, removed_nodes: Vec<NodeId>) {
        let Some(observed) = self.observed else {
            return;
        };
        if !self.is_inclusive_ancestor(observed, target) {
            return;
        }
        self.pending.push(MutationRecord {
            target: Some(target),
            added_nodes,
            removed_nodes,
        });
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.node(scope) else {
            return out;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(entry) = self.node(current) {
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }
}

impl HostDocument for MemoryDocument {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn document_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|child| self.element(*child).is_some())
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        Some(match self.node(node)?.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        })
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        let Some(element) = self.element_mut(node) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        match element.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => element.attrs.push((name, value.to_string())),
        }
        true
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        let Some(element) = self.element_mut(node) else {
            return false;
        };
        let before = element.attrs.len();
        element
            .attrs
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        element.attrs.len() != before
    }

    fn text_content(&self, node: NodeId) -> String {
        match self.node(node).map(|entry| &entry.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Comment(_)) | None => String::new(),
            Some(_) => self
                .descendants(node)
                .into_iter()
                .filter_map(|id| match &self.nodes[id.0].data {
                    NodeData::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn matches_selector(&self, node: NodeId, selector: &CompiledSelector) -> bool {
        self.arena_element(node)
            .is_some_and(|element| selector.matches(&element))
    }

    fn select_all(&self, scope: NodeId, selector: &CompiledSelector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.matches_selector(*id, selector))
            .collect()
    }

    fn observe(&mut self, target: NodeId) {
        if self.node(target).is_some() {
            self.observed = Some(target);
        }
    }

    fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }
}

/// Element view handed to the `selectors` matcher.
#[derive(Clone, Copy)]
struct ArenaElement<'a> {
    doc: &'a MemoryDocument,
    id: NodeId,
    data: &'a ElementData,
}

impl Debug for ArenaElement<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArenaElement({})", self.id.0)
    }
}

impl<'a> ArenaElement<'a> {
    fn wrap(&self, id: NodeId) -> Option<Self> {
        self.doc.arena_element(id)
    }

    fn siblings(&self) -> &'a [NodeId] {
        self.doc.nodes[self.id.0]
            .parent
            .map(|parent| self.doc.nodes[parent.0].children.as_slice())
            .unwrap_or_default()
    }

    fn position(&self) -> Option<usize> {
        self.siblings().iter().position(|id| *id == self.id)
    }
}

impl Element for ArenaElement<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(&self.doc.nodes[self.id.0])
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.nodes[self.id.0]
            .parent
            .and_then(|parent| self.wrap(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let position = self.position()?;
        self.siblings()[..position]
            .iter()
            .rev()
            .find_map(|id| self.wrap(*id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let position = self.position()?;
        self.siblings()[position + 1..]
            .iter()
            .find_map(|id| self.wrap(*id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc.nodes[self.id.0]
            .children
            .iter()
            .find_map(|id| self.wrap(*id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &CssLocalName) -> bool {
        self.data.tag == *local_name.0
    }

    fn has_namespace(&self, ns: &Namespace) -> bool {
        ns.is_empty() || &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data.tag == other.data.tag
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Namespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if matches!(*ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.data
            .attr(&local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data.tag.as_str(), "a" | "area" | "link") && self.data.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data
            .attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data.attr("class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.nodes[self.id.0]
            .children
            .iter()
            .all(|id| match &self.doc.nodes[id.0].data {
                NodeData::Element(_) => false,
                NodeData::Text(text) => text.is_empty(),
                _ => true,
            })
    }

    fn is_root(&self) -> bool {
        self.doc.nodes[self.id.0]
            .parent
            .is_some_and(|parent| matches!(self.doc.nodes[parent.0].data, NodeData::Document))
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::MemoryDocument;
    use crate::dom::{HostDocument, NodeKind};

    #[test]
    fn parses_custom_elements_and_attributes() {
        let doc = MemoryDocument::parse_html(
            r#"<body><ytd-rich-section-renderer section-identifier="shorts_shelf"><span>Shorts</span></ytd-rich-section-renderer></body>"#,
        );
        let sections = doc
            .query_all(doc.root(), "ytd-rich-section-renderer")
            .expect("query should succeed");
        assert_eq!(sections.len(), 1);
        assert_eq!(
            doc.attribute(sections[0], "section-identifier"),
            Some("shorts_shelf")
        );
        assert_eq!(doc.text_content(sections[0]), "Shorts");
        assert!(doc.document_element().is_some());
    }

    #[test]
    fn query_all_excludes_scope_and_keeps_document_order() {
        let doc = MemoryDocument::parse_html(
            r#"<body><div id="outer"><div id="a"></div><p><div id="b"></div></p></div></body>"#,
        );
        let outer = doc
            .query_first(doc.root(), "#outer")
            .expect("query")
            .expect("outer exists");
        let ids: Vec<_> = doc
            .query_all(outer, "div")
            .expect("query")
            .into_iter()
            .filter_map(|id| doc.attribute(id, "id").map(str::to_string))
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn records_mutations_only_after_observe() {
        let mut doc = MemoryDocument::parse_html("<body></body>");
        let body = doc.body().expect("body exists");
        doc.insert_html(body, "<p>before</p>");
        assert!(doc.take_mutations().is_empty());

        let root = doc.root();
        doc.observe(root);
        let added = doc.insert_html(body, "<p>one</p>text<p>two</p>");
        assert_eq!(added.len(), 3);
        assert_eq!(doc.kind(added[1]), Some(NodeKind::Text));

        let records = doc.take_mutations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].added_nodes, added);
        assert!(doc.take_mutations().is_empty());
    }

    #[test]
    fn append_child_rejects_cycles_and_moves_nodes() {
        let mut doc = MemoryDocument::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        assert!(doc.append_child(doc.root(), outer));
        assert!(doc.append_child(outer, inner));
        assert!(!doc.append_child(inner, outer));

        assert!(doc.append_child(doc.root(), inner));
        assert_eq!(doc.parent(inner), Some(doc.root()));
        assert!(doc.children(outer).is_empty());
    }

    #[test]
    fn serializes_escaped_markup() {
        let mut doc = MemoryDocument::new();
        let link = doc.create_element("a");
        doc.set_attribute(link, "href", "/shorts/\"x\"");
        let text = doc.create_text("a < b & c");
        doc.append_child(link, text);
        assert_eq!(
            doc.to_html(link),
            r#"<a href="/shorts/&quot;x&quot;">a &lt; b &amp; c</a>"#
        );
    }

    #[test]
    fn combinators_and_structural_pseudo_classes_match_arena_nodes() {
        let doc = MemoryDocument::parse_html(
            r#"<body><ytd-rich-grid-renderer><ytd-rich-item-renderer id="first" class="card wide"><a href="/shorts/1">x</a></ytd-rich-item-renderer><ytd-rich-item-renderer id="second"></ytd-rich-item-renderer></ytd-rich-grid-renderer><ytd-rich-item-renderer id="loose"></ytd-rich-item-renderer></body>"#,
        );
        let ids = |selector: &str| -> Vec<String> {
            doc.query_all(doc.root(), selector)
                .expect("selector should parse")
                .into_iter()
                .filter_map(|id| doc.attribute(id, "id").map(str::to_string))
                .collect()
        };

        assert_eq!(
            ids("ytd-rich-grid-renderer ytd-rich-item-renderer"),
            vec!["first", "second"]
        );
        assert_eq!(ids("ytd-rich-item-renderer + ytd-rich-item-renderer"), vec!["second"]);
        assert_eq!(ids("ytd-rich-item-renderer:has(a[href^='/shorts'])"), vec!["first"]);
        assert_eq!(ids(".wide:first-child"), vec!["first"]);
        assert_eq!(ids("ytd-rich-item-renderer:empty"), vec!["second", "loose"]);
        assert_eq!(ids("body > ytd-rich-item-renderer"), vec!["loose"]);
    }

    #[test]
    fn stale_ids_are_tolerated() {
        let doc = MemoryDocument::new();
        let stale = crate::dom::NodeId(999);
        assert_eq!(doc.kind(stale), None);
        assert_eq!(doc.text_content(stale), "");
        assert!(doc.query_all(stale, "div").expect("query").is_empty());
    }
}
