//! Element classification signals.
//!
//! # Invariants
//! - Every predicate returns `false` for non-element or unknown nodes.
//! - Selector failures count as "no match" and never escape.
//! - Link detection is structural and runs before any text heuristic.

use crate::classify::rules::Rules;
use crate::dom::{probe_all, probe_first, probe_matches, HostDocument, NodeId};

/// True when `node` is a disfavored link, or contains one.
pub fn has_disfavored_link<D: HostDocument + ?Sized>(doc: &D, rules: &Rules, node: NodeId) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    if doc.tag_name(node) == Some("a") {
        return doc
            .attribute(node, "href")
            .is_some_and(|href| rules.is_disfavored_href(href));
    }
    probe_all(doc, node, &rules.link_selector)
        .into_iter()
        .any(|anchor| {
            doc.attribute(anchor, "href")
                .is_some_and(|href| !href.is_empty() && rules.is_disfavored_href(href))
        })
}

/// True when the rendered text or the `title` attribute carries a hint.
///
/// Only meant for small candidates; a page-wide scan would over-match.
pub fn text_suggests_disfavored<D: HostDocument + ?Sized>(
    doc: &D,
    rules: &Rules,
    node: NodeId,
) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    if rules.text_has_hint(&doc.text_content(node)) {
        return true;
    }
    doc.attribute(node, "title")
        .is_some_and(|title| rules.text_has_hint(title))
}

/// True when `node` holds a disfavored link, a known disfavored widget, a
/// hinted heading, or (fallback) hinted text of its own.
pub fn contains_disfavored_components<D: HostDocument + ?Sized>(
    doc: &D,
    rules: &Rules,
    node: NodeId,
) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    if has_disfavored_link(doc, rules, node) {
        return true;
    }
    if probe_first(doc, node, &rules.component_selector).is_found() {
        return true;
    }
    if let Some(title) = probe_first(doc, node, &rules.title_selector).found() {
        if text_suggests_disfavored(doc, rules, title) {
            return true;
        }
    }
    text_suggests_disfavored(doc, rules, node)
}

/// Layered shelf check: the dedicated shelf always qualifies, the sectioned
/// shelf qualifies by marker, generic shelves only by content.
pub fn is_disfavored_shelf<D: HostDocument + ?Sized>(doc: &D, rules: &Rules, node: NodeId) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if tag == rules.shelf_tag {
        return true;
    }
    if tag == rules.sectioned_shelf_tag
        && doc.attribute(node, &rules.section_marker_attr) == Some(rules.section_marker_value.as_str())
    {
        return true;
    }
    if probe_matches(doc, node, &rules.generic_shelf_selector) {
        return contains_disfavored_components(doc, rules, node);
    }
    false
}
