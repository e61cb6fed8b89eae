//! Hide target resolution.
//!
//! Hiding too low leaves an empty shelf frame; hiding too high takes
//! unrelated siblings along. The ordered `removal_priority` list decides.

use crate::classify::rules::Rules;
use crate::dom::{probe_closest, HostDocument, Lookup, NodeId};

/// Nearest inclusive ancestor matching the first priority pattern that has
/// any match, else `node` itself. `None` for non-elements.
pub fn find_target<D: HostDocument + ?Sized>(doc: &D, rules: &Rules, node: NodeId) -> Option<NodeId> {
    if !doc.is_element(node) {
        return None;
    }
    for pattern in &rules.removal_priority {
        if let Lookup::Found(candidate) = probe_closest(doc, node, pattern) {
            return Some(candidate);
        }
    }
    Some(node)
}
