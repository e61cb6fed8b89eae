//! Reversible hiding of host elements.
//!
//! # Responsibility
//! - Mark, aria-hide and force `display: none !important` on a target.
//! - Undo exactly those changes in bulk.
//!
//! # Invariants
//! - Only this module writes to classified targets; the engine touches
//!   nothing but the document-element flag.
//! - `hide` is idempotent: a marked target is never touched twice.
//! - `restore_all` leaves no empty `style` attribute behind.

use crate::classify::rules::Rules;
use crate::classify::target::find_target;
use crate::dom::{query_inclusive, style, HostDocument, NodeId, SelectorPattern};

/// Marker attribute recording that this crate hid an element.
pub const HIDDEN_ATTR: &str = "data-hide-youtube-shorts";
/// Marker value on hidden elements.
pub const HIDDEN_VALUE: &str = "1";

const ARIA_HIDDEN_ATTR: &str = "aria-hidden";
const ARIA_HIDDEN_VALUE: &str = "true";
const STYLE_ATTR: &str = "style";
const DISPLAY_PROPERTY: &str = "display";

/// Outcome of one `hide` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    /// Target was hidden by this call.
    Hidden(NodeId),
    /// Target already carried the mark.
    AlreadyHidden(NodeId),
    /// Nothing to act on (non-element input).
    Skipped,
}

impl HideOutcome {
    pub fn newly_hidden(self) -> Option<NodeId> {
        match self {
            Self::Hidden(target) => Some(target),
            Self::AlreadyHidden(_) | Self::Skipped => None,
        }
    }
}

/// Whether `node` carries the hidden mark.
pub fn is_hidden<D: HostDocument + ?Sized>(doc: &D, node: NodeId) -> bool {
    doc.attribute(node, HIDDEN_ATTR) == Some(HIDDEN_VALUE)
}

/// Resolves the hide target for `node` and hides it once.
pub fn hide<D: HostDocument + ?Sized>(doc: &mut D, rules: &Rules, node: NodeId) -> HideOutcome {
    let Some(target) = find_target(doc, rules, node) else {
        return HideOutcome::Skipped;
    };
    if is_hidden(doc, target) {
        return HideOutcome::AlreadyHidden(target);
    }
    doc.set_attribute(target, HIDDEN_ATTR, HIDDEN_VALUE);
    doc.set_attribute(target, ARIA_HIDDEN_ATTR, ARIA_HIDDEN_VALUE);
    let current = doc.attribute(target, STYLE_ATTR).unwrap_or_default().to_string();
    let forced = style::set_property(&current, DISPLAY_PROPERTY, "none", true);
    doc.set_attribute(target, STYLE_ATTR, &forced);
    HideOutcome::Hidden(target)
}

/// Restores every marked element under `root` (root included).
///
/// Returns the number of restored elements.
pub fn restore_all<D: HostDocument + ?Sized>(doc: &mut D, root: NodeId) -> usize {
    let selector = SelectorPattern::new(format!(r#"[{HIDDEN_ATTR}="{HIDDEN_VALUE}"]"#));
    let marked = query_inclusive(doc, root, &selector);
    for element in &marked {
        restore_one(doc, *element);
    }
    marked.len()
}

fn restore_one<D: HostDocument + ?Sized>(doc: &mut D, element: NodeId) {
    doc.remove_attribute(element, HIDDEN_ATTR);
    if doc.attribute(element, ARIA_HIDDEN_ATTR) == Some(ARIA_HIDDEN_VALUE) {
        doc.remove_attribute(element, ARIA_HIDDEN_ATTR);
    }
    let Some(current) = doc.attribute(element, STYLE_ATTR).map(str::to_string) else {
        return;
    };
    let remaining = style::remove_property(&current, DISPLAY_PROPERTY);
    if remaining.trim().is_empty() {
        doc.remove_attribute(element, STYLE_ATTR);
    } else {
        doc.set_attribute(element, STYLE_ATTR, &remaining);
    }
}
