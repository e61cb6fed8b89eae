//! One classification pass over a subtree.
//!
//! # Responsibility
//! - Run shelf, container and loose-link detection in that order.
//! - Report what was newly hidden per stage.
//!
//! # Invariants
//! - No-op when the decision is inactive.
//! - Stages are independent; re-running a sweep over the same subtree
//!   produces no further mutations.
//! - An element root is tested itself in addition to its descendants.

use crate::classify::classifier::{has_disfavored_link, is_disfavored_shelf, text_suggests_disfavored};
use crate::classify::rules::Rules;
use crate::dom::{probe_closest, probe_first, query_inclusive, HostDocument, NodeId};
use crate::hide::{hide, HideOutcome};
use crate::prefs::ActiveDecision;
use log::debug;

/// Per-stage counts of newly hidden targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub shelves: usize,
    pub items: usize,
    pub containers: usize,
    pub loose_links: usize,
    /// Newly hidden targets in hide order.
    pub hidden: Vec<NodeId>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }

    /// Folds another report into this one.
    pub fn absorb(&mut self, other: SweepReport) {
        self.shelves += other.shelves;
        self.items += other.items;
        self.containers += other.containers;
        self.loose_links += other.loose_links;
        self.hidden.extend(other.hidden);
    }

    fn note(&mut self, outcome: HideOutcome, stage: Stage) {
        let Some(target) = outcome.newly_hidden() else {
            return;
        };
        match stage {
            Stage::Shelves => self.shelves += 1,
            Stage::Items => self.items += 1,
            Stage::Containers => self.containers += 1,
            Stage::LooseLinks => self.loose_links += 1,
        }
        self.hidden.push(target);
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Shelves,
    Items,
    Containers,
    LooseLinks,
}

/// Classifies and hides disfavored content under `root`.
pub fn sweep<D: HostDocument + ?Sized>(
    doc: &mut D,
    rules: &Rules,
    root: NodeId,
    decision: ActiveDecision,
) -> SweepReport {
    let mut report = SweepReport::default();
    if !decision.is_active() || doc.kind(root).is_none() {
        return report;
    }

    sweep_shelves(doc, rules, root, &mut report);
    sweep_containers(doc, rules, root, &mut report);
    sweep_loose_links(doc, rules, root, &mut report);

    if !report.is_empty() {
        debug!(
            "event=sweep module=sweep status=ok root={} shelves={} items={} containers={} loose_links={}",
            root.index(),
            report.shelves,
            report.items,
            report.containers,
            report.loose_links
        );
    }
    report
}

fn sweep_shelves<D: HostDocument + ?Sized>(
    doc: &mut D,
    rules: &Rules,
    root: NodeId,
    report: &mut SweepReport,
) {
    for selector in &rules.section_selectors {
        for element in query_inclusive(doc, root, selector) {
            if is_disfavored_shelf(doc, rules, element) {
                report.note(hide(doc, rules, element), Stage::Shelves);
            }
        }
    }
    for item in query_inclusive(doc, root, &rules.item_selector) {
        if probe_first(doc, item, &rules.item_embed_selector).is_found() {
            report.note(hide(doc, rules, item), Stage::Items);
        }
    }
}

fn sweep_containers<D: HostDocument + ?Sized>(
    doc: &mut D,
    rules: &Rules,
    root: NodeId,
    report: &mut SweepReport,
) {
    for selector in &rules.container_selectors {
        for element in query_inclusive(doc, root, selector) {
            if has_disfavored_link(doc, rules, element) || text_suggests_disfavored(doc, rules, element)
            {
                report.note(hide(doc, rules, element), Stage::Containers);
            }
        }
    }
}

fn sweep_loose_links<D: HostDocument + ?Sized>(
    doc: &mut D,
    rules: &Rules,
    root: NodeId,
    report: &mut SweepReport,
) {
    for anchor in query_inclusive(doc, root, &rules.link_selector) {
        let disfavored = doc
            .attribute(anchor, "href")
            .is_some_and(|href| !href.is_empty() && rules.is_disfavored_href(href));
        if !disfavored {
            continue;
        }
        let container = probe_closest(doc, anchor, &rules.loose_link_containers)
            .found()
            .unwrap_or(anchor);
        report.note(hide(doc, rules, container), Stage::LooseLinks);
    }
}
