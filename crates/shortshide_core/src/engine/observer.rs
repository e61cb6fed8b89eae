//! Observation loop and single-threaded dispatch.
//!
//! # Responsibility
//! - Run the optimistic start-up sweep and begin tree observation.
//! - Turn every queued event into sweeps, restores and flag updates.
//!
//! # Invariants
//! - Observation never stops once started; an inactive decision only turns
//!   sweeps into no-ops.
//! - The decision current at dispatch time is the one applied.
//! - Store failures keep the previous snapshot.

use crate::classify::rules::Rules;
use crate::dom::{HostDocument, NodeKind};
use crate::engine::event::{EngineEvent, RuntimeMessage};
use crate::engine::sync::{SyncState, Transition};
use crate::hide::{restore_all, HIDDEN_ATTR};
use crate::prefs::{ActiveDecision, PreferenceStore, Preferences, StoreError};
use crate::sweep::{sweep, SweepReport};
use log::{debug, error, info};
use std::collections::VecDeque;

/// Value of the document-element flag while inactive.
pub const DOCUMENT_FLAG_OFF: &str = "off";

/// Loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Uninitialized,
    Observing(ActiveDecision),
}

/// Side effects of one dispatched event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub transition: Option<Transition>,
    pub sweep: SweepReport,
    pub restored: usize,
}

/// Classification engine bound to one host document.
pub struct ContentEngine<D: HostDocument> {
    document: D,
    rules: Rules,
    sync: SyncState,
    started: bool,
    observing: bool,
}

impl<D: HostDocument> ContentEngine<D> {
    pub fn new(document: D, rules: Rules, host: impl Into<String>) -> Self {
        Self {
            document,
            rules,
            sync: SyncState::new(host),
            started: false,
            observing: false,
        }
    }

    /// Optimistic first sweep, then tree observation.
    ///
    /// Preferences are loaded by the host and delivered later as
    /// `EngineEvent::PreferencesLoaded`. Calling `start` twice is a no-op.
    pub fn start(&mut self) -> DispatchReport {
        if self.started {
            return DispatchReport::default();
        }
        self.started = true;
        let report = DispatchReport {
            sweep: self.sweep_document(),
            ..DispatchReport::default()
        };
        self.begin_observing();
        info!(
            "event=engine_start module=engine status=ok host={} observing={} hidden={}",
            self.sync.host(),
            self.observing,
            report.sweep.total()
        );
        report
    }

    pub fn phase(&self) -> LoopPhase {
        if self.started {
            LoopPhase::Observing(self.sync.decision())
        } else {
            LoopPhase::Uninitialized
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn decision(&self) -> ActiveDecision {
        self.sync.decision()
    }

    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Host-side access for inserting content between events.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// Handles one event.
    pub fn dispatch(&mut self, event: EngineEvent) -> DispatchReport {
        match event {
            EngineEvent::PreferencesLoaded(result) => self.on_preferences_loaded(result),
            EngineEvent::StorageChanged(change) => {
                if !change.is_settings_change() {
                    return DispatchReport::default();
                }
                self.apply_preferences(change.new_preferences())
            }
            event if !self.started => {
                debug!(
                    "event=dispatch_skipped module=engine status=ok reason=not_started kind={}",
                    event.name()
                );
                DispatchReport::default()
            }
            EngineEvent::DocumentReady => {
                self.begin_observing();
                DispatchReport::default()
            }
            EngineEvent::Mutations(records) => {
                let mut report = DispatchReport::default();
                if !self.sync.decision().is_active() {
                    return report;
                }
                for node in records.into_iter().flat_map(|record| record.added_nodes) {
                    if matches!(
                        self.document.kind(node),
                        Some(NodeKind::Element | NodeKind::Fragment)
                    ) {
                        report.sweep.absorb(sweep(
                            &mut self.document,
                            &self.rules,
                            node,
                            self.sync.decision(),
                        ));
                    }
                }
                report
            }
            EngineEvent::Navigation(signal) => {
                debug!(
                    "event=navigation module=engine status=ok signal={}",
                    signal.event_name()
                );
                DispatchReport {
                    sweep: self.sweep_document(),
                    ..DispatchReport::default()
                }
            }
            EngineEvent::Message(message) => match RuntimeMessage::parse(&message) {
                Some(RuntimeMessage::ForceRescan) => DispatchReport {
                    sweep: self.sweep_document(),
                    ..DispatchReport::default()
                },
                None => DispatchReport::default(),
            },
        }
    }

    fn on_preferences_loaded(
        &mut self,
        result: Result<Option<Preferences>, StoreError>,
    ) -> DispatchReport {
        let preferences = match result {
            Ok(Some(preferences)) => preferences,
            Ok(None) => self.sync.preferences().clone(),
            Err(err) => {
                error!(
                    "event=preferences_load module=engine status=error host={} error={}",
                    self.sync.host(),
                    err
                );
                return DispatchReport::default();
            }
        };
        let mut report = self.apply_preferences(preferences);
        if report.transition != Some(Transition::Activated) && self.sync.decision().is_active() {
            report.sweep.absorb(self.sweep_document());
        }
        report
    }

    fn apply_preferences(&mut self, preferences: Preferences) -> DispatchReport {
        let transition = self.sync.apply(preferences);
        self.apply_document_flag();
        let mut report = DispatchReport {
            transition: Some(transition),
            ..DispatchReport::default()
        };
        match transition {
            Transition::Activated => {
                report.sweep = self.sweep_document();
            }
            Transition::Deactivated => {
                let root = self.document.root();
                report.restored = restore_all(&mut self.document, root);
            }
            Transition::Unchanged(_) => return report,
        }
        info!(
            "event=decision_changed module=engine status=ok host={} decision={} hidden={} restored={}",
            self.sync.host(),
            transition.decision().as_str(),
            report.sweep.total(),
            report.restored
        );
        report
    }

    fn sweep_document(&mut self) -> SweepReport {
        let root = self.document.root();
        sweep(&mut self.document, &self.rules, root, self.sync.decision())
    }

    fn apply_document_flag(&mut self) {
        let Some(element) = self.document.document_element() else {
            return;
        };
        if self.sync.decision().is_active() {
            self.document.remove_attribute(element, HIDDEN_ATTR);
        } else {
            self.document
                .set_attribute(element, HIDDEN_ATTR, DOCUMENT_FLAG_OFF);
        }
    }

    fn begin_observing(&mut self) {
        if self.observing {
            return;
        }
        if let Some(element) = self.document.document_element() {
            self.document.observe(element);
            self.observing = true;
        }
    }
}

/// FIFO dispatch loop over one engine.
pub struct EventLoop<D: HostDocument> {
    engine: ContentEngine<D>,
    queue: VecDeque<EngineEvent>,
}

impl<D: HostDocument> EventLoop<D> {
    pub fn new(engine: ContentEngine<D>) -> Self {
        Self {
            engine,
            queue: VecDeque::new(),
        }
    }

    /// Starts the engine and queues the preference load from `store`.
    pub fn start_with<S: PreferenceStore + ?Sized>(&mut self, store: &S) -> DispatchReport {
        let report = self.engine.start();
        self.queue.push_back(EngineEvent::load_from(store));
        report
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Moves mutation records collected by the document into the queue.
    pub fn collect_mutations(&mut self) {
        let records = self.engine.document_mut().take_mutations();
        if !records.is_empty() {
            self.queue.push_back(EngineEvent::Mutations(records));
        }
    }

    /// Dispatches queued events, including mutation batches observed while
    /// running, until nothing is left.
    pub fn run_until_idle(&mut self) -> Vec<DispatchReport> {
        let mut reports = Vec::new();
        loop {
            self.collect_mutations();
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            reports.push(self.engine.dispatch(event));
        }
        reports
    }

    pub fn engine(&self) -> &ContentEngine<D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ContentEngine<D> {
        &mut self.engine
    }

    pub fn into_engine(self) -> ContentEngine<D> {
        self.engine
    }
}
