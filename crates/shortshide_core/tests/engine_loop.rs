use serde_json::json;
use shortshide_core::engine::DOCUMENT_FLAG_OFF;
use shortshide_core::{
    is_hidden, ActiveDecision, ContentEngine, EngineEvent, EventLoop, HostDocument, LoopPhase,
    MemoryDocument, MemoryPreferenceStore, NodeId, Preferences, Rules, StorageChange, Transition,
    HIDDEN_ATTR,
};

const HOST: &str = "www.youtube.com";

fn node(doc: &MemoryDocument, selector: &str) -> NodeId {
    doc.query_first(doc.root(), selector)
        .expect("selector should parse")
        .expect("fixture should contain selector")
}

fn event_loop(html: &str) -> EventLoop<MemoryDocument> {
    EventLoop::new(ContentEngine::new(
        MemoryDocument::parse_html(html),
        Rules::default(),
        HOST,
    ))
}

fn document_flag(event_loop: &EventLoop<MemoryDocument>) -> Option<String> {
    let doc = event_loop.engine().document();
    let element = doc.document_element().expect("document element");
    doc.attribute(element, HIDDEN_ATTR).map(str::to_string)
}

const MIXED_PAGE: &str = r#"<body>
    <ytd-guide-entry-renderer id="entry"><a href="/shorts">Shorts</a></ytd-guide-entry-renderer>
    <yt-chip-cloud-chip-renderer id="chip">Shorts</yt-chip-cloud-chip-renderer>
    <ytd-reel-shelf-renderer id="shelf"></ytd-reel-shelf-renderer>
    <ytd-guide-entry-renderer id="history" aria-hidden="true"><a href="/feed/history">History</a></ytd-guide-entry-renderer>
</body>"#;

#[test]
fn optimistic_sweep_runs_before_preferences_arrive() {
    let mut event_loop = event_loop(MIXED_PAGE);
    let store = MemoryPreferenceStore::new();

    let start = event_loop.start_with(&store);

    assert_eq!(start.sweep.total(), 3);
    assert_eq!(event_loop.pending(), 1);
    assert_eq!(
        event_loop.engine().phase(),
        LoopPhase::Observing(ActiveDecision::Active)
    );

    let reports = event_loop.run_until_idle();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].transition,
        Some(Transition::Unchanged(ActiveDecision::Active))
    );
    assert!(reports[0].sweep.is_empty());
}

#[test]
fn disabling_restores_exactly_the_hidden_elements() {
    let mut event_loop = event_loop(MIXED_PAGE);
    let mut store = MemoryPreferenceStore::with_value(Preferences::default());
    event_loop.start_with(&store);
    event_loop.run_until_idle();

    let change = store.set(Preferences::default().with_enabled(false));
    event_loop.push(EngineEvent::StorageChanged(change));
    let reports = event_loop.run_until_idle();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].transition, Some(Transition::Deactivated));
    assert_eq!(reports[0].restored, 3);

    let doc = event_loop.engine().document();
    for id in ["#entry", "#chip", "#shelf"] {
        let element = node(doc, id);
        assert!(!is_hidden(doc, element), "{id} should be restored");
        assert_eq!(doc.attribute(element, "aria-hidden"), None);
        assert_eq!(doc.attribute(element, "style"), None);
    }
    let history = node(doc, "#history");
    assert_eq!(doc.attribute(history, "aria-hidden"), Some("true"));
    assert_eq!(document_flag(&event_loop).as_deref(), Some(DOCUMENT_FLAG_OFF));
}

#[test]
fn reenabling_sweeps_the_whole_document_again() {
    let mut event_loop = event_loop(MIXED_PAGE);
    let mut store = MemoryPreferenceStore::with_value(Preferences::default().with_enabled(false));
    event_loop.start_with(&store);
    let reports = event_loop.run_until_idle();
    assert_eq!(reports[0].transition, Some(Transition::Deactivated));
    assert_eq!(reports[0].restored, 3);

    let change = store.set(Preferences::default());
    event_loop.push(EngineEvent::StorageChanged(change));
    let reports = event_loop.run_until_idle();

    assert_eq!(reports[0].transition, Some(Transition::Activated));
    assert_eq!(reports[0].sweep.total(), 3);
    assert_eq!(document_flag(&event_loop), None);
}

#[test]
fn host_override_disables_only_that_host() {
    let prefs = Preferences::default().with_host_override("youtube.com", false);
    let store = MemoryPreferenceStore::with_value(prefs);

    let mut desktop = event_loop(MIXED_PAGE);
    desktop.start_with(&store);
    desktop.run_until_idle();
    assert_eq!(desktop.engine().decision(), ActiveDecision::Inactive);

    let mut mobile = EventLoop::new(ContentEngine::new(
        MemoryDocument::parse_html(MIXED_PAGE),
        Rules::default(),
        "m.youtube.com",
    ));
    mobile.start_with(&store);
    mobile.run_until_idle();
    assert_eq!(mobile.engine().decision(), ActiveDecision::Active);
    assert!(is_hidden(
        mobile.engine().document(),
        node(mobile.engine().document(), "#shelf")
    ));
}

#[test]
fn inserted_content_is_swept_through_mutations() {
    let mut event_loop = event_loop("<body><div id=\"feed\"></div></body>");
    event_loop.start_with(&MemoryPreferenceStore::new());
    event_loop.run_until_idle();

    let feed = node(event_loop.engine().document(), "#feed");
    event_loop.engine_mut().document_mut().insert_html(
        feed,
        r#"<ytd-rich-item-renderer id="late"><ytm-shorts-lockup-view-model></ytm-shorts-lockup-view-model></ytd-rich-item-renderer>plain text"#,
    );
    let reports = event_loop.run_until_idle();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].sweep.items, 1);
    let doc = event_loop.engine().document();
    assert!(is_hidden(doc, node(doc, "#late")));
}

#[test]
fn mutations_while_inactive_are_left_visible() {
    let mut event_loop = event_loop("<body><div id=\"feed\"></div></body>");
    let store = MemoryPreferenceStore::with_value(Preferences::default().with_enabled(false));
    event_loop.start_with(&store);
    event_loop.run_until_idle();

    let feed = node(event_loop.engine().document(), "#feed");
    event_loop
        .engine_mut()
        .document_mut()
        .insert_html(feed, r#"<ytd-reel-shelf-renderer id="late"></ytd-reel-shelf-renderer>"#);
    let reports = event_loop.run_until_idle();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].sweep.is_empty());
    let doc = event_loop.engine().document();
    assert!(!is_hidden(doc, node(doc, "#late")));
}

#[test]
fn navigation_signal_triggers_full_sweep() {
    let mut event_loop = event_loop(
        r#"<body><ytd-rich-section-renderer id="section"></ytd-rich-section-renderer></body>"#,
    );
    event_loop.start_with(&MemoryPreferenceStore::new());
    event_loop.run_until_idle();

    let section = node(event_loop.engine().document(), "#section");
    event_loop
        .engine_mut()
        .document_mut()
        .set_attribute(section, "section-identifier", "shorts_shelf");
    event_loop.push(EngineEvent::navigation("yt-page-data-updated").expect("known signal"));
    let reports = event_loop.run_until_idle();

    assert_eq!(reports[0].sweep.shelves, 1);
    assert!(EngineEvent::navigation("yt-unknown-event").is_none());
}

#[test]
fn force_rescan_message_sweeps_and_unknown_messages_are_ignored() {
    let mut event_loop = event_loop(
        r#"<body><ytd-rich-section-renderer id="section"></ytd-rich-section-renderer></body>"#,
    );
    event_loop.start_with(&MemoryPreferenceStore::new());
    event_loop.run_until_idle();

    let section = node(event_loop.engine().document(), "#section");
    event_loop
        .engine_mut()
        .document_mut()
        .set_attribute(section, "section-identifier", "shorts_shelf");

    event_loop.push(EngineEvent::Message(json!({ "type": "ping" })));
    event_loop.push(EngineEvent::Message(json!("force-kill")));
    event_loop.push(EngineEvent::Message(json!({ "type": "force-kill" })));
    let reports = event_loop.run_until_idle();

    assert_eq!(reports.len(), 3);
    assert!(reports[0].sweep.is_empty());
    assert!(reports[1].sweep.is_empty());
    assert_eq!(reports[2].sweep.shelves, 1);
}

#[test]
fn store_failure_keeps_previous_preferences() {
    let mut event_loop = event_loop(MIXED_PAGE);
    let mut store = MemoryPreferenceStore::new();
    store.fail_with("storage quota exceeded");

    event_loop.start_with(&store);
    let reports = event_loop.run_until_idle();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].transition, None);
    assert_eq!(event_loop.engine().decision(), ActiveDecision::Active);
    assert_eq!(
        event_loop.engine().sync().preferences(),
        &Preferences::default()
    );
    let doc = event_loop.engine().document();
    assert!(is_hidden(doc, node(doc, "#shelf")));
}

#[test]
fn unrelated_storage_changes_are_ignored() {
    let mut event_loop = event_loop(MIXED_PAGE);
    event_loop.start_with(&MemoryPreferenceStore::new());
    event_loop.run_until_idle();

    event_loop.push(EngineEvent::StorageChanged(StorageChange {
        area: "sync".to_string(),
        key: "settings".to_string(),
        old_value: None,
        new_value: Some(json!({ "enabled": false })),
    }));
    event_loop.push(EngineEvent::StorageChanged(StorageChange {
        area: "local".to_string(),
        key: "theme".to_string(),
        old_value: None,
        new_value: Some(json!({ "enabled": false })),
    }));
    let reports = event_loop.run_until_idle();

    assert!(reports.iter().all(|report| report.transition.is_none()));
    assert_eq!(event_loop.engine().decision(), ActiveDecision::Active);
}

#[test]
fn removed_settings_entry_falls_back_to_defaults() {
    let mut event_loop = event_loop(MIXED_PAGE);
    let store = MemoryPreferenceStore::with_value(Preferences::default().with_enabled(false));
    event_loop.start_with(&store);
    event_loop.run_until_idle();
    assert_eq!(event_loop.engine().decision(), ActiveDecision::Inactive);

    event_loop.push(EngineEvent::StorageChanged(StorageChange::settings(
        Some(json!({ "enabled": false })),
        None,
    )));
    let reports = event_loop.run_until_idle();

    assert_eq!(reports[0].transition, Some(Transition::Activated));
    assert_eq!(reports[0].sweep.total(), 3);
}
