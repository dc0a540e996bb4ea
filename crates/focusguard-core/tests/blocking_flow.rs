//! End-to-end blocking: timer writes the session, observers follow the
//! store notifications and decide what to block.

use std::sync::Arc;

use chrono::Utc;
use focusguard_core::blocking::{
    Frame, NavigationDecision, NavigationEvent, OverlayAction, PageDom,
};
use focusguard_core::{
    BlockedSite, LogNotifier, NavigationMonitor, OfflineBackend, OverlayController, SessionTimer,
    SessionType, Settings, SharedSessionState, Store, BLOCKED_PAGE,
};

struct Page {
    url: String,
    overlay: bool,
}

impl PageDom for Page {
    fn url(&self) -> &str {
        &self.url
    }

    fn has_marker(&self, _marker: &str) -> bool {
        self.overlay
    }

    fn insert_overlay(&mut self, _marker: &str, _message: &str) {
        self.overlay = true;
    }

    fn remove_overlay(&mut self, _marker: &str) {
        self.overlay = false;
    }
}

fn navigate(url: &str) -> NavigationEvent {
    NavigationEvent::Completed {
        url: url.into(),
        title: String::new(),
        frame: Frame::Main,
    }
}

fn setup() -> (Arc<Store>, SessionTimer) {
    let store = Arc::new(Store::in_memory());
    store
        .set_settings(&Settings {
            work_duration: 1,
            auto_start_breaks: true,
            ..Settings::default()
        })
        .unwrap();
    store
        .set_blocked_sites(&[BlockedSite::new("https://facebook.com")])
        .unwrap();
    let timer = SessionTimer::new(Arc::clone(&store), Box::new(OfflineBackend), Box::new(LogNotifier));
    (store, timer)
}

#[test]
fn test_work_blocks_and_break_unblocks() {
    let (store, mut timer) = setup();
    let mut changes = store.subscribe();
    let mut monitor = NavigationMonitor::new(SharedSessionState::load(&store));
    let url = "https://sub.facebook.com/feed";

    assert_eq!(monitor.handle(&navigate(url), Utc::now()).decision, NavigationDecision::Allow);

    timer.start(SessionType::Work).unwrap();
    monitor.state_mut().drain(&mut changes, &store);
    assert_eq!(
        monitor.handle(&navigate(url), Utc::now()).decision,
        NavigationDecision::Redirect { target: BLOCKED_PAGE }
    );

    // Still blocked while paused.
    timer.pause().unwrap();
    monitor.state_mut().drain(&mut changes, &store);
    assert!(monitor.state().should_block(url));
    timer.resume().unwrap();

    // Work runs out and the break starts automatically.
    for _ in 0..60 {
        timer.tick();
    }
    assert_eq!(timer.snapshot().session_type, Some(SessionType::Break));
    monitor.state_mut().drain(&mut changes, &store);
    assert_eq!(monitor.handle(&navigate(url), Utc::now()).decision, NavigationDecision::Allow);
}

#[test]
fn test_overlay_tracks_session_and_block_list() {
    let (store, mut timer) = setup();
    let mut changes = store.subscribe();
    let mut overlay = OverlayController::new(SharedSessionState::load(&store));
    let mut page = Page {
        url: "https://facebook.com/".into(),
        overlay: false,
    };

    timer.start(SessionType::Work).unwrap();
    overlay.state_mut().drain(&mut changes, &store);
    assert_eq!(overlay.reconcile(&mut page), OverlayAction::Inserted);

    store.set_blocked_sites(&[]).unwrap();
    overlay.state_mut().drain(&mut changes, &store);
    assert_eq!(overlay.reconcile(&mut page), OverlayAction::Removed);

    store
        .set_blocked_sites(&[BlockedSite::new("facebook.com")])
        .unwrap();
    overlay.state_mut().drain(&mut changes, &store);
    assert_eq!(overlay.reconcile(&mut page), OverlayAction::Inserted);

    timer.stop().unwrap();
    overlay.state_mut().drain(&mut changes, &store);
    assert_eq!(overlay.reconcile(&mut page), OverlayAction::Removed);
}

#[test]
fn test_lagging_observer_catches_up_from_the_store() {
    let (store, mut timer) = setup();
    let mut changes = store.subscribe();
    let mut state = SharedSessionState::load(&store);

    timer.start(SessionType::Work).unwrap();
    // More writes than the notification channel holds.
    for _ in 0..59 {
        timer.tick();
    }
    for _ in 0..10 {
        timer.pause().unwrap();
        timer.resume().unwrap();
    }
    assert!(state.drain(&mut changes, &store));
    assert!(state.should_block("https://facebook.com/"));
    assert_eq!(state.session().unwrap().time_remaining, 1);
}
