use chrono::Utc;
use clap::Args;
use focusguard_core::blocking::{Frame, NavigationDecision, NavigationEvent, NavigationMonitor};
use focusguard_core::{Config, Database, SharedSessionState, VisitTracker};
use serde_json::json;

use super::{open_shared, open_store, print_json, CommandResult};

const TRACKER_KEY: &str = "last_visit";

#[derive(Args)]
pub struct VisitArgs {
    /// URL the browser just finished loading
    pub url: String,
    /// Page title
    #[arg(long, default_value = "")]
    pub title: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// URL to test against the block list
    pub url: String,
}

fn load_tracker(db: &Database) -> VisitTracker {
    if let Ok(Some(json)) = db.kv_get(TRACKER_KEY) {
        if let Ok(tracker) = serde_json::from_str::<VisitTracker>(&json) {
            return tracker;
        }
    }
    VisitTracker::default()
}

fn save_tracker(db: &Database, tracker: &VisitTracker) -> CommandResult {
    let json = serde_json::to_string(tracker)?;
    db.kv_set(TRACKER_KEY, &json)?;
    Ok(())
}

pub fn run_visit(args: VisitArgs) -> CommandResult {
    let config = Config::load_or_default();
    let (shared, store) = open_shared(&config)?;
    let state = SharedSessionState::load(&store);
    let db = shared.lock().map_err(|_| "database lock poisoned")?;

    let mut monitor = NavigationMonitor::new(state).with_tracker(load_tracker(&db));
    let event = NavigationEvent::Completed {
        url: args.url.clone(),
        title: args.title,
        frame: Frame::Main,
    };
    let outcome = monitor.handle(&event, Utc::now());

    if let Some(visit) = &outcome.visit {
        db.record_visit(visit)?;
    }
    save_tracker(&db, monitor.tracker())?;

    let redirect = match outcome.decision {
        NavigationDecision::Redirect { target } => Some(target),
        NavigationDecision::Allow | NavigationDecision::Ignored => None,
    };
    print_json(&json!({
        "url": args.url,
        "blocked": redirect.is_some(),
        "redirect": redirect,
        "recorded": outcome.visit,
    }))?;
    Ok(())
}

pub fn run_check(args: CheckArgs) -> CommandResult {
    let config = Config::load_or_default();
    let state = SharedSessionState::load(&*open_store(&config)?);

    print_json(&json!({
        "url": args.url,
        "blocked": state.should_block(&args.url),
        "workSessionActive": state.work_session_active(),
    }))?;
    Ok(())
}
