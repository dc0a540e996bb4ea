use chrono::{DateTime, Utc};

use super::{SharedSessionState, BLOCKED_PAGE};
use crate::storage::StoreChange;
use crate::visits::{VisitRecord, VisitTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Main,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Browser navigation signals the monitor reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// A navigation finished loading in some frame.
    Completed {
        url: String,
        title: String,
        frame: Frame,
    },
    /// A tab reported a status change.
    TabUpdated {
        url: String,
        title: String,
        status: TabStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Event was not a completed main-frame load.
    Ignored,
    Allow,
    Redirect { target: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOutcome {
    pub decision: NavigationDecision,
    /// Previous page's visit, when it qualified for recording.
    pub visit: Option<VisitRecord>,
}

/// Watches navigations: records visits and redirects blocked pages while
/// a work session is active.
#[derive(Debug, Default)]
pub struct NavigationMonitor {
    state: SharedSessionState,
    visits: VisitTracker,
}

impl NavigationMonitor {
    pub fn new(state: SharedSessionState) -> Self {
        Self {
            state,
            visits: VisitTracker::default(),
        }
    }

    /// Continue from previously saved visit bookkeeping.
    pub fn with_tracker(mut self, visits: VisitTracker) -> Self {
        self.visits = visits;
        self
    }

    pub fn state(&self) -> &SharedSessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SharedSessionState {
        &mut self.state
    }

    pub fn tracker(&self) -> &VisitTracker {
        &self.visits
    }

    pub fn apply(&mut self, change: &StoreChange) -> bool {
        self.state.apply(change)
    }

    pub fn handle(&mut self, event: &NavigationEvent, at: DateTime<Utc>) -> NavigationOutcome {
        let (url, title) = match event {
            NavigationEvent::Completed {
                url,
                title,
                frame: Frame::Main,
            }
            | NavigationEvent::TabUpdated {
                url,
                title,
                status: TabStatus::Complete,
            } => (url, title),
            _ => {
                return NavigationOutcome {
                    decision: NavigationDecision::Ignored,
                    visit: None,
                }
            }
        };

        let visit = self.visits.on_navigation(url, title, at);
        let decision = if self.state.should_block(url) {
            tracing::info!(%url, "blocked during work session");
            NavigationDecision::Redirect {
                target: BLOCKED_PAGE,
            }
        } else {
            NavigationDecision::Allow
        };

        NavigationOutcome { decision, visit }
    }
}
