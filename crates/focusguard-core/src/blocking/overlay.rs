use super::SharedSessionState;
use crate::storage::StoreChange;

/// Style attribute value that marks an inserted overlay. Presence of this
/// marker in the page is what makes insert/remove idempotent.
pub const OVERLAY_MARKER: &str = "focusguard-overlay";

const OVERLAY_MESSAGE: &str = "This site is blocked during your work session. Stay focused!";

/// The parts of a page the overlay controller needs.
pub trait PageDom {
    fn url(&self) -> &str;
    fn has_marker(&self, marker: &str) -> bool;
    fn insert_overlay(&mut self, marker: &str, message: &str);
    fn remove_overlay(&mut self, marker: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Inserted,
    Removed,
    Unchanged,
}

/// Keeps a page's blocking overlay in line with the shared session state.
#[derive(Debug, Default)]
pub struct OverlayController {
    state: SharedSessionState,
}

impl OverlayController {
    pub fn new(state: SharedSessionState) -> Self {
        Self { state }
    }

    pub fn apply(&mut self, change: &StoreChange) -> bool {
        self.state.apply(change)
    }

    pub fn state(&self) -> &SharedSessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SharedSessionState {
        &mut self.state
    }

    /// Insert or remove the overlay so that it is shown exactly when the
    /// page should be blocked.
    pub fn reconcile(&self, page: &mut dyn PageDom) -> OverlayAction {
        let show = self.state.should_block(page.url());
        let present = page.has_marker(OVERLAY_MARKER);
        match (show, present) {
            (true, false) => {
                page.insert_overlay(OVERLAY_MARKER, OVERLAY_MESSAGE);
                tracing::debug!(url = page.url(), "overlay inserted");
                OverlayAction::Inserted
            }
            (false, true) => {
                page.remove_overlay(OVERLAY_MARKER);
                tracing::debug!(url = page.url(), "overlay removed");
                OverlayAction::Removed
            }
            _ => OverlayAction::Unchanged,
        }
    }
}
