use tokio::sync::broadcast::{self, error::TryRecvError};

use super::{matches_block_list, BlockedSite};
use crate::storage::{Revision, Store, StoreChange};
use crate::timer::Session;

/// Observer-side copy of the shared session state and block list.
///
/// Fed from store change notifications. Applying is idempotent: session and
/// block-list changes at or below the last applied revision of their kind are
/// dropped, so duplicate or out-of-order deliveries leave the state untouched.
#[derive(Debug, Clone, Default)]
pub struct SharedSessionState {
    session_revision: Revision,
    sites_revision: Revision,
    session: Option<Session>,
    blocked_sites: Vec<BlockedSite>,
}

impl SharedSessionState {
    /// Seed from the current store contents. Read failures leave the
    /// affected part empty ("not blocked").
    pub fn load(store: &Store) -> Self {
        let session = store.current_session().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read current session");
            None
        });
        let blocked_sites = store.blocked_sites().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read block list");
            Vec::new()
        });
        Self {
            session_revision: 0,
            sites_revision: 0,
            session,
            blocked_sites,
        }
    }

    pub fn session_revision(&self) -> Revision {
        self.session_revision
    }

    pub fn sites_revision(&self) -> Revision {
        self.sites_revision
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn blocked_sites(&self) -> &[BlockedSite] {
        &self.blocked_sites
    }

    /// Whether a work session is running or paused.
    pub fn work_session_active(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active_work)
    }

    /// Whether `url` should be blocked right now.
    pub fn should_block(&self, url: &str) -> bool {
        self.work_session_active() && matches_block_list(url, &self.blocked_sites)
    }

    /// Apply one change. Returns true if anything changed.
    pub fn apply(&mut self, change: &StoreChange) -> bool {
        match change {
            StoreChange::CurrentSession { revision, session } => {
                if *revision <= self.session_revision {
                    tracing::trace!(revision, current = self.session_revision, "stale session change dropped");
                    return false;
                }
                self.session_revision = *revision;
                if self.session == *session {
                    return false;
                }
                self.session = session.clone();
                true
            }
            StoreChange::BlockedSites { revision, sites } => {
                if *revision <= self.sites_revision {
                    tracing::trace!(revision, current = self.sites_revision, "stale block list dropped");
                    return false;
                }
                self.sites_revision = *revision;
                if self.blocked_sites == *sites {
                    return false;
                }
                self.blocked_sites = sites.clone();
                true
            }
            StoreChange::UserId(_) | StoreChange::Settings(_) | StoreChange::SessionCount(_) => {
                false
            }
        }
    }

    /// Apply every pending notification from `changes`. If the receiver
    /// lagged and missed messages, reload from `store` instead.
    pub fn drain(
        &mut self,
        changes: &mut broadcast::Receiver<StoreChange>,
        store: &Store,
    ) -> bool {
        let mut changed = false;
        loop {
            match changes.try_recv() {
                Ok(change) => changed |= self.apply(&change),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "store notifications lagged, reloading");
                    let (session_revision, sites_revision) =
                        (self.session_revision, self.sites_revision);
                    *self = Self::load(store);
                    self.session_revision = session_revision;
                    self.sites_revision = sites_revision;
                    changed = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
            }
        }
    }
}
