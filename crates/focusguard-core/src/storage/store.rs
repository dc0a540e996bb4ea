//! Strongly-typed key-value store with change notifications.
//!
//! The store has a fixed set of keys. Values are JSON-encoded in whatever
//! [`KeyValue`] backend holds them; [`Store`] decodes them into their typed
//! form, validates on write, and broadcasts a [`StoreChange`] after every
//! successful write. Subscribers can lag or miss messages, so every change
//! carries the full new value, and `blockedSites` and `currentSession`
//! changes carry a monotonically increasing [`Revision`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::blocking::BlockedSite;
use crate::error::StoreError;
use crate::settings::Settings;
use crate::timer::Session;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreKey {
    UserId,
    Settings,
    BlockedSites,
    CurrentSession,
    SessionCount,
}

impl StoreKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::UserId => "userId",
            StoreKey::Settings => "settings",
            StoreKey::BlockedSites => "blockedSites",
            StoreKey::CurrentSession => "currentSession",
            StoreKey::SessionCount => "sessionCount",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw storage behind a [`Store`]. Values are JSON strings.
pub trait KeyValue: Send {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError>;
}

/// In-memory backend, used by tests and when the database is unavailable.
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: std::collections::HashMap<StoreKey, String>,
}

impl KeyValue for MemoryKv {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(&key).cloned())
    }

    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        self.values.remove(&key);
        Ok(())
    }
}

pub type Revision = u64;

/// Notification sent after a successful write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    UserId(String),
    Settings(Settings),
    BlockedSites {
        revision: Revision,
        sites: Vec<BlockedSite>,
    },
    CurrentSession {
        revision: Revision,
        session: Option<Session>,
    },
    SessionCount(u32),
}

pub struct Store {
    backend: Mutex<Box<dyn KeyValue>>,
    changes: broadcast::Sender<StoreChange>,
    revision: AtomicU64,
}

impl Store {
    pub fn new(backend: Box<dyn KeyValue>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            backend: Mutex::new(backend),
            changes,
            revision: AtomicU64::new(0),
        }
    }

    /// Store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKv::default()))
    }

    /// Receive every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    // ── userId ───────────────────────────────────────────────────────

    pub fn user_id(&self) -> Result<Option<String>, StoreError> {
        self.read(StoreKey::UserId)
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), StoreError> {
        if user_id.trim().is_empty() {
            return Err(crate::error::ValidationError::InvalidValue {
                field: "userId".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        self.write(StoreKey::UserId, &user_id)?;
        self.publish(StoreChange::UserId(user_id.to_string()));
        Ok(())
    }

    /// Return the stored user id, generating and persisting one on first use.
    pub fn ensure_user_id(&self) -> Result<String, StoreError> {
        if let Some(id) = self.user_id()? {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.set_user_id(&id)?;
        tracing::info!(user_id = %id, "generated new user id");
        Ok(id)
    }

    // ── settings ─────────────────────────────────────────────────────

    pub fn settings(&self) -> Result<Option<Settings>, StoreError> {
        self.read(StoreKey::Settings)
    }

    /// Stored settings, or `fallback` when none are stored or the read fails.
    pub fn settings_or(&self, fallback: &Settings) -> Settings {
        match self.settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => fallback.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read settings, using defaults");
                fallback.clone()
            }
        }
    }

    pub fn set_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        settings.validate()?;
        self.write(StoreKey::Settings, settings)?;
        self.publish(StoreChange::Settings(settings.clone()));
        Ok(())
    }

    // ── blockedSites ─────────────────────────────────────────────────

    pub fn blocked_sites(&self) -> Result<Vec<BlockedSite>, StoreError> {
        Ok(self.read(StoreKey::BlockedSites)?.unwrap_or_default())
    }

    /// Returns the revision attached to the change notification.
    pub fn set_blocked_sites(&self, sites: &[BlockedSite]) -> Result<Revision, StoreError> {
        for site in sites {
            site.validate()?;
        }
        self.write(StoreKey::BlockedSites, &sites)?;
        let revision = self.next_revision();
        self.publish(StoreChange::BlockedSites {
            revision,
            sites: sites.to_vec(),
        });
        Ok(revision)
    }

    // ── currentSession ───────────────────────────────────────────────

    pub fn current_session(&self) -> Result<Option<Session>, StoreError> {
        // A stored `null` decodes to `None` as well.
        Ok(self.read::<Option<Session>>(StoreKey::CurrentSession)?.flatten())
    }

    /// Persist (or clear, with `None`) the current session. Returns the
    /// revision attached to the change notification.
    pub fn set_current_session(&self, session: Option<&Session>) -> Result<Revision, StoreError> {
        match session {
            Some(session) => self.write(StoreKey::CurrentSession, session)?,
            None => self.lock()?.remove(StoreKey::CurrentSession)?,
        }
        let revision = self.next_revision();
        self.publish(StoreChange::CurrentSession {
            revision,
            session: session.cloned(),
        });
        Ok(revision)
    }

    // ── sessionCount ─────────────────────────────────────────────────

    /// Work sessions completed so far; 0 when never written.
    pub fn session_count(&self) -> Result<u32, StoreError> {
        Ok(self.read(StoreKey::SessionCount)?.unwrap_or(0))
    }

    pub fn set_session_count(&self, count: u32) -> Result<(), StoreError> {
        self.write(StoreKey::SessionCount, &count)?;
        self.publish(StoreChange::SessionCount(count));
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn next_revision(&self) -> Revision {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn KeyValue>>, StoreError> {
        self.backend.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>, StoreError> {
        let raw = self.lock()?.get(key)?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(|source| StoreError::Malformed { key, source }))
            .transpose()
    }

    fn write<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(value).map_err(|source| StoreError::Malformed { key, source })?;
        self.lock()?.set(key, &json)
    }

    fn publish(&self, change: StoreChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionType;
    use chrono::Utc;

    fn sample_session() -> Session {
        Session {
            id: "s-1".into(),
            session_type: SessionType::Work,
            start_time: Utc::now(),
            end_time: None,
            completed: false,
            time_remaining: 1500,
            is_active: true,
            duration: 1500,
            paused: false,
            last_tick: None,
        }
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let store = Store::in_memory();
        assert!(store.user_id().unwrap().is_none());
        assert!(store.settings().unwrap().is_none());
        assert!(store.blocked_sites().unwrap().is_empty());
        assert!(store.current_session().unwrap().is_none());
    }

    #[test]
    fn ensure_user_id_is_stable() {
        let store = Store::in_memory();
        let first = store.ensure_user_id().unwrap();
        let second = store.ensure_user_id().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_settings_are_rejected_and_not_written() {
        let store = Store::in_memory();
        let mut settings = Settings::default();
        settings.work_duration = 0;
        assert!(matches!(store.set_settings(&settings), Err(StoreError::Invalid(_))));
        assert!(store.settings().unwrap().is_none());
    }

    #[test]
    fn writes_are_broadcast_with_increasing_revisions() {
        let store = Store::in_memory();
        let mut rx = store.subscribe();

        let session = sample_session();
        let r1 = store.set_current_session(Some(&session)).unwrap();
        let r2 = store.set_current_session(None).unwrap();
        assert!(r2 > r1);

        match rx.try_recv().unwrap() {
            StoreChange::CurrentSession { revision, session: Some(s) } => {
                assert_eq!(revision, r1);
                assert_eq!(s.id, "s-1");
            }
            other => panic!("unexpected change: {other:?}"),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreChange::CurrentSession { revision: r2, session: None }
        );
    }

    #[test]
    fn cleared_session_is_removed_from_the_backend() {
        let store = Store::in_memory();
        store.set_current_session(Some(&sample_session())).unwrap();
        assert!(store.current_session().unwrap().is_some());
        store.set_current_session(None).unwrap();
        assert!(store.current_session().unwrap().is_none());
        assert!(store.lock().unwrap().get(StoreKey::CurrentSession).unwrap().is_none());
    }

    #[test]
    fn stored_null_session_reads_as_none() {
        let mut kv = MemoryKv::default();
        kv.set(StoreKey::CurrentSession, "null").unwrap();
        assert!(Store::new(Box::new(kv)).current_session().unwrap().is_none());
    }

    #[test]
    fn block_list_and_session_share_one_revision_sequence() {
        let store = Store::in_memory();
        let r1 = store.set_blocked_sites(&[BlockedSite::new("x.com")]).unwrap();
        let r2 = store.set_current_session(None).unwrap();
        let r3 = store.set_blocked_sites(&[]).unwrap();
        assert!(r1 < r2 && r2 < r3);
    }

    #[test]
    fn session_count_defaults_to_zero_and_persists() {
        let store = Store::in_memory();
        let mut rx = store.subscribe();
        assert_eq!(store.session_count().unwrap(), 0);
        store.set_session_count(3).unwrap();
        assert_eq!(store.session_count().unwrap(), 3);
        assert_eq!(rx.try_recv().unwrap(), StoreChange::SessionCount(3));
    }

    #[test]
    fn malformed_value_reports_key() {
        let mut kv = MemoryKv::default();
        kv.set(StoreKey::Settings, "{not json").unwrap();
        let store = Store::new(Box::new(kv));
        match store.settings() {
            Err(StoreError::Malformed { key, .. }) => assert_eq!(key, StoreKey::Settings),
            other => panic!("expected malformed error, got {other:?}"),
        }
        // Falls back instead of failing.
        assert_eq!(store.settings_or(&Settings::default()), Settings::default());
    }
}
